//! Server-data runtime modules (`.rstf/generated/<dir>.ts`).
//!
//! Components import `serverData()` from `@rstf/<dir>`. In the browser the
//! module seeds itself from `window.__RSTF_SERVER_DATA__`; during server
//! rendering the renderer calls `__setServerData` before each render.

use crate::conventions::namespace;
use crate::ir::RouteFile;

use super::GENERATED_HEADER;

/// Generates the runtime module for one directory, or an empty string when
/// the directory has no handlers.
pub fn generate_runtime_module(route_file: &RouteFile, component_path: &str) -> String {
    let Some(handler) = route_file.handlers.first() else {
        return String::new();
    };

    let data_type = format!("{}.{}", namespace(&route_file.dir), handler.return_type);
    let key = serde_json::to_string(component_path).unwrap_or_else(|_| format!("\"{}\"", component_path));

    let mut output = String::new();
    output.push_str(GENERATED_HEADER);
    output.push('\n');

    output.push_str(&format!("let __data: {0} = {{}} as {0};\n\n", data_type));

    output.push_str("if (typeof window !== \"undefined\" && (window as any).__RSTF_SERVER_DATA__) {\n");
    output.push_str(&format!(
        "  __data = (window as any).__RSTF_SERVER_DATA__[{}] ?? __data;\n",
        key
    ));
    output.push_str("}\n\n");

    output.push_str(&format!("export function serverData(): {} {{\n", data_type));
    output.push_str("  return __data;\n");
    output.push_str("}\n\n");

    output.push_str(&format!(
        "export function __setServerData(data: {}): void {{\n",
        data_type
    ));
    output.push_str("  __data = data;\n");
    output.push_str("}\n");

    output
}
