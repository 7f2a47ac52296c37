//! Ambient type declarations (`.rstf/types/<stem>.d.ts`).

use crate::conventions::namespace;
use crate::ir::RouteFile;

use super::GENERATED_HEADER;

/// Generates the declaration file for one directory.
///
/// Types are declared inside a global `declare namespace` so components can
/// reference them without imports.
pub fn generate_dts(route_file: &RouteFile) -> String {
    let mut output = String::new();

    output.push_str(GENERATED_HEADER);
    output.push('\n');
    output.push_str(&format!("declare namespace {} {{\n", namespace(&route_file.dir)));

    for def in &route_file.types {
        output.push_str(&format!("  interface {} {{\n", def.name));
        for field in &def.fields {
            output.push_str(&format!(
                "    {}: {};\n",
                property_name(&field.serialized_name),
                field.mapped_type
            ));
        }
        output.push_str("  }\n\n");
    }

    for handler in &route_file.handlers {
        output.push_str(&format!(
            "  type {}Props = {};\n",
            handler.name, handler.return_type
        ));
    }

    output.push_str("}\n");
    output
}

/// Quotes property names that are not plain identifiers.
fn property_name(name: &str) -> String {
    let mut chars = name.chars();
    let is_ident = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    if is_ident {
        name.to_string()
    } else {
        serde_json::to_string(name).unwrap_or_else(|_| format!("\"{}\"", name))
    }
}
