//! Go server entry point generation (`.rstf/server_gen.go`).
//!
//! The generated `main` starts the renderer sidecar, registers one
//! `GET <pattern>` handler per route, calls every data handler the page
//! depends on, and hands the collected server data to the renderer.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::conventions::{
    bundle_path, component_path, folder_to_url_pattern, has_dynamic_segment, is_route_dir, route_folder,
    sanitized_dir, LAYOUT_COMPONENT, OUTPUT_DIR, ROOT_DIR,
};
use crate::diagnostic::CodegenError;
use crate::ir::{DependencyMap, RouteFile};

use super::GENERATED_HEADER;

/// Package name the generated entry point itself declares.
const RESERVED_PACKAGE: &str = "main";

/// Import alias of the root layout package.
const LAYOUT_ALIAS: &str = "app";

/// Identifiers the generated file binds or references: imports, top-level
/// functions, every local and parameter, and the predeclared names it calls.
/// A package alias equal to any of them would be shadowed.
const RESERVED_ALIASES: &[&str] = &[
    // imports
    "json", "flag", "fmt", "http", "os", "signal", "strings", "syscall", "rstf", "renderer", LAYOUT_ALIAS,
    // top-level functions
    "main", "structToMap", "assemblePage",
    // helper bodies
    "v", "b", "m", "html", "serverData", "bundlePath", "sdJSON", "dataScript", "bundleScript",
    // main body
    "port", "r", "err", "c", "application", "mux", "handler", "middleware", "i",
    // route closures
    "w", "req", "ctx", "sd",
    // predeclared
    "any", "string", "len", "make",
];

/// A user package imported by the generated server.
#[derive(Debug, Clone)]
struct ServerImport {
    alias: String,
    import_path: String,
    dir: String,
    accepts_context: bool,
}

/// A route directory and its URL pattern.
#[derive(Debug, Clone)]
struct RouteEntry {
    dir: String,
    pattern: String,
}

/// One `"<component>": structToMap(<alias>.SSR(...))` line.
struct DataCall<'a> {
    key: &'a str,
    import: &'a ServerImport,
}

/// Generates the server entry point.
///
/// `deps` maps each analyzed route to its dependency directories; the root
/// layout is added implicitly. Output depends only on the inputs' contents,
/// not on the order of `files`.
pub fn generate_server(
    module_path: &str,
    framework_module: &str,
    files: &[RouteFile],
    deps: &DependencyMap,
) -> Result<String, CodegenError> {
    let file_map: BTreeMap<&str, &RouteFile> = files.iter().map(|f| (f.dir.as_str(), f)).collect();

    let layout = file_map.get(ROOT_DIR).copied();
    if let Some(layout) = layout {
        if layout.package == RESERVED_PACKAGE {
            return Err(CodegenError::NamingConflict {
                package: layout.package.clone(),
            });
        }
    }

    let routes = collect_routes(&file_map, deps);
    let imports = collect_imports(module_path, layout, &routes, deps, &file_map);
    let by_dir: HashMap<&str, &ServerImport> = imports.iter().map(|i| (i.dir.as_str(), i)).collect();

    let layout_import = by_dir.get(ROOT_DIR).copied();
    let layout_has_data = layout.is_some_and(RouteFile::has_handlers);
    let app_hook = layout.is_some_and(|l| l.has_app_hook);
    let middleware_hook = layout.is_some_and(|l| l.has_middleware_hook);

    // Data calls per route, in emission order.
    let mut route_calls: Vec<(&RouteEntry, Vec<DataCall>)> = Vec::new();
    for route in &routes {
        let mut calls = Vec::new();
        if layout_has_data {
            if let Some(import) = layout_import {
                calls.push(DataCall {
                    key: LAYOUT_COMPONENT,
                    import,
                });
            }
        }
        for dep in deps.get(&route.dir).into_iter().flatten() {
            if dep == ROOT_DIR {
                continue;
            }
            if let Some(import) = by_dir.get(dep.as_str()) {
                calls.push(DataCall {
                    key: component_path(dep),
                    import,
                });
            }
        }
        route_calls.push((route, calls));
    }

    let uses_context = route_calls
        .iter()
        .any(|(_, calls)| calls.iter().any(|c| c.import.accepts_context));
    let uses_framework = uses_context || app_hook;

    let mut output = String::new();
    output.push_str(GENERATED_HEADER);
    output.push_str(&format!("package {}\n\n", RESERVED_PACKAGE));

    write_imports(&mut output, framework_module, uses_framework, &imports);
    write_struct_to_map(&mut output);
    write_assemble_page(&mut output);
    write_main(&mut output, &route_calls, app_hook, middleware_hook);

    Ok(output)
}

/// Route directories with handler files plus every analyzed route,
/// ordered by URL pattern.
fn collect_routes(file_map: &BTreeMap<&str, &RouteFile>, deps: &DependencyMap) -> Vec<RouteEntry> {
    let mut dirs: Vec<&str> = file_map.keys().copied().filter(|d| is_route_dir(d)).collect();
    for dir in deps.keys() {
        if is_route_dir(dir) && !file_map.contains_key(dir.as_str()) {
            dirs.push(dir.as_str());
        }
    }

    let mut routes: Vec<RouteEntry> = dirs
        .into_iter()
        .map(|dir| RouteEntry {
            dir: dir.to_string(),
            pattern: folder_to_url_pattern(route_folder(dir)),
        })
        .collect();
    routes.sort_by(|a, b| a.pattern.cmp(&b.pattern).then_with(|| a.dir.cmp(&b.dir)));
    routes
}

/// Imports every package the generated code references: the layout (for its
/// handler or hooks) and each dependency directory that declares a handler.
/// Aliases are assigned in first-use order.
fn collect_imports(
    module_path: &str,
    layout: Option<&RouteFile>,
    routes: &[RouteEntry],
    deps: &DependencyMap,
    file_map: &BTreeMap<&str, &RouteFile>,
) -> Vec<ServerImport> {
    let mut used_aliases: HashSet<String> = RESERVED_ALIASES.iter().map(|a| a.to_string()).collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut imports = Vec::new();

    if let Some(layout) = layout.filter(|l| l.has_handlers() || l.has_hooks()) {
        seen.insert(ROOT_DIR);
        imports.push(ServerImport {
            alias: LAYOUT_ALIAS.to_string(),
            import_path: module_path.to_string(),
            dir: ROOT_DIR.to_string(),
            accepts_context: layout.accepts_context(),
        });
    }

    for route in routes {
        for dep in deps.get(&route.dir).into_iter().flatten() {
            if dep == ROOT_DIR || !seen.insert(dep.as_str()) {
                continue;
            }
            let Some(rf) = file_map.get(dep.as_str()).filter(|rf| rf.has_handlers()) else {
                continue;
            };

            let import_path = if has_dynamic_segment(dep) {
                format!("{}/{}/pkgs/{}", module_path, OUTPUT_DIR, sanitized_dir(dep))
            } else {
                format!("{}/{}", module_path, dep)
            };

            imports.push(ServerImport {
                alias: unique_alias(&rf.package, &mut used_aliases),
                import_path,
                dir: dep.clone(),
                accepts_context: rf.accepts_context(),
            });
        }
    }

    imports
}

/// `base`, or `base2`, `base3`, ... for the first free name.
fn unique_alias(base: &str, used: &mut HashSet<String>) -> String {
    let mut alias = base.to_string();
    let mut n = 1;
    while used.contains(&alias) {
        n += 1;
        alias = format!("{}{}", base, n);
    }
    used.insert(alias.clone());
    alias
}

fn go_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

fn write_imports(output: &mut String, framework_module: &str, uses_framework: bool, imports: &[ServerImport]) {
    output.push_str("import (\n");
    for stdlib in [
        "encoding/json",
        "flag",
        "fmt",
        "net/http",
        "os",
        "os/signal",
        "strings",
        "syscall",
    ] {
        output.push_str(&format!("\t\"{}\"\n", stdlib));
    }
    output.push('\n');

    if uses_framework {
        output.push_str(&format!("\trstf {}\n", go_string(framework_module)));
    }
    output.push_str(&format!("\t{}\n", go_string(&format!("{}/renderer", framework_module))));

    if !imports.is_empty() {
        output.push('\n');
        for import in imports {
            output.push_str(&format!("\t{} {}\n", import.alias, go_string(&import.import_path)));
        }
    }
    output.push_str(")\n\n");
}

fn write_struct_to_map(output: &mut String) {
    output.push_str(
        r#"func structToMap(v any) map[string]any {
	b, _ := json.Marshal(v)
	var m map[string]any
	json.Unmarshal(b, &m)
	return m
}

"#,
    );
}

fn write_assemble_page(output: &mut String) {
    output.push_str(
        r#"func assemblePage(html string, serverData map[string]map[string]any, bundlePath string) string {
	sdJSON, _ := json.Marshal(serverData)
	dataScript := "<script>window.__RSTF_SERVER_DATA__ = " + string(sdJSON) + "</script>"
	bundleScript := "<script src=\"" + bundlePath + "\"></script>"
	return "<!DOCTYPE html>" + strings.Replace(html, "</body>", dataScript+bundleScript+"</body>", 1)
}

"#,
    );
}

fn write_main(
    output: &mut String,
    route_calls: &[(&RouteEntry, Vec<DataCall>)],
    app_hook: bool,
    middleware_hook: bool,
) {
    output.push_str(
        r#"func main() {
	port := flag.String("port", "3000", "HTTP server port")
	flag.Parse()

	r := renderer.New()
	if err := r.Start("."); err != nil {
		fmt.Fprintf(os.Stderr, "failed to start renderer: %s\n", err)
		os.Exit(1)
	}
	defer r.Stop()

	go func() {
		c := make(chan os.Signal, 1)
		signal.Notify(c, os.Interrupt, syscall.SIGTERM)
		<-c
		r.Stop()
		os.Exit(0)
	}()
"#,
    );

    if app_hook {
        output.push_str(&format!(
            "\n\tapplication := rstf.NewApp()\n\t{}.App(application)\n\tdefer application.Close()\n",
            LAYOUT_ALIAS
        ));
    }

    output.push_str("\n\tmux := http.NewServeMux()\n");
    output.push_str(&format!(
        "\tmux.Handle(\"GET /{0}/static/\", http.StripPrefix(\"/{0}/static/\", http.FileServer(http.Dir(\"{0}/static\"))))\n",
        OUTPUT_DIR
    ));

    for (route, calls) in route_calls {
        write_route(output, route, calls);
    }

    output.push_str("\n\tvar handler http.Handler = mux\n");
    if middleware_hook {
        output.push_str(&format!(
            "\tmiddleware := {}.Middleware()\n\tfor i := len(middleware) - 1; i >= 0; i-- {{\n\t\thandler = middleware[i](handler)\n\t}}\n",
            LAYOUT_ALIAS
        ));
    }

    output.push_str(
        r#"
	if err := http.ListenAndServe(":"+*port, handler); err != nil {
		fmt.Fprintf(os.Stderr, "server error: %s\n", err)
		os.Exit(1)
	}
}
"#,
    );
}

fn write_route(output: &mut String, route: &RouteEntry, calls: &[DataCall]) {
    output.push_str(&format!(
        "\n\tmux.HandleFunc({}, func(w http.ResponseWriter, req *http.Request) {{\n",
        go_string(&format!("GET {}", route.pattern))
    ));

    if calls.iter().any(|c| c.import.accepts_context) {
        output.push_str("\t\tctx := rstf.NewContext(req)\n\n");
    }

    if calls.is_empty() {
        output.push_str("\t\tsd := map[string]map[string]any{}\n\n");
    } else {
        output.push_str("\t\tsd := map[string]map[string]any{\n");
        for call in calls {
            let args = if call.import.accepts_context { "ctx" } else { "" };
            output.push_str(&format!(
                "\t\t\t{}: structToMap({}.SSR({})),\n",
                go_string(call.key),
                call.import.alias,
                args
            ));
        }
        output.push_str("\t\t}\n\n");
    }

    output.push_str("\t\thtml, err := r.Render(renderer.RenderRequest{\n");
    output.push_str(&format!("\t\t\tComponent: {},\n", go_string(&route.dir)));
    output.push_str(&format!("\t\t\tLayout:    {},\n", go_string(LAYOUT_COMPONENT)));
    if !calls.is_empty() {
        output.push_str("\t\t\tServerData: sd,\n");
    }
    output.push_str("\t\t})\n");
    output.push_str("\t\tif err != nil {\n");
    output.push_str("\t\t\thttp.Error(w, err.Error(), http.StatusInternalServerError)\n");
    output.push_str("\t\t\treturn\n");
    output.push_str("\t\t}\n");
    output.push_str(&format!(
        "\t\tfmt.Fprint(w, assemblePage(html, sd, {}))\n",
        go_string(&bundle_path(&route.dir))
    ));
    output.push_str("\t})\n");
}
