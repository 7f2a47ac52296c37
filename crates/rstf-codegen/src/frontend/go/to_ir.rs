//! Convert Go AST to language-agnostic IR.

use std::collections::{HashMap, HashSet, VecDeque};

use super::ast::*;
use crate::codegen::{is_primitive, to_ts_type, UNNAMED_TYPE};
use crate::conventions::lc_first;
use crate::ir::{HandlerFunction, RouteFile, TypeDefinition, TypeField};

/// Function names recognized as server-data handlers.
pub const HANDLER_NAMES: &[&str] = &["SSR"];

/// Lifecycle hook `func App(app *rstf.App)`.
const APP_HOOK: &str = "App";

/// Lifecycle hook `func Middleware() []rstf.Middleware`.
const MIDDLEWARE_HOOK: &str = "Middleware";

/// Converts the parsed files of one directory into a [`RouteFile`].
///
/// Returns `None` when the directory declares neither handlers nor hooks.
/// `files` must be sorted by file name; the package name is taken from the
/// first one.
pub fn to_ir(dir: &str, files: &[ParsedFile]) -> Option<RouteFile> {
    let first = files.first()?;

    // Struct declarations from every file, later ones shadowing earlier ones.
    let mut struct_defs: HashMap<&str, &StructDecl> = HashMap::new();
    for decl in files.iter().flat_map(|f| f.structs.iter()) {
        struct_defs.insert(decl.name.as_str(), decl);
    }

    let mut handlers = Vec::new();
    let mut has_app_hook = false;
    let mut has_middleware_hook = false;

    for func in files.iter().flat_map(|f| f.functions.iter()) {
        if HANDLER_NAMES.contains(&func.name.as_str()) {
            if let Some(handler) = convert_handler(func, &struct_defs) {
                handlers.push(handler);
            }
        } else if func.name == APP_HOOK && is_app_hook(func) {
            has_app_hook = true;
        } else if func.name == MIDDLEWARE_HOOK && is_middleware_hook(func) {
            has_middleware_hook = true;
        }
    }

    if handlers.is_empty() && !has_app_hook && !has_middleware_hook {
        return None;
    }

    let roots: Vec<&str> = handlers.iter().map(|h| h.return_type.as_str()).collect();
    let types = reachable_types(&roots, &struct_defs);

    Some(RouteFile {
        dir: dir.to_string(),
        package: first.package.clone(),
        handlers,
        types,
        has_app_hook,
        has_middleware_hook,
    })
}

/// A handler returns exactly one value: a locally declared struct, optionally
/// behind a pointer.
fn convert_handler(func: &FuncDecl, struct_defs: &HashMap<&str, &StructDecl>) -> Option<HandlerFunction> {
    if func.result_count() != 1 {
        return None;
    }
    let (return_type, is_list) = func.results[0].type_expr.resolve();
    if is_list || return_type == UNNAMED_TYPE || is_primitive(&return_type) {
        return None;
    }
    if !struct_defs.contains_key(return_type.as_str()) {
        return None;
    }

    let accepts_context = func
        .params
        .first()
        .is_some_and(|p| p.type_expr.is_pointer_to_qualified("Context"));

    Some(HandlerFunction {
        name: func.name.clone(),
        return_type,
        accepts_context,
    })
}

fn is_app_hook(func: &FuncDecl) -> bool {
    func.param_count() == 1
        && func.params[0].type_expr.is_pointer_to_qualified("App")
        && func.result_count() == 0
}

fn is_middleware_hook(func: &FuncDecl) -> bool {
    func.param_count() == 0
        && func.result_count() == 1
        && func.results[0].type_expr.is_slice_of("Middleware")
}

/// Breadth-first closure over struct-typed fields, starting at `roots`.
fn reachable_types(roots: &[&str], struct_defs: &HashMap<&str, &StructDecl>) -> Vec<TypeDefinition> {
    let mut types = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = roots.iter().map(|r| r.to_string()).collect();

    while let Some(name) = queue.pop_front() {
        if !visited.insert(name.clone()) {
            continue;
        }
        let Some(decl) = struct_defs.get(name.as_str()) else {
            continue;
        };
        let def = convert_struct(decl);
        for field in &def.fields {
            if struct_defs.contains_key(field.source_type.as_str()) && !visited.contains(&field.source_type) {
                queue.push_back(field.source_type.clone());
            }
        }
        types.push(def);
    }

    types
}

/// Converts exported, named fields; embedded and unexported fields and those
/// tagged `json:"-"` are dropped.
fn convert_struct(decl: &StructDecl) -> TypeDefinition {
    let mut fields = Vec::new();
    for field in &decl.fields {
        let (source_type, is_list) = field.type_expr.resolve();
        for name in &field.names {
            if !is_exported(name) {
                continue;
            }
            let Some(serialized_name) = serialized_name(name, field.tag.as_deref()) else {
                continue;
            };
            fields.push(TypeField {
                source_name: name.clone(),
                serialized_name,
                mapped_type: to_ts_type(&source_type, is_list),
                source_type: source_type.clone(),
                is_list,
            });
        }
    }
    TypeDefinition {
        name: decl.name.clone(),
        fields,
    }
}

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Wire name of a field, or `None` if the `json` tag excludes it.
fn serialized_name(field: &str, tag: Option<&str>) -> Option<String> {
    let value = tag.and_then(|t| tag_lookup(&tag_contents(t), "json"));
    let Some(value) = value else {
        return Some(lc_first(field));
    };

    let name = value.split(',').next().unwrap_or("");
    if name == "-" {
        return None;
    }
    let name: String = name.chars().filter(|c| *c != '"' && *c != '`').collect();
    if name.is_empty() {
        Some(lc_first(field))
    } else {
        Some(name)
    }
}

/// Strips the literal delimiters from a raw or interpreted string tag.
fn tag_contents(literal: &str) -> String {
    if let Some(inner) = literal.strip_prefix('`').and_then(|s| s.strip_suffix('`')) {
        return inner.to_string();
    }
    match literal.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) => unescape(inner),
        None => literal.to_string(),
    }
}

/// Looks up `key` in a conventional `key:"value" key2:"value2"` tag.
///
/// Stops at the first malformed pair, like `reflect.StructTag.Lookup`.
fn tag_lookup(tag: &str, key: &str) -> Option<String> {
    let mut rest = tag.as_bytes();
    while !rest.is_empty() {
        let start = rest.iter().position(|b| *b != b' ')?;
        rest = &rest[start..];

        let i = rest
            .iter()
            .position(|b| *b <= b' ' || *b == b':' || *b == b'"' || *b == 0x7f)
            .unwrap_or(rest.len());
        if i == 0 || i + 1 >= rest.len() || rest[i] != b':' || rest[i + 1] != b'"' {
            return None;
        }
        let name = &rest[..i];
        rest = &rest[i + 1..];

        let mut j = 1;
        while j < rest.len() && rest[j] != b'"' {
            if rest[j] == b'\\' {
                j += 1;
            }
            j += 1;
        }
        if j >= rest.len() {
            return None;
        }
        let quoted = &rest[..=j];
        rest = &rest[j + 1..];

        if name == key.as_bytes() {
            let quoted = std::str::from_utf8(quoted).ok()?;
            return Some(unescape(&quoted[1..quoted.len() - 1]));
        }
    }
    None
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
