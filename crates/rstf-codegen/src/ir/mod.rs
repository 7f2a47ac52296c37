//! Language-agnostic records produced by the frontend and consumed by codegen.
//!
//! A [`RouteFile`] is the parse result for one project directory. Everything
//! downstream (declarations, runtime modules, the server entry point) is a pure
//! function of these records plus the per-route dependency lists.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Route directory -> sorted, de-duplicated dependency directories.
///
/// The root layout is never listed; callers always add it implicitly.
pub type DependencyMap = BTreeMap<String, Vec<String>>;

/// An exported handler function recognized by name and signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerFunction {
    /// Function name (`SSR`).
    pub name: String,
    /// Name of the locally declared struct the handler returns.
    pub return_type: String,
    /// Whether the first parameter is a pointer to the per-request context.
    pub accepts_context: bool,
}

/// A single serialized field of a [`TypeDefinition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeField {
    /// Field name as declared in source.
    pub source_name: String,
    /// Name used on the wire and in emitted declarations.
    pub serialized_name: String,
    /// Target-language type (`string`, `number`, `Post[]`, ...).
    pub mapped_type: String,
    /// Base source type name with list/pointer wrappers removed.
    pub source_type: String,
    /// Whether the source type is a slice or array.
    pub is_list: bool,
}

/// A struct declaration reachable from some handler's return type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub name: String,
    /// Declaration order; emission order depends on it.
    pub fields: Vec<TypeField>,
}

/// The parse result for one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteFile {
    /// Project-relative directory using `/` separators (`.` for the root layout).
    pub dir: String,
    /// Package name declared by the directory's files.
    pub package: String,
    pub handlers: Vec<HandlerFunction>,
    /// Transitive closure of types reachable from the handlers' return types,
    /// in breadth-first discovery order.
    pub types: Vec<TypeDefinition>,
    /// `func App(*rstf.App)` is declared.
    pub has_app_hook: bool,
    /// `func Middleware() []rstf.Middleware` is declared.
    pub has_middleware_hook: bool,
}

impl RouteFile {
    /// Whether this directory supplies server data.
    pub fn has_handlers(&self) -> bool {
        !self.handlers.is_empty()
    }

    /// Whether the primary handler wants the per-request context.
    pub fn accepts_context(&self) -> bool {
        self.handlers.first().is_some_and(|h| h.accepts_context)
    }

    /// Whether any lifecycle hook is declared.
    pub fn has_hooks(&self) -> bool {
        self.has_app_hook || self.has_middleware_hook
    }

    /// Looks up a reachable type by name.
    pub fn type_named(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(handlers: Vec<HandlerFunction>) -> RouteFile {
        RouteFile {
            dir: "routes/dashboard".to_string(),
            package: "dashboard".to_string(),
            handlers,
            types: vec![TypeDefinition {
                name: "ServerData".to_string(),
                fields: Vec::new(),
            }],
            has_app_hook: false,
            has_middleware_hook: false,
        }
    }

    #[test]
    fn test_accepts_context_uses_first_handler() {
        let rf = route(vec![HandlerFunction {
            name: "SSR".to_string(),
            return_type: "ServerData".to_string(),
            accepts_context: true,
        }]);
        assert!(rf.has_handlers());
        assert!(rf.accepts_context());
        assert!(rf.type_named("ServerData").is_some());
        assert!(rf.type_named("Post").is_none());
    }

    #[test]
    fn test_hook_only_route_has_no_handlers() {
        let mut rf = route(Vec::new());
        rf.has_app_hook = true;
        assert!(!rf.has_handlers());
        assert!(!rf.accepts_context());
        assert!(rf.has_hooks());
    }
}
