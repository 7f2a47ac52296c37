//! Go-specific AST types.
//!
//! Only the subset the codegen needs: package clause, struct type
//! declarations, and top-level function signatures.

use std::path::PathBuf;

use crate::codegen::UNNAMED_TYPE;
use crate::diagnostic::Span;

/// A parsed Go file.
#[derive(Debug)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub package: String,
    pub structs: Vec<StructDecl>,
    pub functions: Vec<FuncDecl>,
}

/// A `type Foo struct { ... }` declaration.
#[derive(Debug, Clone)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub span: Span,
}

/// One line of a struct body. Embedded fields have no names.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub names: Vec<String>,
    pub type_expr: TypeExpr,
    /// Raw tag literal including its delimiters.
    pub tag: Option<String>,
}

/// A top-level function (methods are not collected).
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub name: String,
    pub params: Vec<ParamDecl>,
    pub results: Vec<ParamDecl>,
    pub span: Span,
}

/// One parameter declaration; `a, b int` is a single declaration with two names.
#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub names: Vec<String>,
    pub type_expr: TypeExpr,
}

/// Type expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// `Post`, `string`
    Named(String),

    /// `rstf.Context`
    Qualified { package: String, name: String },

    /// `*T`
    Pointer(Box<TypeExpr>),

    /// `[]T`
    Slice(Box<TypeExpr>),

    /// `[N]T`
    Array(Box<TypeExpr>),

    /// Maps, interfaces, funcs, channels, generics; holds the node kind.
    Other(String),
}

impl TypeExpr {
    /// Returns the base type name and whether it is a list.
    ///
    /// Pointers are looked through; slices and arrays set the list flag.
    /// Types without a local name resolve to [`UNNAMED_TYPE`].
    pub fn resolve(&self) -> (String, bool) {
        match self {
            TypeExpr::Named(name) => (name.clone(), false),
            TypeExpr::Pointer(inner) => inner.resolve(),
            TypeExpr::Slice(inner) | TypeExpr::Array(inner) => (inner.resolve().0, true),
            TypeExpr::Qualified { .. } | TypeExpr::Other(_) => (UNNAMED_TYPE.to_string(), false),
        }
    }

    /// Whether this is `*<pkg>.<name>` for any package alias.
    pub fn is_pointer_to_qualified(&self, name: &str) -> bool {
        match self {
            TypeExpr::Pointer(inner) => {
                matches!(inner.as_ref(), TypeExpr::Qualified { name: n, .. } if n == name)
            }
            _ => false,
        }
    }

    /// Whether this is `[]<pkg>.<name>` or `[]<name>`.
    pub fn is_slice_of(&self, name: &str) -> bool {
        match self {
            TypeExpr::Slice(inner) => match inner.as_ref() {
                TypeExpr::Qualified { name: n, .. } => n == name,
                TypeExpr::Named(n) => n == name,
                _ => false,
            },
            _ => false,
        }
    }
}

impl ParamDecl {
    /// Number of values this declaration contributes.
    pub fn arity(&self) -> usize {
        self.names.len().max(1)
    }
}

impl FuncDecl {
    pub fn param_count(&self) -> usize {
        self.params.iter().map(ParamDecl::arity).sum()
    }

    pub fn result_count(&self) -> usize {
        self.results.iter().map(ParamDecl::arity).sum()
    }
}
