//! Go parser using tree-sitter.

use std::path::Path;
use tree_sitter::{Node, Parser};

use super::ast::*;
use crate::diagnostic::{CodegenError, Span};

/// Go parser.
pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    /// Creates a new Go parser.
    pub fn new() -> Result<Self, CodegenError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|_| CodegenError::ParserInitFailed)?;
        Ok(Self { parser })
    }

    /// Parses a Go source file.
    ///
    /// Any syntax error fails the whole file, reported at the first
    /// erroneous node.
    pub fn parse(&mut self, source: &str, path: &Path) -> Result<ParsedFile, CodegenError> {
        let tree = self.parser.parse(source, None).ok_or_else(|| CodegenError::Parse {
            path: path.to_path_buf(),
            line: 1,
            column: 1,
            cause: "parser produced no tree".to_string(),
        })?;

        let root = tree.root_node();
        let mut visitor = Visitor::new(source, path);
        if root.has_error() {
            return Err(visitor.syntax_error(root));
        }
        visitor.visit_source_file(root);

        Ok(ParsedFile {
            path: path.to_path_buf(),
            package: visitor.package,
            structs: visitor.structs,
            functions: visitor.functions,
        })
    }
}

/// AST visitor that extracts declarations from tree-sitter nodes.
struct Visitor<'a> {
    source: &'a str,
    path: &'a Path,
    package: String,
    structs: Vec<StructDecl>,
    functions: Vec<FuncDecl>,
}

impl<'a> Visitor<'a> {
    fn new(source: &'a str, path: &'a Path) -> Self {
        Self {
            source,
            path,
            package: String::new(),
            structs: Vec::new(),
            functions: Vec::new(),
        }
    }

    fn span(&self, node: Node) -> Span {
        Span::new(
            self.path.to_path_buf(),
            node.start_position().row,
            node.start_position().column,
            node.end_position().row,
            node.end_position().column,
        )
    }

    fn node_text(&self, node: Node) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// Builds a parse error for the first ERROR or MISSING node in document order.
    fn syntax_error(&self, root: Node) -> CodegenError {
        let mut stack = vec![root];
        let mut culprit = root;
        while let Some(node) = stack.pop() {
            if node.is_error() || node.is_missing() {
                culprit = node;
                break;
            }
            if !node.has_error() {
                continue;
            }
            let mut cursor = node.walk();
            let children: Vec<_> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }

        let span = self.span(culprit);
        let cause = if culprit.is_missing() {
            format!("expected {}", culprit.kind())
        } else {
            let text = self.node_text(culprit);
            let snippet: String = text.chars().take(32).collect();
            if snippet.trim().is_empty() {
                "syntax error".to_string()
            } else {
                format!("unexpected `{}`", snippet.trim())
            }
        };

        CodegenError::Parse {
            path: self.path.to_path_buf(),
            line: span.line(),
            column: span.column(),
            cause,
        }
    }

    fn visit_source_file(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "package_clause" => self.visit_package_clause(child),
                "function_declaration" => {
                    if let Some(func) = self.visit_function(child) {
                        self.functions.push(func);
                    }
                }
                "type_declaration" => self.visit_type_declaration(child),
                _ => {}
            }
        }
    }

    fn visit_package_clause(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "package_identifier" {
                self.package = self.node_text(child).to_string();
            }
        }
    }

    fn visit_type_declaration(&mut self, node: Node) {
        let mut cursor = node.walk();
        for spec in node.children(&mut cursor) {
            // type_alias (`type A = B`) never declares a struct of its own.
            if spec.kind() != "type_spec" {
                continue;
            }
            let (Some(name), Some(ty)) = (
                spec.child_by_field_name("name"),
                spec.child_by_field_name("type"),
            ) else {
                continue;
            };
            if ty.kind() == "struct_type" {
                self.structs.push(StructDecl {
                    name: self.node_text(name).to_string(),
                    fields: self.visit_struct_fields(ty),
                    span: self.span(spec),
                });
            }
        }
    }

    fn visit_struct_fields(&self, node: Node) -> Vec<FieldDecl> {
        let mut fields = Vec::new();
        let mut cursor = node.walk();
        for list in node.children(&mut cursor) {
            if list.kind() != "field_declaration_list" {
                continue;
            }
            let mut list_cursor = list.walk();
            for decl in list.children(&mut list_cursor) {
                if decl.kind() != "field_declaration" {
                    continue;
                }
                let Some(ty) = decl.child_by_field_name("type") else {
                    continue;
                };

                let mut name_cursor = decl.walk();
                let names = decl
                    .children_by_field_name("name", &mut name_cursor)
                    .map(|n| self.node_text(n).to_string())
                    .collect();

                fields.push(FieldDecl {
                    names,
                    type_expr: self.visit_type(ty),
                    tag: decl
                        .child_by_field_name("tag")
                        .map(|t| self.node_text(t).to_string()),
                });
            }
        }
        fields
    }

    fn visit_function(&self, node: Node) -> Option<FuncDecl> {
        let name = self.node_text(node.child_by_field_name("name")?).to_string();

        let params = node
            .child_by_field_name("parameters")
            .map(|p| self.visit_parameter_list(p))
            .unwrap_or_default();

        let results = match node.child_by_field_name("result") {
            None => Vec::new(),
            Some(result) if result.kind() == "parameter_list" => self.visit_parameter_list(result),
            Some(result) => vec![ParamDecl {
                names: Vec::new(),
                type_expr: self.visit_type(result),
            }],
        };

        Some(FuncDecl {
            name,
            params,
            results,
            span: self.span(node),
        })
    }

    fn visit_parameter_list(&self, node: Node) -> Vec<ParamDecl> {
        let mut params = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "parameter_declaration" | "variadic_parameter_declaration" => {
                    let Some(ty) = child.child_by_field_name("type") else {
                        continue;
                    };
                    let mut name_cursor = child.walk();
                    let names = child
                        .children_by_field_name("name", &mut name_cursor)
                        .map(|n| self.node_text(n).to_string())
                        .collect();
                    let type_expr = if child.kind() == "variadic_parameter_declaration" {
                        TypeExpr::Slice(Box::new(self.visit_type(ty)))
                    } else {
                        self.visit_type(ty)
                    };
                    params.push(ParamDecl { names, type_expr });
                }
                _ => {}
            }
        }
        params
    }

    fn visit_type(&self, node: Node) -> TypeExpr {
        match node.kind() {
            "type_identifier" => TypeExpr::Named(self.node_text(node).to_string()),
            "qualified_type" => TypeExpr::Qualified {
                package: node
                    .child_by_field_name("package")
                    .map(|n| self.node_text(n).to_string())
                    .unwrap_or_default(),
                name: node
                    .child_by_field_name("name")
                    .map(|n| self.node_text(n).to_string())
                    .unwrap_or_default(),
            },
            "pointer_type" => match node.named_child(0) {
                Some(inner) => TypeExpr::Pointer(Box::new(self.visit_type(inner))),
                None => TypeExpr::Other(node.kind().to_string()),
            },
            "slice_type" => self.element_of(node, TypeExpr::Slice),
            "array_type" | "implicit_length_array_type" => self.element_of(node, TypeExpr::Array),
            "parenthesized_type" => match node.named_child(0) {
                Some(inner) => self.visit_type(inner),
                None => TypeExpr::Other(node.kind().to_string()),
            },
            other => TypeExpr::Other(other.to_string()),
        }
    }

    fn element_of(&self, node: Node, wrap: fn(Box<TypeExpr>) -> TypeExpr) -> TypeExpr {
        match node.child_by_field_name("element") {
            Some(element) => wrap(Box::new(self.visit_type(element))),
            None => TypeExpr::Other(node.kind().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ParsedFile {
        let mut parser = GoParser::new().unwrap();
        parser.parse(source, Path::new("routes/dashboard/index.go")).unwrap()
    }

    #[test]
    fn test_parse_package_and_struct() {
        let file = parse(
            r#"package dashboard

type Post struct {
	Title     string `json:"title"`
	Published bool   `json:"published"`
	Tags      []string
	Author    *Author
}
"#,
        );

        assert_eq!(file.package, "dashboard");
        assert_eq!(file.structs.len(), 1);
        let post = &file.structs[0];
        assert_eq!(post.name, "Post");
        assert_eq!(post.fields.len(), 4);
        assert_eq!(post.fields[0].names, vec!["Title"]);
        assert_eq!(post.fields[0].tag.as_deref(), Some("`json:\"title\"`"));
        assert_eq!(
            post.fields[2].type_expr,
            TypeExpr::Slice(Box::new(TypeExpr::Named("string".to_string())))
        );
        assert_eq!(
            post.fields[3].type_expr,
            TypeExpr::Pointer(Box::new(TypeExpr::Named("Author".to_string())))
        );
        assert!(post.fields[2].tag.is_none());
    }

    #[test]
    fn test_parse_grouped_types_and_embedded_fields() {
        let file = parse(
            r#"package shared

type (
	Base struct{ ID int }
	Item struct {
		Base
		A, B string
	}
)

type Alias = Item
"#,
        );

        let names: Vec<_> = file.structs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Base", "Item"]);
        let item = &file.structs[1];
        assert!(item.fields[0].names.is_empty());
        assert_eq!(item.fields[1].names, vec!["A", "B"]);
    }

    #[test]
    fn test_parse_function_signatures() {
        let file = parse(
            r#"package dashboard

import "github.com/rafbgarcia/rstf"

func SSR(ctx *rstf.Context) ServerData { return ServerData{} }

func Pair() (a, b int) { return 0, 0 }

func (s *Service) SSR() ServerData { return ServerData{} }
"#,
        );

        assert_eq!(file.functions.len(), 2);
        let ssr = &file.functions[0];
        assert_eq!(ssr.name, "SSR");
        assert_eq!(ssr.param_count(), 1);
        assert!(ssr.params[0].type_expr.is_pointer_to_qualified("Context"));
        assert_eq!(ssr.result_count(), 1);
        assert_eq!(ssr.results[0].type_expr, TypeExpr::Named("ServerData".to_string()));

        let pair = &file.functions[1];
        assert_eq!(pair.result_count(), 2);
    }

    #[test]
    fn test_syntax_error_reports_position() {
        let mut parser = GoParser::new().unwrap();
        let err = parser
            .parse("package main\n\nfunc SSR( {\n", Path::new("main.go"))
            .unwrap_err();
        match err {
            CodegenError::Parse { path, line, .. } => {
                assert_eq!(path, Path::new("main.go"));
                assert!(line >= 3);
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
