//! Relative import extraction from TSX component source.

use tree_sitter::{Node, Parser};

use crate::diagnostic::CodegenError;

/// Extracts local import specifiers from TSX source.
pub struct ImportScanner {
    parser: Parser,
}

impl ImportScanner {
    pub fn new() -> Result<Self, CodegenError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TSX.into())
            .map_err(|_| CodegenError::ParserInitFailed)?;
        Ok(Self { parser })
    }

    /// Returns the `./` and `../` specifiers of every `import` and
    /// `export … from` statement, in source order.
    ///
    /// Syntax errors elsewhere in the file do not hide well-formed imports.
    pub fn scan(&mut self, source: &str) -> Vec<String> {
        let Some(tree) = self.parser.parse(source, None) else {
            return Vec::new();
        };

        let mut specifiers = Vec::new();
        let mut stack = vec![tree.root_node()];
        while let Some(node) = stack.pop() {
            match node.kind() {
                "import_statement" | "export_statement" => {
                    if let Some(spec) = source_specifier(node, source) {
                        if is_relative(&spec) {
                            specifiers.push(spec);
                        }
                    }
                }
                _ => {
                    let mut cursor = node.walk();
                    let children: Vec<_> = node.named_children(&mut cursor).collect();
                    stack.extend(children.into_iter().rev());
                }
            }
        }
        specifiers
    }
}

fn source_specifier(node: Node, source: &str) -> Option<String> {
    let string = node.child_by_field_name("source")?;
    let text = string.utf8_text(source.as_bytes()).ok()?;
    let spec = text.trim_matches(|c| c == '"' || c == '\'');
    Some(spec.to_string())
}

/// Whether an import specifier points into the project (`./x`, `../x`).
pub fn is_relative(spec: &str) -> bool {
    spec.starts_with("./") || spec.starts_with("../")
}
