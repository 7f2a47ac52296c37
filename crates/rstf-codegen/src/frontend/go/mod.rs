//! Go frontend: recognizes handlers, hooks and their server-data types.

pub mod ast;
pub mod parser;
pub mod to_ir;

use std::path::{Path, PathBuf};

use super::Frontend;
use crate::conventions::relative_dir;
use crate::diagnostic::CodegenError;
use crate::ir::RouteFile;
use parser::GoParser;

/// Go frontend implementation.
pub struct GoFrontend {
    parser: GoParser,
}

impl GoFrontend {
    /// Creates a new Go frontend.
    pub fn new() -> Result<Self, CodegenError> {
        Ok(Self {
            parser: GoParser::new()?,
        })
    }
}

/// Whether a path is a Go source file the generator reads. Test files are
/// never part of a route's handlers.
pub fn is_source_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".go") && !name.ends_with("_test.go")
}

impl Frontend for GoFrontend {
    fn language(&self) -> &str {
        "go"
    }

    fn is_source_file(&self, path: &Path) -> bool {
        is_source_file(path)
    }

    fn parse_package(
        &mut self,
        root: &Path,
        dir: &Path,
        files: &[PathBuf],
    ) -> Result<Option<RouteFile>, CodegenError> {
        let mut parsed_files = Vec::with_capacity(files.len());
        for path in files {
            let source = std::fs::read_to_string(path)
                .map_err(|e| CodegenError::io(path, e.to_string()))?;
            let display = pathdiff::diff_paths(path, root).unwrap_or_else(|| path.clone());
            parsed_files.push(self.parser.parse(&source, &display)?);
        }

        Ok(to_ir::to_ir(&relative_dir(root, dir), &parsed_files))
    }
}
