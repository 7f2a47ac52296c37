//! Source location tracking.

use std::path::PathBuf;

/// A span in a parsed source file. Rows and columns are zero-based, as
/// reported by tree-sitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub file: PathBuf,
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl Span {
    pub fn new(file: PathBuf, start_line: usize, start_col: usize, end_line: usize, end_col: usize) -> Self {
        Self {
            file,
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// One-based line number for user-facing messages.
    pub fn line(&self) -> usize {
        self.start_line + 1
    }

    /// One-based column number for user-facing messages.
    pub fn column(&self) -> usize {
        self.start_col + 1
    }
}
