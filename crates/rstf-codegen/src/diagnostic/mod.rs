//! Diagnostic types for error reporting.

mod error;
mod span;

pub use error::CodegenError;
pub use span::Span;
