//! Import-graph analysis of TSX components.
//!
//! For each route entry component, [`resolve_dependencies`] follows relative
//! imports transitively and reports which directories supply server data.
//! Reads go through a shared [`FsCache`] so parallel walks over overlapping
//! graphs touch the disk once per file.

pub mod cache;
pub mod imports;
pub mod walker;

pub use cache::FsCache;
pub use imports::{is_relative, ImportScanner};
pub use walker::{resolve_dependencies, resolve_import};
