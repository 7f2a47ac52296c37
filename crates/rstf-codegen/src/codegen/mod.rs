//! Artifact generation from parsed route records.
//!
//! Every generator here is a pure function from IR to text; the pipeline
//! decides where (and whether) the text is written:
//! - Type declarations (`.rstf/types/<stem>.d.ts`)
//! - Runtime modules (`.rstf/generated/<dir>.ts`)
//! - Hydration entries (`.rstf/entries/<stem>.entry.tsx`)
//! - The Go server entry point (`.rstf/server_gen.go`)

mod dts;
mod hydration;
pub mod project;
mod runtime;
mod server;
mod ts_types;

pub use dts::generate_dts;
pub use hydration::generate_hydration_entry;
pub use runtime::generate_runtime_module;
pub use server::generate_server;
pub use ts_types::{is_primitive, to_ts_type, UNNAMED_TYPE};

use crate::conventions::component_path;
use crate::ir::RouteFile;

/// First line of every generated file.
pub const GENERATED_HEADER: &str = "// Code generated by rstf. DO NOT EDIT.\n";

/// The per-directory artifacts derived from one [`RouteFile`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectoryArtifacts {
    /// Declaration file text.
    pub dts: String,
    /// Runtime module text; empty when the directory has no handlers.
    pub runtime: String,
}

impl DirectoryArtifacts {
    /// Generates both artifacts for a directory.
    pub fn generate(route_file: &RouteFile) -> Self {
        Self {
            dts: generate_dts(route_file),
            runtime: generate_runtime_module(route_file, component_path(&route_file.dir)),
        }
    }
}
