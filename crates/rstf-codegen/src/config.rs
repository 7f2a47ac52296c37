//! Generator configuration.

use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Import path of the rstf framework itself.
pub const FRAMEWORK_MODULE: &str = "github.com/rafbgarcia/rstf";

/// Configuration for a [`crate::Generator`].
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Project root (the directory holding go.mod).
    pub project_root: PathBuf,

    /// Upper bound on concurrently running tasks per phase.
    /// `None` uses the available hardware parallelism.
    pub workers: Option<usize>,

    /// Run `go get` for the framework packages after writing the server entry.
    pub resolve_host_deps: bool,

    /// Module path of the framework the generated server imports.
    pub framework_module: String,
}

impl GeneratorConfig {
    /// Creates a configuration for the given project root with defaults.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Self::default()
        }
    }

    /// Resolves the effective worker count (always at least one).
    pub fn worker_count(&self) -> usize {
        match self.workers {
            Some(n) if n > 0 => n,
            _ => std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            workers: None,
            resolve_host_deps: true,
            framework_module: FRAMEWORK_MODULE.to_string(),
        }
    }
}
