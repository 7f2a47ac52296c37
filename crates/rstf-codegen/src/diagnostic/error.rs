//! Codegen error types.
#![allow(unused_assignments)]

use std::path::PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// Errors that abort a generation run.
///
/// Nothing in the pipeline recovers from these: a full build stops at the
/// first one, and an incremental run leaves the previous generation in place.
#[allow(unused_assignments)]
#[derive(Error, Diagnostic, Debug)]
pub enum CodegenError {
    // =========================================================================
    // Manifest Errors
    // =========================================================================
    #[error("Failed to read module identifier from '{}': {message}", path.display())]
    #[diagnostic(
        code(rstf::manifest::missing_module),
        help("The project root needs a go.mod with a `module <path>` directive")
    )]
    Manifest {
        path: PathBuf,
        message: String,
    },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("Failed to initialize parser")]
    #[diagnostic(code(rstf::parse::init_failed))]
    ParserInitFailed,

    #[error("Failed to parse '{}' at {line}:{column}: {cause}", path.display())]
    #[diagnostic(code(rstf::parse::syntax_error))]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        cause: String,
    },

    // =========================================================================
    // Generation Errors
    // =========================================================================
    #[error("main.go: package {package} is reserved for rstf")]
    #[diagnostic(
        code(rstf::codegen::naming_conflict),
        help("Use a different package name for the root layout (e.g. your app name)")
    )]
    NamingConflict {
        package: String,
    },

    #[error("Failed to analyze dependencies of '{route}' at '{}': {message}", path.display())]
    #[diagnostic(code(rstf::analysis::dependency_resolution))]
    DependencyResolution {
        route: String,
        path: PathBuf,
        message: String,
    },

    #[error("Failed to resolve framework dependencies: {message}")]
    #[diagnostic(
        code(rstf::host::dependencies),
        help("Run `go get` for the rstf renderer and router packages manually")
    )]
    HostDependencies {
        message: String,
    },

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("Failed to read '{}': {message}", path.display())]
    #[diagnostic(code(rstf::io::read_error))]
    Io {
        path: PathBuf,
        message: String,
    },

    #[error("Failed to write '{}': {message}", path.display())]
    #[diagnostic(code(rstf::io::write_error))]
    Write {
        path: PathBuf,
        message: String,
    },

    // =========================================================================
    // Scheduling Errors
    // =========================================================================
    #[error("Generation task failed: {message}")]
    #[diagnostic(code(rstf::pipeline::task_failed))]
    Task {
        message: String,
    },
}

impl CodegenError {
    /// Creates a read-side IO error.
    pub fn io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Io {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a write-side IO error.
    pub fn write(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Write {
            path: path.into(),
            message: message.into(),
        }
    }
}
