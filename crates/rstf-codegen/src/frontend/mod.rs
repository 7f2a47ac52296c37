//! Language frontends for parsing handler sources into IR.
//!
//! A frontend parses the files of one directory (one package) into a
//! [`RouteFile`]. Directory discovery is shared: the project walk skips the
//! framework's output directory and other ignored folders, and visits files
//! in name order so results do not depend on filesystem enumeration order.

pub mod go;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::conventions::IGNORED_DIRS;
use crate::diagnostic::CodegenError;
use crate::ir::RouteFile;

/// Trait for language frontends.
pub trait Frontend {
    /// Returns the language name (e.g., "go").
    fn language(&self) -> &str;

    /// Whether this frontend reads the given file.
    fn is_source_file(&self, path: &Path) -> bool;

    /// Parses the given files of one directory. `files` are sorted by name.
    fn parse_package(
        &mut self,
        root: &Path,
        dir: &Path,
        files: &[PathBuf],
    ) -> Result<Option<RouteFile>, CodegenError>;

    /// Parses every source directory under `root`.
    ///
    /// Directories without handlers or hooks are omitted. The result is
    /// ordered by directory path.
    fn parse_project(&mut self, root: &Path) -> Result<Vec<RouteFile>, CodegenError> {
        let mut by_dir: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !(e.depth() > 0 && e.file_type().is_dir() && is_ignored_dir(e.path())));

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                CodegenError::io(path, e.to_string())
            })?;
            if !entry.file_type().is_file() || !self.is_source_file(entry.path()) {
                continue;
            }
            if let Some(parent) = entry.path().parent() {
                by_dir
                    .entry(parent.to_path_buf())
                    .or_default()
                    .push(entry.path().to_path_buf());
            }
        }

        let mut files = Vec::new();
        for (dir, sources) in &by_dir {
            if let Some(route_file) = self.parse_package(root, dir, sources)? {
                files.push(route_file);
            }
        }
        Ok(files)
    }

    /// Re-parses a single directory. A missing directory or one without
    /// source files yields `None`.
    fn parse_single_dir(&mut self, root: &Path, dir: &Path) -> Result<Option<RouteFile>, CodegenError> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CodegenError::io(dir, e.to_string())),
        };

        let mut sources = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CodegenError::io(dir, e.to_string()))?;
            let is_file = entry
                .file_type()
                .map_err(|e| CodegenError::io(entry.path(), e.to_string()))?
                .is_file();
            let path = entry.path();
            if is_file && self.is_source_file(&path) {
                sources.push(path);
            }
        }
        if sources.is_empty() {
            return Ok(None);
        }
        sources.sort();

        self.parse_package(root, dir, &sources)
    }
}

fn is_ignored_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| IGNORED_DIRS.contains(&name))
}

#[cfg(test)]
mod tests {
    use super::go::GoFrontend;
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_parse_project_skips_ignored_dirs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "main.go", "package app\n\ntype ServerData struct{ AppName string }\n\nfunc SSR() ServerData { return ServerData{} }\n");
        write(root, "routes/dashboard/index.go", "package dashboard\n\ntype ServerData struct{}\n\nfunc SSR() ServerData { return ServerData{} }\n");
        write(root, "routes/dashboard/index_test.go", "package dashboard\n\nfunc SSR( {\n");
        write(root, "lib/util.go", "package lib\n\nfunc Helper() int { return 1 }\n");
        write(root, ".rstf/pkgs/routes/x/index.go", "package x\n\ntype D struct{}\n\nfunc SSR() D { return D{} }\n");
        write(root, "node_modules/pkg/x.go", "not go at all");

        let mut frontend = GoFrontend::new().unwrap();
        let files = frontend.parse_project(root).unwrap();
        let dirs: Vec<_> = files.iter().map(|f| f.dir.as_str()).collect();
        assert_eq!(dirs, vec![".", "routes/dashboard"]);
    }

    #[test]
    fn test_parse_project_reports_syntax_errors() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "routes/broken/index.go", "package broken\n\nfunc SSR( {\n");

        let mut frontend = GoFrontend::new().unwrap();
        let err = frontend.parse_project(dir.path()).unwrap_err();
        assert!(matches!(err, CodegenError::Parse { .. }));
    }

    #[test]
    fn test_parse_single_dir() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "routes/a/index.go", "package a\n\ntype D struct{ X int }\n\nfunc SSR() D { return D{} }\n");

        let mut frontend = GoFrontend::new().unwrap();
        let rf = frontend.parse_single_dir(root, &root.join("routes/a")).unwrap().unwrap();
        assert_eq!(rf.dir, "routes/a");
        assert!(frontend.parse_single_dir(root, &root.join("routes/missing")).unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_sources_are_skipped_by_both_passes() {
        let outside = TempDir::new().unwrap();
        write(outside.path(), "index.go", "package linked\n\ntype D struct{}\n\nfunc SSR() D { return D{} }\n");

        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("routes/linked")).unwrap();
        std::os::unix::fs::symlink(outside.path().join("index.go"), root.join("routes/linked/index.go")).unwrap();

        let mut frontend = GoFrontend::new().unwrap();
        assert!(frontend.parse_project(root).unwrap().is_empty());
        assert!(frontend.parse_single_dir(root, &root.join("routes/linked")).unwrap().is_none());
    }
}
