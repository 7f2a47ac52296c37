//! Depth-first walk of a route's import graph.

use std::collections::{BTreeSet, HashSet};
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use super::cache::FsCache;
use super::imports::ImportScanner;
use crate::conventions::{relative_dir, COMPONENT_ENTRY, ROOT_DIR};
use crate::diagnostic::CodegenError;

/// Returns the sorted, de-duplicated project-relative directories that supply
/// server data to the component at `entry` (relative to `project_root`).
///
/// A visited file's directory is recorded when it holds at least one handler
/// source file. The root layout is never listed.
#[tracing::instrument(skip_all, fields(entry = %entry))]
pub fn resolve_dependencies(
    project_root: &Path,
    entry: &str,
    cache: &FsCache,
) -> Result<Vec<String>, CodegenError> {
    let route = Path::new(entry)
        .parent()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();
    let mut scanner = ImportScanner::new()?;

    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut dirs: BTreeSet<String> = BTreeSet::new();
    let mut stack = vec![project_root.join(entry)];

    while let Some(file) = stack.pop() {
        if !visited.insert(file.clone()) {
            continue;
        }

        let source = cache
            .read_file(&file)
            .map_err(|e| CodegenError::DependencyResolution {
                route: route.clone(),
                path: file.clone(),
                message: e.to_string(),
            })?;

        let Some(dir) = file.parent() else {
            continue;
        };
        if cache.dir_has_source(dir) {
            let rel = relative_dir(project_root, dir);
            if rel != ROOT_DIR {
                dirs.insert(rel);
            }
        }

        let imports = scanner.scan(&source);
        for spec in imports.iter().rev() {
            match resolve_import(dir, spec, cache) {
                Some(target) => stack.push(target),
                None => debug!(from = %file.display(), spec = %spec, "Unresolved import skipped"),
            }
        }
    }

    Ok(dirs.into_iter().collect())
}

/// Resolves a relative specifier to a component file.
///
/// Tries `{spec}.tsx`, then `{spec}` when it already names a `.tsx` file,
/// then `{spec}/index.tsx`.
pub fn resolve_import(base_dir: &Path, spec: &str, cache: &FsCache) -> Option<PathBuf> {
    let target = normalize(&base_dir.join(spec));

    let mut with_ext = target.clone().into_os_string();
    with_ext.push(".tsx");
    let mut candidates = vec![PathBuf::from(with_ext)];
    if spec.ends_with(".tsx") {
        candidates.push(target.clone());
    }
    candidates.push(target.join(COMPONENT_ENTRY));

    candidates.into_iter().find(|c| cache.is_file(c))
}

/// Lexically resolves `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "main.go", "package app\n");
        write(root, "main.tsx", "export function View() {}\n");
        write(root, "routes/dashboard/index.go", "package dashboard\n");
        write(
            root,
            "routes/dashboard/index.tsx",
            "import { Avatar } from \"../../shared/ui/avatar\";\nimport { Chart } from \"../../shared/ui/chart\";\nimport React from \"react\";\n",
        );
        write(root, "shared/ui/avatar/index.go", "package avatar\n");
        write(root, "shared/ui/avatar/index.tsx", "import { Chart } from \"../chart\";\n");
        write(root, "shared/ui/chart/index.tsx", "import { Avatar } from \"../avatar\";\n");
        dir
    }

    #[test]
    fn test_collects_data_directories() {
        let dir = project();
        let cache = FsCache::new();
        let deps = resolve_dependencies(dir.path(), "routes/dashboard/index.tsx", &cache).unwrap();
        assert_eq!(deps, vec!["routes/dashboard", "shared/ui/avatar"]);
    }

    #[test]
    fn test_cycles_terminate() {
        let dir = project();
        let cache = FsCache::new();
        let deps = resolve_dependencies(dir.path(), "shared/ui/chart/index.tsx", &cache).unwrap();
        assert_eq!(deps, vec!["shared/ui/avatar"]);
    }

    #[test]
    fn test_root_layout_is_excluded() {
        let dir = project();
        write(dir.path(), "routes/home/index.tsx", "import { View } from \"../../main\";\n");
        let cache = FsCache::new();
        let deps = resolve_dependencies(dir.path(), "routes/home/index.tsx", &cache).unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn test_missing_imports_are_skipped() {
        let dir = project();
        write(dir.path(), "routes/about/index.tsx", "import { X } from \"./does-not-exist\";\n");
        let cache = FsCache::new();
        let deps = resolve_dependencies(dir.path(), "routes/about/index.tsx", &cache).unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn test_unreadable_entry_is_an_error() {
        let dir = project();
        let cache = FsCache::new();
        let err = resolve_dependencies(dir.path(), "routes/ghost/index.tsx", &cache).unwrap_err();
        match err {
            CodegenError::DependencyResolution { route, .. } => assert_eq!(route, "routes/ghost"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_file_import_preferred_over_directory_index() {
        let dir = project();
        let root = dir.path();
        write(root, "routes/blog/index.tsx", "import { Card } from \"./card\";\n");
        write(root, "routes/blog/card.tsx", "export const Card = 1;\n");
        write(root, "routes/blog/card/index.tsx", "import { X } from \"../../../shared/ui/avatar\";\n");

        let cache = FsCache::new();
        let deps = resolve_dependencies(root, "routes/blog/index.tsx", &cache).unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn test_invalidation_picks_up_new_edges() {
        let dir = project();
        let root = dir.path();
        write(root, "routes/about/index.tsx", "export const View = 1;\n");

        let cache = FsCache::new();
        assert!(resolve_dependencies(root, "routes/about/index.tsx", &cache).unwrap().is_empty());

        let entry = root.join("routes/about/index.tsx");
        fs::write(&entry, "import { A } from \"../../shared/ui/avatar\";\n").unwrap();
        cache.invalidate(&[entry]);

        let deps = resolve_dependencies(root, "routes/about/index.tsx", &cache).unwrap();
        assert_eq!(deps, vec!["shared/ui/avatar"]);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
    }
}
