//! Full and incremental generation runs.
//!
//! A full build runs four phases with a strict barrier between them:
//!
//! ```text
//! Setup            clean .rstf/, parse every package, enumerate routes
//!   │
//! Analysis         ∥ import walk per route   ∥ .d.ts + runtime per package
//!   │                (dynamic-segment symlinks, sequential)
//! Entries          ∥ hydration entry per analyzed route
//!   │
//! Finalize         server_gen.go, host build-system dependencies
//! ```
//!
//! The [`Generator`] keeps what a build produced so that
//! [`Generator::regenerate`] can redo only what a batch of file changes
//! affects.

pub mod incremental;
pub mod output;
pub mod scheduler;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::codegen::{self, project, DirectoryArtifacts};
use crate::config::GeneratorConfig;
use crate::conventions::{has_dynamic_segment, is_route_dir, COMPONENT_ENTRY, ROUTES_DIR};
use crate::deps::{resolve_dependencies, FsCache};
use crate::diagnostic::CodegenError;
use crate::frontend::go::GoFrontend;
use crate::frontend::Frontend;
use crate::ir::{DependencyMap, RouteFile};
use output::{write_file, OutputLayout};
use scheduler::TaskPool;

pub use incremental::{ChangeEvent, ChangeKind, RegenerateResult};

/// Outcome of a generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerateResult {
    /// Distinct route directories, from parsing and from dependency analysis.
    pub route_count: usize,
    /// Route directory -> absolute path of its hydration entry.
    pub entries: BTreeMap<String, PathBuf>,
}

/// Everything a previous run produced that the next incremental run diffs
/// against.
#[derive(Debug, Clone, Default)]
pub(crate) struct GeneratorState {
    pub files: BTreeMap<String, RouteFile>,
    pub deps: DependencyMap,
    pub entries: BTreeMap<String, PathBuf>,
    pub artifacts: BTreeMap<String, DirectoryArtifacts>,
    pub server_code: Option<String>,
    /// Directories whose artifacts on disk may not match `artifacts` after a
    /// partially applied regeneration.
    pub stale_dirs: BTreeSet<String>,
}

/// Runs code generation for one project and remembers the result.
pub struct Generator {
    config: GeneratorConfig,
    root: PathBuf,
    module_path: String,
    layout: OutputLayout,
    cache: Arc<FsCache>,
    state: GeneratorState,
}

impl Generator {
    /// Resolves the project root and reads the module identifier from go.mod.
    /// No files are generated yet.
    pub fn new(config: GeneratorConfig) -> Result<Self, CodegenError> {
        let root = config
            .project_root
            .canonicalize()
            .map_err(|e| CodegenError::io(&config.project_root, e.to_string()))?;
        let module_path = project::read_module_path(&root)?;

        Ok(Self {
            layout: OutputLayout::new(&root),
            config,
            root,
            module_path,
            cache: Arc::new(FsCache::new()),
            state: GeneratorState::default(),
        })
    }

    /// Absolute project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Module identifier from go.mod.
    pub fn module_path(&self) -> &str {
        &self.module_path
    }

    /// The output tree this generator writes.
    pub fn output(&self) -> &OutputLayout {
        &self.layout
    }

    /// Route directory -> dependency directories, as of the last run.
    pub fn dependencies(&self) -> &DependencyMap {
        &self.state.deps
    }

    /// Parsed packages by directory, as of the last run.
    pub fn route_files(&self) -> &BTreeMap<String, RouteFile> {
        &self.state.files
    }

    /// Clean rebuild of `.rstf/`. On success the generator's state reflects
    /// this build; on failure the previous state is kept.
    #[tracing::instrument(skip_all, fields(root = %self.root.display()))]
    pub async fn generate(&mut self) -> Result<GenerateResult, CodegenError> {
        // Setup
        self.layout.clean()?;
        let mut frontend = GoFrontend::new()?;
        let files = frontend.parse_project(&self.root)?;
        self.layout.create_skeleton()?;
        let targets = analysis_targets(&self.root, files.iter().map(|f| f.dir.as_str()))?;
        info!(packages = files.len(), routes = targets.len(), "Parsed project");

        let cache = Arc::new(FsCache::new());
        let workers = self.config.worker_count();

        // Analysis
        let deps = Arc::new(Mutex::new(DependencyMap::new()));
        let artifacts = Arc::new(Mutex::new(BTreeMap::new()));
        let mut pool = TaskPool::new(workers);
        spawn_dependency_walks(&mut pool, &self.root, &targets, &cache, &deps);

        for route_file in &files {
            let route_file = route_file.clone();
            let layout = self.layout.clone();
            let artifacts = Arc::clone(&artifacts);
            pool.spawn(move || {
                let generated = DirectoryArtifacts::generate(&route_file);
                write_directory_artifacts(&layout, &route_file.dir, &generated)?;
                artifacts.lock().insert(route_file.dir.clone(), generated);
                Ok(())
            });
        }

        for route_file in files.iter().filter(|f| has_dynamic_segment(&f.dir)) {
            self.layout.link_dynamic_dir(&route_file.dir)?;
        }

        pool.join().await?;
        let deps = std::mem::take(&mut *deps.lock());
        let artifacts = std::mem::take(&mut *artifacts.lock());

        // Entries
        let entries = Arc::new(Mutex::new(BTreeMap::new()));
        let mut pool = TaskPool::new(workers);
        for (route, route_deps) in deps.iter().filter(|(route, _)| is_route_dir(route)) {
            let route = route.clone();
            let route_deps = route_deps.clone();
            let path = self.layout.entry_path(&route);
            let entries = Arc::clone(&entries);
            pool.spawn(move || {
                write_file(&path, &codegen::generate_hydration_entry(&route, &route_deps))?;
                entries.lock().insert(route, path);
                Ok(())
            });
        }
        pool.join().await?;
        let entries = std::mem::take(&mut *entries.lock());

        // Finalize
        let server_code =
            codegen::generate_server(&self.module_path, &self.config.framework_module, &files, &deps)?;
        write_file(&self.layout.server_path(), &server_code)?;

        if self.config.resolve_host_deps {
            project::ensure_host_dependencies(&self.root, &self.module_path, &self.config.framework_module)
                .await?;
        }

        let files: BTreeMap<String, RouteFile> = files.into_iter().map(|f| (f.dir.clone(), f)).collect();
        let result = GenerateResult {
            route_count: count_routes(files.keys(), &deps),
            entries: entries.clone(),
        };
        info!(routes = result.route_count, entries = result.entries.len(), "Generated project");

        self.cache = cache;
        self.state = GeneratorState {
            files,
            deps,
            entries,
            artifacts,
            server_code: Some(server_code),
            stale_dirs: BTreeSet::new(),
        };
        Ok(result)
    }
}

/// Builds a throwaway [`Generator`] and runs a full build.
pub async fn generate(config: GeneratorConfig) -> Result<GenerateResult, CodegenError> {
    Generator::new(config)?.generate().await
}

/// Routes that need dependency analysis: parsed route directories with a
/// component entry, plus every direct child of `routes/` that has one.
pub(crate) fn analysis_targets<'a>(
    root: &Path,
    parsed_dirs: impl Iterator<Item = &'a str>,
) -> Result<BTreeSet<String>, CodegenError> {
    let mut targets: BTreeSet<String> = parsed_dirs
        .filter(|dir| is_route_dir(dir) && root.join(dir).join(COMPONENT_ENTRY).is_file())
        .map(str::to_string)
        .collect();

    let routes_dir = root.join(ROUTES_DIR);
    let listing = match std::fs::read_dir(&routes_dir) {
        Ok(listing) => listing,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(targets),
        Err(e) => return Err(CodegenError::io(&routes_dir, e.to_string())),
    };
    for entry in listing {
        let entry = entry.map_err(|e| CodegenError::io(&routes_dir, e.to_string()))?;
        if !entry.path().is_dir() || !entry.path().join(COMPONENT_ENTRY).is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            targets.insert(format!("{}/{}", ROUTES_DIR, name));
        }
    }
    Ok(targets)
}

/// Queues one import walk per route, collecting results into `deps`.
pub(crate) fn spawn_dependency_walks(
    pool: &mut TaskPool,
    root: &Path,
    targets: &BTreeSet<String>,
    cache: &Arc<FsCache>,
    deps: &Arc<Mutex<DependencyMap>>,
) {
    for route in targets {
        let root = root.to_path_buf();
        let route = route.clone();
        let cache = Arc::clone(cache);
        let deps = Arc::clone(deps);
        pool.spawn(move || {
            let entry = format!("{}/{}", route, COMPONENT_ENTRY);
            let found = resolve_dependencies(&root, &entry, &cache)?;
            debug!(route = %route, deps = found.len(), "Resolved dependencies");
            deps.lock().insert(route, found);
            Ok(())
        });
    }
}

/// Writes the declaration file and, when non-empty, the runtime module.
pub(crate) fn write_directory_artifacts(
    layout: &OutputLayout,
    dir: &str,
    artifacts: &DirectoryArtifacts,
) -> Result<(), CodegenError> {
    write_file(&layout.dts_path(dir), &artifacts.dts)?;
    if !artifacts.runtime.is_empty() {
        write_file(&layout.runtime_path(dir), &artifacts.runtime)?;
    }
    Ok(())
}

/// Distinct route directories across parsed packages and analyzed routes.
pub(crate) fn count_routes<'a>(parsed_dirs: impl Iterator<Item = &'a String>, deps: &'a DependencyMap) -> usize {
    parsed_dirs
        .chain(deps.keys())
        .filter(|dir| is_route_dir(dir))
        .collect::<BTreeSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_analysis_targets() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        for rel in ["routes/about/index.tsx", "routes/blog/index.tsx", "routes/blog/widgets/index.tsx"] {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }
        fs::create_dir_all(root.join("routes/empty")).unwrap();

        let parsed = ["routes/blog/widgets", "routes/api", "shared/ui"];
        let targets = analysis_targets(root, parsed.into_iter()).unwrap();
        let targets: Vec<_> = targets.into_iter().collect();
        assert_eq!(targets, vec!["routes/about", "routes/blog", "routes/blog/widgets"]);
    }

    #[test]
    fn test_analysis_targets_without_routes_dir() {
        let dir = TempDir::new().unwrap();
        assert!(analysis_targets(dir.path(), std::iter::empty()).unwrap().is_empty());
    }

    #[test]
    fn test_count_routes_merges_sources() {
        let parsed = vec![".".to_string(), "routes/a".to_string(), "routes/b".to_string()];
        let mut deps = DependencyMap::new();
        deps.insert("routes/b".to_string(), Vec::new());
        deps.insert("routes/c".to_string(), Vec::new());
        assert_eq!(count_routes(parsed.iter(), &deps), 3);
    }
}
