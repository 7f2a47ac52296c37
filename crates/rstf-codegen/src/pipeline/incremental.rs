//! Incremental regeneration after a batch of file changes.
//!
//! Every new artifact and the whole next [`GeneratorState`] are computed
//! before anything touches disk. A failure while computing leaves both the
//! output tree and the generator untouched.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::output::{remove_file, write_file, OutputLayout};
use super::scheduler::TaskPool;
use super::{analysis_targets, count_routes, spawn_dependency_walks, GenerateResult, Generator, GeneratorState};
use crate::codegen::{self, DirectoryArtifacts};
use crate::conventions::{has_dynamic_segment, is_route_dir, relative_dir, IGNORED_DIRS, ROOT_DIR};
use crate::diagnostic::CodegenError;
use crate::frontend::go::{self, GoFrontend};
use crate::frontend::Frontend;
use crate::ir::DependencyMap;

/// What kind of source a changed file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChangeKind {
    /// Go handler source.
    Go,
    /// TSX component source.
    Tsx,
    /// Anything else; only invalidates cached reads.
    Other,
}

impl ChangeKind {
    pub fn from_path(path: &Path) -> Self {
        if go::is_source_file(path) {
            return ChangeKind::Go;
        }
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("tsx") => ChangeKind::Tsx,
            _ => ChangeKind::Other,
        }
    }
}

/// One changed file, as reported by a watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Classifies the path by extension.
    pub fn classify(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = ChangeKind::from_path(&path);
        Self { path, kind }
    }
}

/// Outcome of [`Generator::regenerate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegenerateResult {
    #[serde(flatten)]
    pub result: GenerateResult,
    /// Whether `server_gen.go` was rewritten.
    pub server_changed: bool,
    /// Routes whose hydration entry was rewritten.
    pub changed_entries: Vec<String>,
}

/// A pending filesystem mutation.
#[derive(Debug)]
enum Op {
    Write(PathBuf, String),
    Remove(PathBuf),
    Link(String),
    Unlink(String),
}

impl Op {
    fn apply(&self, layout: &OutputLayout) -> Result<(), CodegenError> {
        match self {
            Op::Write(path, content) => write_file(path, content),
            Op::Remove(path) => remove_file(path),
            Op::Link(dir) => layout.link_dynamic_dir(dir),
            Op::Unlink(dir) => layout.unlink_dynamic_dir(dir),
        }
    }
}

impl Generator {
    /// Brings `.rstf/` up to date with a batch of changes.
    ///
    /// Changed Go directories are re-parsed; every route's imports are walked
    /// again through the warm cache; only artifacts whose text differs from
    /// the previous run are written.
    #[tracing::instrument(skip_all, fields(events = events.len()))]
    pub async fn regenerate(&mut self, events: &[ChangeEvent]) -> Result<RegenerateResult, CodegenError> {
        let mut changed_dirs = self.changed_go_dirs(events);
        changed_dirs.extend(self.state.stale_dirs.iter().cloned());
        let paths: Vec<PathBuf> = events.iter().filter_map(|e| self.project_path(&e.path)).collect();
        self.cache.invalidate(&paths);

        let mut next = GeneratorState {
            files: self.state.files.clone(),
            artifacts: self.state.artifacts.clone(),
            ..GeneratorState::default()
        };
        let mut ops = Vec::new();

        let mut frontend = GoFrontend::new()?;
        for dir in &changed_dirs {
            match frontend.parse_single_dir(&self.root, &self.root.join(dir))? {
                Some(route_file) => {
                    let generated = DirectoryArtifacts::generate(&route_file);
                    let previous = next.artifacts.get(dir).filter(|_| !self.state.stale_dirs.contains(dir));
                    if previous.map_or(true, |p| p.dts != generated.dts) {
                        ops.push(Op::Write(self.layout.dts_path(dir), generated.dts.clone()));
                    }
                    if previous.map_or(true, |p| p.runtime != generated.runtime) {
                        if generated.runtime.is_empty() {
                            ops.push(Op::Remove(self.layout.runtime_path(dir)));
                        } else {
                            ops.push(Op::Write(self.layout.runtime_path(dir), generated.runtime.clone()));
                        }
                    }
                    if has_dynamic_segment(dir) {
                        ops.push(Op::Link(dir.clone()));
                    }
                    next.artifacts.insert(dir.clone(), generated);
                    next.files.insert(dir.clone(), route_file);
                }
                None => {
                    if next.artifacts.remove(dir).is_some() || self.state.stale_dirs.contains(dir) {
                        ops.push(Op::Remove(self.layout.dts_path(dir)));
                        ops.push(Op::Remove(self.layout.runtime_path(dir)));
                    }
                    if has_dynamic_segment(dir) {
                        ops.push(Op::Unlink(dir.clone()));
                    }
                    next.files.remove(dir);
                }
            }
        }

        let targets = analysis_targets(&self.root, next.files.keys().map(String::as_str))?;
        let deps = Arc::new(Mutex::new(DependencyMap::new()));
        let mut pool = TaskPool::new(self.config.worker_count());
        spawn_dependency_walks(&mut pool, &self.root, &targets, &self.cache, &deps);
        pool.join().await?;
        next.deps = std::mem::take(&mut *deps.lock());

        let mut changed_entries = Vec::new();
        for (route, route_deps) in next.deps.iter().filter(|(route, _)| is_route_dir(route)) {
            let recorded = self.state.entries.get(route);
            let unchanged = self.state.deps.get(route) == Some(route_deps);
            match recorded {
                Some(path) if unchanged => {
                    next.entries.insert(route.clone(), path.clone());
                }
                _ => {
                    let path = self.layout.entry_path(route);
                    let content = codegen::generate_hydration_entry(route, route_deps);
                    ops.push(Op::Write(path.clone(), content));
                    next.entries.insert(route.clone(), path);
                    changed_entries.push(route.clone());
                }
            }
        }
        let mut removed_entries = Vec::new();
        for (route, path) in &self.state.entries {
            if !next.entries.contains_key(route) {
                ops.push(Op::Remove(path.clone()));
                removed_entries.push(route.clone());
            }
        }

        let files: Vec<_> = next.files.values().cloned().collect();
        let server_code =
            codegen::generate_server(&self.module_path, &self.config.framework_module, &files, &next.deps)?;
        let server_changed = self.state.server_code.as_deref() != Some(server_code.as_str());
        if server_changed {
            ops.push(Op::Write(self.layout.server_path(), server_code.clone()));
        }
        next.server_code = Some(server_code);

        debug!(ops = ops.len(), "Applying changes");
        for op in &ops {
            if let Err(e) = op.apply(&self.layout) {
                warn!(error = %e, "Regeneration applied partially; touched outputs marked stale");
                self.mark_stale(&changed_dirs, changed_entries.iter().chain(&removed_entries), server_changed);
                return Err(e);
            }
        }

        let result = RegenerateResult {
            result: GenerateResult {
                route_count: count_routes(next.files.keys(), &next.deps),
                entries: next.entries.clone(),
            },
            server_changed,
            changed_entries,
        };
        info!(
            dirs = changed_dirs.len(),
            entries = result.changed_entries.len(),
            server_changed,
            "Regenerated project"
        );

        self.state = next;
        Ok(result)
    }

    /// Forgets the snapshots of everything a partially applied batch may
    /// have touched, so the next run rewrites it whatever the content.
    fn mark_stale<'a>(
        &mut self,
        dirs: &BTreeSet<String>,
        routes: impl Iterator<Item = &'a String>,
        server_touched: bool,
    ) {
        self.state.stale_dirs.extend(dirs.iter().cloned());
        for route in routes {
            self.state.deps.remove(route);
        }
        if server_touched {
            self.state.server_code = None;
        }
    }

    /// Project-relative directories holding a changed Go file. Events outside
    /// the project or inside pruned directories are dropped.
    fn changed_go_dirs(&self, events: &[ChangeEvent]) -> BTreeSet<String> {
        let mut dirs = BTreeSet::new();
        for event in events.iter().filter(|e| e.kind == ChangeKind::Go) {
            let Some(parent) = event.path.parent() else {
                continue;
            };
            let Some(dir) = self.project_dir(parent) else {
                warn!(path = %event.path.display(), "Ignoring change outside the project");
                continue;
            };
            if is_pruned(&dir) {
                debug!(path = %event.path.display(), "Ignoring change in pruned directory");
                continue;
            }
            dirs.insert(dir);
        }
        dirs
    }

    /// The event path spelled through the canonical root, the form cache
    /// keys use. `None` for paths outside the project.
    fn project_path(&self, path: &Path) -> Option<PathBuf> {
        let name = path.file_name()?;
        let dir = self.project_dir(path.parent()?)?;
        let dir = if dir == ROOT_DIR { self.root.clone() } else { self.root.join(dir) };
        Some(dir.join(name))
    }

    /// Project-relative form of `dir`. Relative paths are taken from the root.
    fn project_dir(&self, dir: &Path) -> Option<String> {
        let absolute;
        let dir = if dir.is_relative() {
            absolute = self.root.join(dir);
            absolute.as_path()
        } else {
            dir
        };
        if dir.starts_with(&self.root) {
            return Some(relative_dir(&self.root, dir));
        }
        // The watcher may report paths through a different spelling of the
        // root (a symlinked temp dir, say); the directory itself may be gone.
        let mut existing = dir;
        let mut suffix = Vec::new();
        loop {
            if let Ok(canonical) = existing.canonicalize() {
                let mut full = canonical;
                full.extend(suffix.iter().rev());
                return full.starts_with(&self.root).then(|| relative_dir(&self.root, &full));
            }
            suffix.push(existing.file_name()?.to_os_string());
            existing = existing.parent()?;
        }
    }
}

fn is_pruned(dir: &str) -> bool {
    Path::new(dir).components().any(|c| match c {
        Component::Normal(name) => name.to_str().map_or(false, |n| IGNORED_DIRS.contains(&n)),
        _ => false,
    })
}
