//! The `.rstf/` output tree and the filesystem operations that populate it.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::conventions::{
    dts_file_name, entry_file_name, runtime_module_path, sanitized_dir, OUTPUT_DIR, SERVER_ENTRY,
};
use crate::diagnostic::CodegenError;

/// Paths of every generated artifact for one project.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    project_root: PathBuf,
    rstf_dir: PathBuf,
}

impl OutputLayout {
    pub fn new(project_root: &Path) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            rstf_dir: project_root.join(OUTPUT_DIR),
        }
    }

    pub fn rstf_dir(&self) -> &Path {
        &self.rstf_dir
    }

    pub fn types_dir(&self) -> PathBuf {
        self.rstf_dir.join("types")
    }

    pub fn generated_dir(&self) -> PathBuf {
        self.rstf_dir.join("generated")
    }

    pub fn entries_dir(&self) -> PathBuf {
        self.rstf_dir.join("entries")
    }

    pub fn pkgs_dir(&self) -> PathBuf {
        self.rstf_dir.join("pkgs")
    }

    pub fn server_path(&self) -> PathBuf {
        self.rstf_dir.join(SERVER_ENTRY)
    }

    pub fn dts_path(&self, dir: &str) -> PathBuf {
        self.types_dir().join(dts_file_name(dir))
    }

    pub fn runtime_path(&self, dir: &str) -> PathBuf {
        self.generated_dir().join(runtime_module_path(dir))
    }

    pub fn entry_path(&self, dir: &str) -> PathBuf {
        self.entries_dir().join(entry_file_name(dir))
    }

    /// Location of the importable alias for a dynamic-segment directory.
    pub fn link_path(&self, dir: &str) -> PathBuf {
        self.pkgs_dir().join(sanitized_dir(dir))
    }

    /// Removes the whole output tree.
    pub fn clean(&self) -> Result<(), CodegenError> {
        match std::fs::remove_dir_all(&self.rstf_dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CodegenError::write(&self.rstf_dir, e.to_string())),
        }
    }

    /// Creates the directories parallel writers rely on.
    pub fn create_skeleton(&self) -> Result<(), CodegenError> {
        for dir in [self.types_dir(), self.generated_dir(), self.entries_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| CodegenError::write(&dir, e.to_string()))?;
        }
        Ok(())
    }

    /// Points `.rstf/pkgs/<dir without $>` at the source directory, replacing
    /// any previous link.
    pub fn link_dynamic_dir(&self, dir: &str) -> Result<(), CodegenError> {
        let link = self.link_path(dir);
        if let Some(parent) = link.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CodegenError::write(parent, e.to_string()))?;
        }
        remove_link(&link)?;
        symlink_dir(&self.project_root.join(dir), &link)
            .map_err(|e| CodegenError::write(&link, e.to_string()))?;
        debug!(dir = %dir, link = %link.display(), "Linked dynamic segment directory");
        Ok(())
    }

    /// Removes the link for a dynamic-segment directory if present.
    pub fn unlink_dynamic_dir(&self, dir: &str) -> Result<(), CodegenError> {
        remove_link(&self.link_path(dir))
    }
}

/// Writes `content` to `path`, creating parent directories.
pub fn write_file(path: &Path, content: &str) -> Result<(), CodegenError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CodegenError::write(parent, e.to_string()))?;
    }
    std::fs::write(path, content).map_err(|e| CodegenError::write(path, e.to_string()))?;
    debug!(path = %path.display(), bytes = content.len(), "Wrote artifact");
    Ok(())
}

/// Removes a file; a missing file is not an error.
pub fn remove_file(path: &Path) -> Result<(), CodegenError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Removed stale artifact");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CodegenError::write(path, e.to_string())),
    }
}

fn remove_link(link: &Path) -> Result<(), CodegenError> {
    if std::fs::symlink_metadata(link).is_err() {
        return Ok(());
    }
    #[cfg(windows)]
    {
        if std::fs::remove_dir(link).is_ok() {
            return Ok(());
        }
    }
    std::fs::remove_file(link).map_err(|e| CodegenError::write(link, e.to_string()))
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_artifact_paths() {
        let layout = OutputLayout::new(Path::new("/srv/app"));
        assert_eq!(layout.dts_path("."), PathBuf::from("/srv/app/.rstf/types/main.d.ts"));
        assert_eq!(
            layout.runtime_path("routes/dashboard"),
            PathBuf::from("/srv/app/.rstf/generated/routes/dashboard.ts")
        );
        assert_eq!(
            layout.entry_path("routes/users.$id"),
            PathBuf::from("/srv/app/.rstf/entries/users-id.entry.tsx")
        );
        assert_eq!(
            layout.link_path("routes/users.$id"),
            PathBuf::from("/srv/app/.rstf/pkgs/routes/users.id")
        );
        assert_eq!(layout.server_path(), PathBuf::from("/srv/app/.rstf/server_gen.go"));
    }

    #[test]
    fn test_clean_and_skeleton() {
        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path());
        layout.clean().unwrap();

        layout.create_skeleton().unwrap();
        write_file(&layout.dts_path("."), "x").unwrap();
        assert!(layout.types_dir().is_dir());

        layout.clean().unwrap();
        assert!(!layout.rstf_dir().exists());
    }

    #[test]
    fn test_remove_missing_file_is_ok() {
        let dir = TempDir::new().unwrap();
        remove_file(&dir.path().join("gone.ts")).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_dynamic_dir_links() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("routes/users.$id");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("index.go"), "package user\n").unwrap();

        let layout = OutputLayout::new(dir.path());
        layout.link_dynamic_dir("routes/users.$id").unwrap();
        layout.link_dynamic_dir("routes/users.$id").unwrap();

        let link = layout.link_path("routes/users.$id");
        assert!(link.join("index.go").is_file());

        layout.unlink_dynamic_dir("routes/users.$id").unwrap();
        assert!(std::fs::symlink_metadata(&link).is_err());
    }
}
