//! Host project manifest and build-system integration.

use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info};

use crate::diagnostic::CodegenError;

/// Go module manifest file name.
pub const MANIFEST: &str = "go.mod";

/// Go checksum file recording resolved dependencies.
pub const CHECKSUMS: &str = "go.sum";

/// Extracts the `module` directive from go.mod content.
pub fn parse_module_path(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or("").trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let path = rest.trim().trim_matches('"');
        (!path.is_empty()).then(|| path.to_string())
    })
}

/// Reads the module identifier from `<root>/go.mod`.
pub fn read_module_path(project_root: &Path) -> Result<String, CodegenError> {
    let path = project_root.join(MANIFEST);
    let content = std::fs::read_to_string(&path).map_err(|e| CodegenError::Manifest {
        path: path.clone(),
        message: e.to_string(),
    })?;
    parse_module_path(&content).ok_or_else(|| CodegenError::Manifest {
        path,
        message: "no module directive".to_string(),
    })
}

/// Whether `go get` has to run for the framework packages the generated
/// server imports.
///
/// The server entry lives under a dot-directory that `go mod tidy` never
/// sees, so its transitive requirements must be fetched explicitly unless
/// the project is the framework itself or go.sum already records it.
pub fn needs_host_dependencies(project_root: &Path, module_path: &str, framework_module: &str) -> bool {
    if module_path == framework_module {
        return false;
    }
    match std::fs::read_to_string(project_root.join(CHECKSUMS)) {
        Ok(sums) => !sums.contains(&format!("{} ", framework_module)),
        Err(_) => true,
    }
}

/// Runs `go get <framework>/renderer <framework>/router` in the project root
/// when needed.
#[tracing::instrument(skip_all, fields(module = %module_path))]
pub async fn ensure_host_dependencies(
    project_root: &Path,
    module_path: &str,
    framework_module: &str,
) -> Result<(), CodegenError> {
    if !needs_host_dependencies(project_root, module_path, framework_module) {
        debug!("Framework dependencies already resolved");
        return Ok(());
    }

    info!("Resolving framework dependencies");
    let output = Command::new("go")
        .arg("get")
        .arg(format!("{}/renderer", framework_module))
        .arg(format!("{}/router", framework_module))
        .current_dir(project_root)
        .output()
        .await
        .map_err(|e| CodegenError::HostDependencies {
            message: format!("failed to run go: {}", e),
        })?;

    if !output.status.success() {
        return Err(CodegenError::HostDependencies {
            message: format!(
                "go get exited with {}\n{}{}",
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const FRAMEWORK: &str = "github.com/rafbgarcia/rstf";

    #[test]
    fn test_parse_module_path() {
        assert_eq!(
            parse_module_path("module github.com/acme/blog\n\ngo 1.22\n"),
            Some("github.com/acme/blog".to_string())
        );
        assert_eq!(
            parse_module_path("// header\nmodule \"example.com/x\" // quoted\n"),
            Some("example.com/x".to_string())
        );
        assert_eq!(parse_module_path("go 1.22\n"), None);
        assert_eq!(parse_module_path("modules foo\n"), None);
        assert_eq!(parse_module_path("module\n"), None);
    }

    #[test]
    fn test_read_module_path_errors() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(read_module_path(dir.path()), Err(CodegenError::Manifest { .. })));

        fs::write(dir.path().join(MANIFEST), "go 1.22\n").unwrap();
        assert!(matches!(read_module_path(dir.path()), Err(CodegenError::Manifest { .. })));

        fs::write(dir.path().join(MANIFEST), "module example.com/app\n").unwrap();
        assert_eq!(read_module_path(dir.path()).unwrap(), "example.com/app");
    }

    #[test]
    fn test_host_dependency_skips() {
        let dir = TempDir::new().unwrap();
        assert!(!needs_host_dependencies(dir.path(), FRAMEWORK, FRAMEWORK));
        assert!(needs_host_dependencies(dir.path(), "example.com/app", FRAMEWORK));

        fs::write(
            dir.path().join(CHECKSUMS),
            format!("{} v0.1.0 h1:abc=\n", FRAMEWORK),
        )
        .unwrap();
        assert!(!needs_host_dependencies(dir.path(), "example.com/app", FRAMEWORK));
    }
}
