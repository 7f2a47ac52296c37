//! File conventions that map the project's directory structure to routes and
//! to generated artifact paths.
//!
//! Directories are always project-relative with `/` separators; `.` is the
//! root layout.

use std::path::Path;

/// Directory name of the root layout.
pub const ROOT_DIR: &str = ".";

/// Component-path key of the root layout.
pub const LAYOUT_COMPONENT: &str = "main";

/// Framework output directory, relative to the project root.
pub const OUTPUT_DIR: &str = ".rstf";

/// Directory holding route folders.
pub const ROUTES_DIR: &str = "routes";

/// Canonical component entry file of a directory.
pub const COMPONENT_ENTRY: &str = "index.tsx";

/// Generated server entry point, relative to [`OUTPUT_DIR`].
pub const SERVER_ENTRY: &str = "server_gen.go";

/// Directories the source walk never descends into.
pub const IGNORED_DIRS: &[&str] = &[OUTPUT_DIR, ".git", "node_modules", "vendor"];

/// Project-relative directory of `dir` with `/` separators; `.` for the root.
pub fn relative_dir(root: &Path, dir: &Path) -> String {
    let rel = pathdiff::diff_paths(dir, root).unwrap_or_else(|| dir.to_path_buf());
    let rel = rel.to_string_lossy().replace('\\', "/");
    if rel.is_empty() || rel == ROOT_DIR {
        ROOT_DIR.to_string()
    } else {
        rel.trim_start_matches("./").to_string()
    }
}

/// Converts a route folder name to a Go 1.22+ ServeMux URL pattern.
///
/// ```text
/// "index"           -> "/"
/// "dashboard"       -> "/dashboard"
/// "users.$id"       -> "/users/{id}"
/// "users.$id.edit"  -> "/users/{id}/edit"
/// ```
pub fn folder_to_url_pattern(folder: &str) -> String {
    if folder == "index" {
        return "/".to_string();
    }

    let segments: Vec<String> = folder
        .split('.')
        .map(|seg| match seg.strip_prefix('$') {
            Some(param) => format!("{{{}}}", param),
            None => seg.to_string(),
        })
        .collect();
    format!("/{}", segments.join("/"))
}

/// Reports whether a project-relative path is inside `routes/`.
pub fn is_route_dir(dir: &str) -> bool {
    dir == ROUTES_DIR || dir.starts_with("routes/")
}

/// Route folder name: the directory with the leading `routes/` removed.
pub fn route_folder(dir: &str) -> &str {
    dir.strip_prefix("routes/").unwrap_or(dir)
}

/// Whether the directory contains a dynamic segment marker.
pub fn has_dynamic_segment(dir: &str) -> bool {
    dir != ROOT_DIR && dir.contains('$')
}

/// Directory path with dynamic-segment markers removed, as used for the
/// symlinks under `.rstf/pkgs/`.
pub fn sanitized_dir(dir: &str) -> String {
    dir.replace('$', "")
}

/// Flattened artifact stem shared by declaration and entry files.
///
/// ```text
/// "."                      -> "main"
/// "routes/dashboard"       -> "dashboard"
/// "routes/users.$id.edit"  -> "users-id-edit"
/// "shared/ui/user-avatar"  -> "shared-ui-user-avatar"
/// ```
pub fn artifact_stem(dir: &str) -> String {
    if dir == ROOT_DIR {
        return LAYOUT_COMPONENT.to_string();
    }
    route_folder(dir).replace('$', "").replace(['.', '/'], "-")
}

/// Declaration file name under `.rstf/types/`.
pub fn dts_file_name(dir: &str) -> String {
    format!("{}.d.ts", artifact_stem(dir))
}

/// Hydration entry file name under `.rstf/entries/`.
pub fn entry_file_name(dir: &str) -> String {
    format!("{}.entry.tsx", artifact_stem(dir))
}

/// Runtime module path under `.rstf/generated/`.
///
/// ```text
/// "."                      -> "main.ts"
/// "routes/dashboard"       -> "routes/dashboard.ts"
/// ```
pub fn runtime_module_path(dir: &str) -> String {
    if dir == ROOT_DIR {
        return format!("{}.ts", LAYOUT_COMPONENT);
    }
    format!("{}.ts", dir)
}

/// Key used in `window.__RSTF_SERVER_DATA__` and in the server data map.
pub fn component_path(dir: &str) -> &str {
    if dir == ROOT_DIR {
        LAYOUT_COMPONENT
    } else {
        dir
    }
}

/// URL of the client bundle built from a route's hydration entry.
pub fn bundle_path(dir: &str) -> String {
    format!("/{}/static/{}/bundle.js", OUTPUT_DIR, artifact_stem(dir))
}

/// Declaration namespace for a directory: `Main` for the root, otherwise each
/// alphanumeric run capitalized and concatenated.
///
/// ```text
/// "routes/dashboard"       -> "RoutesDashboard"
/// "routes/users.$id.edit"  -> "RoutesUsersIdEdit"
/// "shared/ui/user-avatar"  -> "SharedUiUserAvatar"
/// ```
pub fn namespace(dir: &str) -> String {
    if dir == ROOT_DIR {
        return "Main".to_string();
    }
    dir.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(uc_first)
        .collect()
}

/// Uppercases the first character.
pub fn uc_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Lowercases the first character.
pub fn lc_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().chain(chars).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_to_url_pattern() {
        assert_eq!(folder_to_url_pattern("index"), "/");
        assert_eq!(folder_to_url_pattern("dashboard"), "/dashboard");
        assert_eq!(folder_to_url_pattern("users.$id"), "/users/{id}");
        assert_eq!(folder_to_url_pattern("users.$id.edit"), "/users/{id}/edit");
        assert_eq!(folder_to_url_pattern("$slug"), "/{slug}");
    }

    #[test]
    fn test_is_route_dir() {
        assert!(is_route_dir("routes"));
        assert!(is_route_dir("routes/dashboard"));
        assert!(!is_route_dir("."));
        assert!(!is_route_dir("shared/ui"));
        assert!(!is_route_dir("routesx/foo"));
    }

    #[test]
    fn test_artifact_names() {
        assert_eq!(dts_file_name("."), "main.d.ts");
        assert_eq!(dts_file_name("routes/dashboard"), "dashboard.d.ts");
        assert_eq!(dts_file_name("routes/users.$id.edit"), "users-id-edit.d.ts");
        assert_eq!(dts_file_name("shared/ui/user-avatar"), "shared-ui-user-avatar.d.ts");
        assert_eq!(entry_file_name("routes/dashboard"), "dashboard.entry.tsx");
        assert_eq!(runtime_module_path("."), "main.ts");
        assert_eq!(runtime_module_path("routes/dashboard"), "routes/dashboard.ts");
        assert_eq!(component_path("."), "main");
        assert_eq!(component_path("shared/ui/user-avatar"), "shared/ui/user-avatar");
        assert_eq!(bundle_path("routes/dashboard"), "/.rstf/static/dashboard/bundle.js");
    }

    #[test]
    fn test_namespace() {
        assert_eq!(namespace("."), "Main");
        assert_eq!(namespace("dashboard"), "Dashboard");
        assert_eq!(namespace("routes/dashboard"), "RoutesDashboard");
        assert_eq!(namespace("routes/users.$id.edit"), "RoutesUsersIdEdit");
        assert_eq!(namespace("shared/ui/user-avatar"), "SharedUiUserAvatar");
    }

    #[test]
    fn test_dynamic_segments() {
        assert!(has_dynamic_segment("routes/users.$id"));
        assert!(!has_dynamic_segment("routes/users"));
        assert_eq!(sanitized_dir("routes/users.$id"), "routes/users.id");
    }

    #[test]
    fn test_relative_dir() {
        let root = Path::new("/srv/app");
        assert_eq!(relative_dir(root, Path::new("/srv/app")), ".");
        assert_eq!(relative_dir(root, Path::new("/srv/app/routes/dashboard")), "routes/dashboard");
    }

    #[test]
    fn test_case_helpers() {
        assert_eq!(uc_first("posts"), "Posts");
        assert_eq!(lc_first("Posts"), "posts");
        assert_eq!(lc_first("URL"), "uRL");
        assert_eq!(lc_first(""), "");
    }
}
