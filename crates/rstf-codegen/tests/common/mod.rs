#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use rstf_codegen::{ChangeEvent, Generator, GeneratorConfig};
use tempfile::TempDir;
use walkdir::WalkDir;

pub const LAYOUT_GO: &str = r#"package app

type ServerData struct {
	SiteName string `json:"siteName"`
}

func SSR() ServerData {
	return ServerData{SiteName: "blog"}
}
"#;

pub const DASHBOARD_GO: &str = r#"package dashboard

import "github.com/rafbgarcia/rstf"

type Post struct {
	Title     string
	Published bool
}

type ServerData struct {
	Message string
	Posts   []Post
}

func SSR(ctx *rstf.Context) ServerData {
	return ServerData{Message: "hi"}
}
"#;

pub const DASHBOARD_TSX: &str = r#"import { serverData } from "@rstf/routes/dashboard";
import { UserAvatar } from "../../shared/ui/user-avatar";

export function View() {
  return <UserAvatar />;
}
"#;

pub const AVATAR_GO: &str = r#"package useravatar

type ServerData struct {
	Name string `json:"name"`
}

func SSR() ServerData {
	return ServerData{Name: "ada"}
}
"#;

pub const USER_GO: &str = r#"package user

type ServerData struct {
	ID int `json:"id"`
}

func SSR() ServerData {
	return ServerData{}
}
"#;

/// A throwaway rstf project on disk.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let project = Self {
            dir: TempDir::new().unwrap(),
        };
        project.write("go.mod", "module example.com/blog\n\ngo 1.22\n");
        project
    }

    /// Layout, a dashboard with a shared component, a dynamic route and a
    /// component-only route.
    pub fn blog() -> Self {
        let project = Self::new();
        project.write("main.go", LAYOUT_GO);
        project.write("main.tsx", "export function View() { return null; }\n");
        project.write("routes/dashboard/index.go", DASHBOARD_GO);
        project.write("routes/dashboard/index.tsx", DASHBOARD_TSX);
        project.write("shared/ui/user-avatar/index.go", AVATAR_GO);
        project.write(
            "shared/ui/user-avatar/index.tsx",
            "export function UserAvatar() { return null; }\n",
        );
        project.write("routes/users.$id/index.go", USER_GO);
        project.write("routes/users.$id/index.tsx", "export function View() { return null; }\n");
        project.write("routes/about/index.tsx", "export function View() { return null; }\n");
        project
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().canonicalize().unwrap()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn write(&self, rel: &str, content: &str) -> ChangeEvent {
        let path = self.dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        ChangeEvent::classify(self.path(rel))
    }

    pub fn remove(&self, rel: &str) -> ChangeEvent {
        fs::remove_file(self.dir.path().join(rel)).unwrap();
        ChangeEvent::classify(self.path(rel))
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).unwrap()
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    pub fn config(&self) -> GeneratorConfig {
        GeneratorConfig {
            workers: Some(4),
            resolve_host_deps: false,
            ..GeneratorConfig::new(self.root())
        }
    }

    pub fn generator(&self) -> Generator {
        Generator::new(self.config()).unwrap()
    }

    /// Every file under `.rstf/` with its content, following no symlinks.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        let rstf = self.path(".rstf");
        let mut files: Vec<(String, String)> = WalkDir::new(&rstf)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| {
                let rel = entry.path().strip_prefix(&rstf).unwrap();
                let rel = rel.to_string_lossy().replace('\\', "/");
                (rel, fs::read_to_string(entry.path()).unwrap())
            })
            .collect();
        files.sort();
        files
    }
}
