//! End-to-end tests for the stablecut binary.
//!
//! Every case here fails before any network access is attempted, so the
//! tests run offline. A work root and an empty config file are created per
//! test to keep the caller's environment out of the picture.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CATALOG: &str = r#"[
    {
        "name": "doc-style",
        "git_organization": "acme",
        "release": {
            "branch": "main",
            "current_snapshot_version": "2.1.0-SNAPSHOT"
        }
    }
]"#;

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        fs::write(dir.path().join("config.toml"), "").unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn work_root(&self) -> PathBuf {
        self.path().join("work")
    }

    fn write_catalog(&self, contents: &str) -> PathBuf {
        let path = self.path().join("catalog.json");
        fs::write(&path, contents).unwrap();
        path
    }

    /// The binary with the work root and config pinned to this sandbox.
    fn stablecut(&self) -> Command {
        let mut cmd = Command::cargo_bin("stablecut").unwrap();
        cmd.env("WORK_DIR", self.work_root())
            .env_remove("STABLECUT_GIT_HOST")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.path().join("config.toml"));
        cmd
    }
}

#[test]
fn help_flag_works() {
    Command::cargo_bin("stablecut")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("comma separated"));
}

#[test]
fn missing_arguments_are_a_usage_error() {
    Command::cargo_bin("stablecut")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn missing_catalog_fails() {
    let sandbox = Sandbox::new();

    sandbox
        .stablecut()
        .arg(sandbox.path().join("absent.json"))
        .arg("doc-style")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"))
        .stderr(predicate::str::contains("absent.json"));

    assert!(!sandbox.work_root().exists());
}

#[test]
fn malformed_catalog_fails() {
    let sandbox = Sandbox::new();
    let catalog = sandbox.write_catalog(r#"{"name": "doc-style"}"#);

    sandbox
        .stablecut()
        .arg(&catalog)
        .arg("doc-style")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: malformed catalog"));

    assert!(!sandbox.work_root().exists());
}

#[test]
fn unknown_project_fails_without_creating_directories() {
    let sandbox = Sandbox::new();
    let catalog = sandbox.write_catalog(CATALOG);

    sandbox
        .stablecut()
        .arg(&catalog)
        .arg("nonexistent")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "error: no project nonexistent found in the catalog",
        ));

    assert!(!sandbox.work_root().exists());
}

#[test]
fn empty_project_list_fails() {
    let sandbox = Sandbox::new();
    let catalog = sandbox.write_catalog(CATALOG);

    sandbox
        .stablecut()
        .arg(&catalog)
        .arg(" , ")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no project names given"));
}

#[test]
fn invalid_config_fails() {
    let sandbox = Sandbox::new();
    let catalog = sandbox.write_catalog(CATALOG);
    fs::write(sandbox.path().join("config.toml"), "[clone]\nattempts = 0\n").unwrap();

    sandbox
        .stablecut()
        .arg(&catalog)
        .arg("doc-style")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: invalid config value"));
}

#[test]
fn invalid_git_host_flag_fails() {
    let sandbox = Sandbox::new();
    let catalog = sandbox.write_catalog(CATALOG);

    sandbox
        .stablecut()
        .arg(&catalog)
        .arg("doc-style")
        .arg("--git-host")
        .arg("git@github.com:")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));

    assert!(!sandbox.work_root().join("acme").exists());
}

#[test]
fn catalog_name_outside_the_work_root_is_rejected() {
    let sandbox = Sandbox::new();
    let catalog = sandbox.write_catalog(
        r#"[{"name": "..", "git_organization": "acme", "release": {"branch": "main"}}]"#,
    );

    sandbox
        .stablecut()
        .arg(&catalog)
        .arg("..")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "error: project ..: invalid project name '..': must not be '.' or '..'",
        ));

    assert!(!sandbox.work_root().exists());
}
