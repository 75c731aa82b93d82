//! Integration tests for the Git interface.
//!
//! These tests use real git repositories created via tempfile to verify
//! that the Git interface works correctly with actual git operations.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use stablecut::core::types::BranchName;
use stablecut::git::{Git, GitError, GitState};

/// Test fixture that creates a real git repository.
struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Create a new test repository with an initial commit on main.
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");

        run_git(dir.path(), &["init", "-b", "main"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);

        std::fs::write(dir.path().join("README.md"), "# Test Repo\n").unwrap();
        run_git(dir.path(), &["add", "README.md"]);
        run_git(dir.path(), &["commit", "-m", "Initial commit"]);

        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn git(&self) -> Git {
        Git::open(self.path()).expect("failed to open test repo")
    }

    /// Create a file and commit it, returning the new HEAD.
    fn commit_file(&self, path: &str, content: &str, message: &str) -> String {
        std::fs::write(self.path().join(path), content).unwrap();
        run_git(self.path(), &["add", path]);
        run_git(self.path(), &["commit", "-m", message]);
        rev_parse(self.path(), "HEAD")
    }

    /// Clone this repository with git2 into a fresh directory.
    fn clone_into(&self, parent: &TempDir) -> (Git, PathBuf) {
        let target = parent.path().join("clone");
        let git = Git::clone_recursive(&url(self.path()), &target, &mut |_| {})
            .expect("clone failed");
        (git, target)
    }
}

fn url(path: &Path) -> String {
    path.display().to_string()
}

fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

fn rev_parse(dir: &Path, rev: &str) -> String {
    let output = Command::new("git")
        .args(["rev-parse", rev])
        .current_dir(dir)
        .output()
        .expect("git rev-parse failed");
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

fn branch(name: &str) -> BranchName {
    BranchName::new(name).unwrap()
}

// =============================================================================
// Repository Opening Tests
// =============================================================================

#[test]
fn open_valid_repository() {
    let repo = TestRepo::new();
    let git = repo.git();

    let expected = repo.path().canonicalize().unwrap();
    let actual = git.work_dir().unwrap().canonicalize().unwrap();
    assert_eq!(actual, expected);
}

#[test]
fn open_does_not_discover_enclosing_repository() {
    let repo = TestRepo::new();
    let subdir = repo.path().join("acme").join("ui");
    std::fs::create_dir_all(&subdir).unwrap();

    assert!(matches!(Git::open(&subdir), Err(GitError::NotARepo { .. })));
}

#[test]
fn open_non_repository_fails() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(Git::open(dir.path()), Err(GitError::NotARepo { .. })));
    assert!(matches!(
        Git::open(&dir.path().join("missing")),
        Err(GitError::NotARepo { .. })
    ));
}

#[test]
fn open_empty_git_dir_fails() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join(".git")).unwrap();
    assert!(Git::open(dir.path()).is_err());
}

#[test]
fn open_bare_repository_fails() {
    let dir = TempDir::new().unwrap();
    run_git(dir.path(), &["init", "--bare"]);
    assert!(matches!(Git::open(dir.path()), Err(GitError::BareRepo)));
}

#[test]
fn open_repository_with_broken_head_fails() {
    let repo = TestRepo::new();
    std::fs::write(repo.path().join(".git").join("HEAD"), "garbage\n").unwrap();
    assert!(Git::open(repo.path()).is_err());
}

// =============================================================================
// Ref Resolution Tests
// =============================================================================

#[test]
fn resolve_ref_branch() {
    let repo = TestRepo::new();
    let git = repo.git();

    let oid = git.resolve_ref("refs/heads/main").unwrap();
    assert_eq!(oid.as_str(), rev_parse(repo.path(), "main"));
}

#[test]
fn resolve_ref_not_found() {
    let repo = TestRepo::new();
    let git = repo.git();

    let result = git.resolve_ref("refs/heads/nonexistent");
    assert!(matches!(result, Err(GitError::RefNotFound { .. })));
    assert!(git.try_resolve_ref("refs/heads/nonexistent").unwrap().is_none());
    assert!(!git.ref_exists("refs/heads/nonexistent"));
}

#[test]
fn head_oid_matches_git() {
    let repo = TestRepo::new();
    let head = repo.commit_file("a.txt", "a", "Add a");
    assert_eq!(repo.git().head_oid().unwrap().as_str(), head);
}

#[test]
fn current_branch_returns_checked_out() {
    let repo = TestRepo::new();
    run_git(repo.path(), &["checkout", "-b", "release/2.x"]);
    let current = repo.git().current_branch().unwrap();
    assert_eq!(current, Some(branch("release/2.x")));
}

#[test]
fn current_branch_none_when_detached() {
    let repo = TestRepo::new();
    let head = rev_parse(repo.path(), "HEAD");
    run_git(repo.path(), &["checkout", "--detach", &head]);
    assert_eq!(repo.git().current_branch().unwrap(), None);
}

// =============================================================================
// Clone Tests
// =============================================================================

#[test]
fn clone_sets_origin_and_default_branch() {
    let upstream = TestRepo::new();
    let target = TempDir::new().unwrap();
    let (git, path) = upstream.clone_into(&target);

    assert_eq!(git.remote_url("origin").unwrap(), Some(url(upstream.path())));
    assert_eq!(git.remote_url("upstream").unwrap(), None);
    assert_eq!(git.current_branch().unwrap(), Some(branch("main")));
    assert!(git.ref_exists("refs/remotes/origin/main"));
    assert!(path.join("README.md").is_file());
}

#[test]
fn clone_of_missing_remote_fails() {
    let target = TempDir::new().unwrap();
    let result = Git::clone_recursive(
        &url(&target.path().join("no-such-upstream")),
        &target.path().join("clone"),
        &mut |_| {},
    );
    assert!(matches!(result, Err(GitError::CloneFailed { .. })));
}

#[test]
fn clone_initializes_submodules_recursively() {
    let inner = TestRepo::new();
    inner.commit_file("inner.txt", "inner", "Add inner");

    let middle = TestRepo::new();
    run_git(
        middle.path(),
        &["-c", "protocol.file.allow=always", "submodule", "add", &url(inner.path()), "inner"],
    );
    run_git(middle.path(), &["commit", "-m", "Add inner submodule"]);

    let outer = TestRepo::new();
    run_git(
        outer.path(),
        &["-c", "protocol.file.allow=always", "submodule", "add", &url(middle.path()), "middle"],
    );
    run_git(outer.path(), &["commit", "-m", "Add middle submodule"]);

    let target = TempDir::new().unwrap();
    let (_, path) = outer.clone_into(&target);

    assert!(path.join("middle").join("README.md").is_file());
    assert!(path.join("middle").join("inner").join("inner.txt").is_file());
}

// =============================================================================
// State and Worktree Tests
// =============================================================================

#[test]
fn clean_state_when_no_operation() {
    let repo = TestRepo::new();
    let git = repo.git();
    assert_eq!(git.state(), GitState::Clean);
    assert!(!git.state().is_in_progress());
}

#[test]
fn cleanup_state_clears_merge() {
    let repo = TestRepo::new();
    let head = rev_parse(repo.path(), "HEAD");
    std::fs::write(repo.path().join(".git").join("MERGE_HEAD"), format!("{head}\n")).unwrap();

    let git = repo.git();
    assert_eq!(git.state(), GitState::Merge);
    assert!(git.state().is_in_progress());

    git.cleanup_state().unwrap();
    assert_eq!(git.state(), GitState::Clean);
}

#[test]
fn worktree_status_counts_changes() {
    let repo = TestRepo::new();
    let git = repo.git();
    assert!(git.worktree_status(true).unwrap().is_clean());

    std::fs::write(repo.path().join("README.md"), "changed").unwrap();
    std::fs::write(repo.path().join("staged.txt"), "new").unwrap();
    run_git(repo.path(), &["add", "staged.txt"]);
    std::fs::write(repo.path().join("untracked.txt"), "u").unwrap();

    let status = git.worktree_status(true).unwrap();
    assert_eq!(status.staged, 1);
    assert_eq!(status.unstaged, 1);
    assert_eq!(status.untracked, 1);
    assert!(!status.is_clean());

    let status = git.worktree_status(false).unwrap();
    assert_eq!(status.untracked, 0);
}

// =============================================================================
// Branch Mutation Tests
// =============================================================================

#[test]
fn forced_checkout_discards_changes() {
    let repo = TestRepo::new();
    let main_head = rev_parse(repo.path(), "HEAD");
    run_git(repo.path(), &["checkout", "-b", "feature"]);
    repo.commit_file("feature.txt", "f", "Add feature");

    std::fs::write(repo.path().join("README.md"), "dirty").unwrap();
    std::fs::write(repo.path().join("staged.txt"), "staged").unwrap();
    run_git(repo.path(), &["add", "staged.txt"]);

    let git = repo.git();
    let oid = git.checkout_branch_forced(&branch("main")).unwrap();

    assert_eq!(oid.as_str(), main_head);
    assert_eq!(git.current_branch().unwrap(), Some(branch("main")));
    assert_eq!(
        std::fs::read_to_string(repo.path().join("README.md")).unwrap(),
        "# Test Repo\n"
    );
    assert!(!repo.path().join("feature.txt").exists());
    assert!(git.worktree_status(false).unwrap().is_clean());
}

#[test]
fn forced_checkout_of_missing_branch_fails() {
    let repo = TestRepo::new();
    let result = repo.git().checkout_branch_forced(&branch("nope"));
    assert!(matches!(result, Err(GitError::RefNotFound { .. })));
}

#[test]
fn create_tracking_branch_from_remote() {
    let upstream = TestRepo::new();
    run_git(upstream.path(), &["checkout", "-b", "release/2.x"]);
    let release = upstream.commit_file("r.txt", "r", "Release");
    run_git(upstream.path(), &["checkout", "main"]);

    let target = TempDir::new().unwrap();
    let (git, path) = upstream.clone_into(&target);
    assert!(!git.ref_exists("refs/heads/release/2.x"));

    let remote_oid = git.resolve_ref("refs/remotes/origin/release/2.x").unwrap();
    git.create_tracking_branch(&branch("release/2.x"), &remote_oid, "origin")
        .unwrap();

    assert_eq!(
        git.resolve_ref("refs/heads/release/2.x").unwrap().as_str(),
        release
    );
    assert_eq!(rev_parse(&path, "release/2.x@{upstream}"), release);

    // Creating it again is an error
    assert!(git
        .create_tracking_branch(&branch("release/2.x"), &remote_oid, "origin")
        .is_err());
}
