//! Binary-level tests for the `rsq` CLI.

use std::path::Path;
use std::process::Command as ProcessCommand;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn rsq() -> Command {
    let mut cmd = Command::cargo_bin("rsq").expect("binary built");
    cmd.env("RSQ_EDITOR", "true").env("GIT_EDITOR", "true");
    cmd
}

fn git_ok(dir: &Path, args: &[&str]) {
    let out = ProcessCommand::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("run git");
    assert!(
        out.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
}

fn init_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    git_ok(dir.path(), &["init", "-b", "main"]);
    git_ok(dir.path(), &["config", "user.email", "test@example.com"]);
    git_ok(dir.path(), &["config", "user.name", "Test User"]);
    std::fs::write(dir.path().join("base.txt"), "base\n").unwrap();
    git_ok(dir.path(), &["add", "base.txt"]);
    git_ok(dir.path(), &["commit", "-m", "base commit"]);
    dir
}

fn commit_file(dir: &Path, name: &str, content: &str, message: &str) {
    std::fs::write(dir.join(name), content).unwrap();
    git_ok(dir, &["add", name]);
    git_ok(dir, &["commit", "-m", message]);
}

fn rev_parse(dir: &Path, spec: &str) -> String {
    let out = ProcessCommand::new("git")
        .args(["rev-parse", spec])
        .current_dir(dir)
        .output()
        .unwrap();
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}

#[test]
fn status_outside_a_repository_fails() {
    let dir = TempDir::new().unwrap();
    rsq()
        .args(["--cwd"])
        .arg(dir.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn status_without_rebase_reports_idle() {
    let repo = init_repo();
    rsq()
        .arg("--cwd")
        .arg(repo.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No rebase in progress."));
}

#[test]
fn abort_without_rebase_fails() {
    let repo = init_repo();
    rsq()
        .arg("--cwd")
        .arg(repo.path())
        .arg("abort")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no rebase in progress"));
}

#[test]
fn continue_without_rebase_fails() {
    let repo = init_repo();
    rsq()
        .arg("--cwd")
        .arg(repo.path())
        .arg("continue")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no rebase in progress"));
}

#[test]
fn completion_generates_a_script() {
    rsq()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rsq"));
}

#[test]
fn start_fast_forward_run_succeeds() {
    let repo = init_repo();
    let base = rev_parse(repo.path(), "HEAD");
    commit_file(repo.path(), "b.txt", "b\n", "commit B");
    commit_file(repo.path(), "c.txt", "c\n", "commit C");
    let tip = rev_parse(repo.path(), "HEAD");

    rsq()
        .arg("--cwd")
        .arg(repo.path())
        .args(["start", &base])
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully rebased"));

    // A plain unedited program leaves the tip alone.
    assert_eq!(rev_parse(repo.path(), "HEAD"), tip);
    assert!(!repo.path().join(".git/rebase-merge").exists());
}

#[test]
fn start_pauses_on_edit_and_status_reports_it() {
    let repo = init_repo();
    let base = rev_parse(repo.path(), "HEAD");
    commit_file(repo.path(), "b.txt", "b\n", "commit B");

    // An editor that turns the pick into an edit.
    let editor = repo.path().join("make-edit.sh");
    std::fs::write(
        &editor,
        "#!/bin/sh\nsed -i -e 's/^pick /edit /' \"$1\"\n",
    )
    .unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        std::fs::set_permissions(&editor, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    let mut cmd = Command::cargo_bin("rsq").unwrap();
    cmd.env("RSQ_EDITOR", editor.display().to_string())
        .env("GIT_EDITOR", "true")
        .arg("--cwd")
        .arg(repo.path())
        .args(["start", "--force-rebase", &base])
        .assert()
        .success()
        .stderr(predicate::str::contains("Stopped at"));

    assert!(repo.path().join(".git/rebase-merge").exists());

    rsq()
        .arg("--cwd")
        .arg(repo.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Stopped at"));

    rsq()
        .arg("--cwd")
        .arg(repo.path())
        .arg("continue")
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully rebased"));
    assert!(!repo.path().join(".git/rebase-merge").exists());
}

#[test]
fn conflicting_start_exits_one_and_abort_cleans_up() {
    let repo = init_repo();
    git_ok(repo.path(), &["checkout", "-q", "-b", "topic"]);
    commit_file(repo.path(), "base.txt", "topic version\n", "topic change");
    git_ok(repo.path(), &["checkout", "-q", "main"]);
    commit_file(repo.path(), "base.txt", "main version\n", "main change");
    git_ok(repo.path(), &["checkout", "-q", "topic"]);

    rsq()
        .arg("--cwd")
        .arg(repo.path())
        .args(["start", "main"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("rsq continue"));

    rsq()
        .arg("--cwd")
        .arg(repo.path())
        .arg("abort")
        .assert()
        .success();
    assert!(!repo.path().join(".git/rebase-merge").exists());
}
