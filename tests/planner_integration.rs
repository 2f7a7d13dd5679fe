//! Integration tests for todo planning against real repositories.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use resequencer::core::types::Oid;
use resequencer::engine::merges::generate_merge_todo;
use resequencer::engine::plan::{generate_todo, skip_unnecessary_picks};
use resequencer::git::Git;
use resequencer::state::{RebaseOptions, StateStore};
use resequencer::todo::{Opcode, TodoList};

struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let repo = Self { dir };
        repo.git_ok(&["init", "-b", "main"]);
        repo.git_ok(&["config", "user.email", "test@example.com"]);
        repo.git_ok(&["config", "user.name", "Test User"]);
        repo.commit_file("base.txt", "base\n", "base commit");
        repo
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn git_dir(&self) -> PathBuf {
        self.dir.path().join(".git")
    }

    fn git(&self) -> Git {
        Git::open(self.path()).expect("open repo")
    }

    fn git_ok(&self, args: &[&str]) {
        let out = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .output()
            .expect("run git");
        assert!(
            out.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&out.stderr)
        );
    }

    fn git_stdout(&self, args: &[&str]) -> String {
        let out = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .output()
            .expect("run git");
        assert!(out.status.success(), "git {args:?} failed");
        String::from_utf8_lossy(&out.stdout).trim().to_string()
    }

    fn commit_file(&self, name: &str, content: &str, message: &str) -> Oid {
        std::fs::write(self.path().join(name), content).expect("write file");
        self.git_ok(&["add", name]);
        self.git_ok(&["commit", "-m", message]);
        self.head()
    }

    fn head(&self) -> Oid {
        Oid::new(self.git_stdout(&["rev-parse", "HEAD"])).expect("head oid")
    }
}

fn subjects(todo: &TodoList) -> Vec<String> {
    todo.instructions()
        .filter_map(|i| i.subject().map(str::to_string))
        .collect()
}

// =============================================================================
// Initial generation
// =============================================================================

#[test]
fn picks_are_oldest_first_with_short_ids() {
    let repo = TestRepo::new();
    let base = repo.head();
    repo.commit_file("one.txt", "1\n", "first change");
    repo.commit_file("two.txt", "2\n", "second change");
    let head = repo.head();

    let git = repo.git();
    let store = StateStore::create(&repo.git_dir()).unwrap();
    let todo = generate_todo(&git, &store, &base, &head, &RebaseOptions::default()).unwrap();

    assert_eq!(subjects(&todo), vec!["first change", "second change"]);
    for insn in todo.instructions() {
        assert_eq!(insn.opcode(), Opcode::Pick);
        // abbreviated, resolvable ids
        let commit = insn.commit().unwrap();
        assert!(commit.as_str().len() < 40);
        assert!(git.resolve(commit.as_str()).is_ok());
    }
}

#[test]
fn empty_commit_is_commented_out_and_recorded() {
    let repo = TestRepo::new();
    let base = repo.head();
    repo.git_ok(&["commit", "--allow-empty", "-m", "does nothing"]);
    let empty = repo.head();
    repo.commit_file("one.txt", "1\n", "real change");
    let head = repo.head();

    let git = repo.git();
    let store = StateStore::create(&repo.git_dir()).unwrap();
    let todo = generate_todo(&git, &store, &base, &head, &RebaseOptions::default()).unwrap();

    assert_eq!(subjects(&todo), vec!["real change"]);
    let text = todo.to_text();
    assert!(text.contains("# pick"));
    assert!(text.contains("does nothing"));
    let dropped = std::fs::read_to_string(store.paths().dropped()).unwrap();
    assert_eq!(dropped.trim(), empty.as_str());
}

#[test]
fn keep_empty_keeps_the_pick() {
    let repo = TestRepo::new();
    let base = repo.head();
    repo.git_ok(&["commit", "--allow-empty", "-m", "does nothing"]);
    let head = repo.head();

    let git = repo.git();
    let store = StateStore::create(&repo.git_dir()).unwrap();
    let opts = RebaseOptions {
        keep_empty: true,
        ..Default::default()
    };
    let todo = generate_todo(&git, &store, &base, &head, &opts).unwrap();
    assert_eq!(subjects(&todo), vec!["does nothing"]);
}

#[test]
fn range_without_commits_yields_noop() {
    let repo = TestRepo::new();
    let head = repo.head();
    let git = repo.git();
    let store = StateStore::create(&repo.git_dir()).unwrap();
    let todo = generate_todo(&git, &store, &head, &head, &RebaseOptions::default()).unwrap();
    assert_eq!(todo.instructions().count(), 1);
    assert_eq!(todo.peek_next_opcode(), Some(Opcode::Noop));
}

#[test]
fn cherry_pick_equivalents_are_dropped() {
    let repo = TestRepo::new();
    let base = repo.head();

    // A commit on topic...
    repo.git_ok(&["checkout", "-q", "-b", "topic"]);
    let picked = repo.commit_file("same.txt", "same\n", "shared change");
    repo.commit_file("extra.txt", "extra\n", "topic only");
    let head = repo.head();

    // ...is cherry-picked onto main, making it upstream-equivalent.
    repo.git_ok(&["checkout", "-q", "main"]);
    repo.git_ok(&["cherry-pick", picked.as_str()]);
    let upstream = repo.head();
    repo.git_ok(&["checkout", "-q", "topic"]);

    let git = repo.git();
    let store = StateStore::create(&repo.git_dir()).unwrap();
    let todo = generate_todo(&git, &store, &upstream, &head, &RebaseOptions::default()).unwrap();
    assert_eq!(subjects(&todo), vec!["topic only"]);
    let _ = base;
}

#[test]
fn merges_are_excluded_from_the_flat_program() {
    let repo = TestRepo::new();
    let base = repo.head();
    repo.git_ok(&["checkout", "-q", "-b", "side"]);
    let side = repo.commit_file("side.txt", "s\n", "side change");
    repo.git_ok(&["checkout", "-q", "main"]);
    repo.commit_file("main.txt", "m\n", "main change");
    repo.git_ok(&["merge", "--no-ff", "-m", "merge side", side.as_str()]);
    let head = repo.head();

    let git = repo.git();
    let store = StateStore::create(&repo.git_dir()).unwrap();
    let todo = generate_todo(&git, &store, &base, &head, &RebaseOptions::default()).unwrap();
    let subjects = subjects(&todo);
    assert!(subjects.contains(&"side change".to_string()));
    assert!(subjects.contains(&"main change".to_string()));
    assert!(!subjects.iter().any(|s| s.contains("merge")));
}

// =============================================================================
// Unnecessary-pick skipping
// =============================================================================

#[test]
fn leading_in_place_picks_migrate_to_done() {
    let repo = TestRepo::new();
    let base = repo.head();
    let b = repo.commit_file("b.txt", "b\n", "commit B");
    let c = repo.commit_file("c.txt", "c\n", "commit C");
    let head = repo.head();

    let git = repo.git();
    let store = StateStore::create(&repo.git_dir()).unwrap();
    let todo = generate_todo(&git, &store, &base, &head, &RebaseOptions::default()).unwrap();
    store.write_todo(&todo).unwrap();

    let advanced = skip_unnecessary_picks(&git, &store, &base).unwrap();
    assert_eq!(advanced, c);
    // Both picks migrated verbatim.
    let done = store.read_done().unwrap();
    assert_eq!(done.instructions().count(), 2);
    assert!(!store.read_todo().unwrap().has_action());
    // The advanced onto is persisted for the resume paths.
    assert_eq!(store.read_onto().unwrap(), Some(c));
    let _ = b;
}

#[test]
fn skipping_stops_at_the_first_reordered_pick() {
    let repo = TestRepo::new();
    let base = repo.head();
    let b = repo.commit_file("b.txt", "b\n", "commit B");
    let c = repo.commit_file("c.txt", "c\n", "commit C");

    let git = repo.git();
    let store = StateStore::create(&repo.git_dir()).unwrap();
    // Reordered by hand: C first. C's parent is B, not base.
    let todo = TodoList::parse(&format!("pick {c} commit C\npick {b} commit B\n"));
    store.write_todo(&todo).unwrap();

    let advanced = skip_unnecessary_picks(&git, &store, &base).unwrap();
    assert_eq!(advanced, base);
    assert_eq!(store.read_todo().unwrap().instructions().count(), 2);
    assert_eq!(store.read_done().unwrap().instructions().count(), 0);
}

#[test]
fn skipping_into_a_squash_seeds_the_pending_log() {
    let repo = TestRepo::new();
    let base = repo.head();
    let b = repo.commit_file("b.txt", "b\n", "commit B");
    let c = repo.commit_file("c.txt", "c\n", "commit C");

    let git = repo.git();
    let store = StateStore::create(&repo.git_dir()).unwrap();
    let todo = TodoList::parse(&format!("pick {b} commit B\nsquash {c} commit C\n"));
    store.write_todo(&todo).unwrap();

    let advanced = skip_unnecessary_picks(&git, &store, &base).unwrap();
    assert_eq!(advanced, b);
    // The squash run will attach to the migrated predecessor.
    assert_eq!(store.read_rewritten_pending().unwrap(), vec![b]);
}

// =============================================================================
// Preserve-merges expansion
// =============================================================================

#[test]
fn merge_graph_expands_to_label_goto_merge_program() {
    let repo = TestRepo::new();
    let base = repo.head();
    repo.git_ok(&["checkout", "-q", "-b", "side"]);
    let side = repo.commit_file("side.txt", "s\n", "side change");
    repo.git_ok(&["checkout", "-q", "main"]);
    repo.commit_file("main.txt", "m\n", "main change");
    repo.git_ok(&["merge", "--no-ff", "-m", "merge side", side.as_str()]);
    let head = repo.head();

    let git = repo.git();
    let todo = generate_merge_todo(&git, &base, &head).unwrap();
    let lines: Vec<String> = todo.instructions().map(|i| i.to_string()).collect();

    assert_eq!(lines[0], "label onto");
    assert!(lines.iter().any(|l| l.starts_with("pick ") && l.ends_with("side change")));
    assert!(lines.iter().any(|l| l.starts_with("pick ") && l.ends_with("main change")));
    assert!(lines.iter().any(|l| l == "goto onto"));
    let merge = lines.last().unwrap();
    assert!(merge.starts_with("merge -c "));
    assert!(merge.contains("rewritten-"));

    // Every goto / merge parent label is defined by an earlier label line.
    let mut defined: Vec<&str> = Vec::new();
    for line in &lines {
        if let Some(name) = line.strip_prefix("label ") {
            defined.push(name);
        }
        if let Some(name) = line.strip_prefix("goto ") {
            assert!(defined.contains(&name), "goto target {name} undefined");
        }
        if line.starts_with("merge ") {
            for token in line.split_whitespace().skip(1) {
                if token.starts_with("rewritten-") {
                    assert!(defined.contains(&token), "merge parent {token} undefined");
                }
            }
        }
    }
}

#[test]
fn linear_history_expands_to_plain_picks() {
    let repo = TestRepo::new();
    let base = repo.head();
    repo.commit_file("one.txt", "1\n", "first");
    repo.commit_file("two.txt", "2\n", "second");
    let head = repo.head();

    let git = repo.git();
    let todo = generate_merge_todo(&git, &base, &head).unwrap();
    let lines: Vec<String> = todo.instructions().map(|i| i.to_string()).collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "label onto");
    assert!(lines[1].ends_with("first"));
    assert!(lines[2].ends_with("second"));
}
