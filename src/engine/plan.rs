//! engine::plan
//!
//! Initial todo generation and the flat-program transformations.
//!
//! # Invariants
//!
//! - Generation never mutates the worktree; the only side effects are state
//!   files (`dropped`, and the done log during pick skipping)
//! - The emitted program replayed without edits reproduces the original
//!   branch tip

use thiserror::Error;

use crate::core::types::{CommitRef, Oid, TypeError};
use crate::git::{Git, GitError};
use crate::state::{RebaseOptions, StateError, StateStore};
use crate::todo::{Instruction, LineKind, Opcode, TodoList};

/// Errors from planning.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Object access failed.
    #[error("git error: {0}")]
    Git(#[from] GitError),

    /// State persistence failed.
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// An id produced by the oracle failed validation.
    #[error("{0}")]
    Type(#[from] TypeError),
}

/// Generate the initial flat todo for `upstream..head`.
///
/// Commits are enumerated oldest first, merges excluded, cherry-pick
/// equivalents of upstream commits dropped. Empty commits are emitted
/// commented out (and recorded in the `dropped` artifact) unless
/// `keep_empty`. A program that would otherwise have no instruction gets a
/// single `noop`.
pub fn generate_todo(
    git: &Git,
    store: &StateStore,
    upstream: &Oid,
    head: &Oid,
    opts: &RebaseOptions,
) -> Result<TodoList, PlanError> {
    let mut todo = TodoList::new();
    for oid in git.commits_for_rebase(upstream, head)? {
        let info = git.commit_info(&oid)?;
        let insn = Instruction::Pick {
            commit: CommitRef::new(git.short_id(&oid)?)?,
            subject: info.summary,
        };
        if !opts.keep_empty && git.is_empty_commit(&oid)? {
            todo.push_comment(&insn.to_string());
            store.append_dropped(&oid)?;
        } else {
            todo.push(insn);
        }
    }
    if !todo.has_action() {
        todo.push(Instruction::Noop);
    }
    Ok(todo)
}

/// Insert `exec <cmd>` after every pick.
///
/// The command lands before each subsequent pick (so a squash/fixup run
/// keeps its exec after the whole run) and once after the last instruction;
/// nothing is inserted before the first pick.
pub fn insert_exec(todo: &TodoList, cmd: &str) -> TodoList {
    let exec = |out: &mut TodoList| {
        out.push(Instruction::Exec {
            command: cmd.to_string(),
        });
    };
    let mut out = TodoList::new();
    let mut seen_pick = false;
    for line in todo.lines() {
        if line
            .instruction()
            .is_some_and(|insn| insn.opcode() == Opcode::Pick)
        {
            if seen_pick {
                exec(&mut out);
            }
            seen_pick = true;
        }
        out.push_raw(line.raw.clone());
    }
    exec(&mut out);
    out
}

/// Migrate leading picks that are already in place.
///
/// While the next instruction is a `pick` whose commit sits directly on the
/// current `onto`, the pick is a no-op: move its line (and any comments
/// before it) to the done log and advance `onto`. When the surviving
/// program opens with a squash/fixup, the advanced `onto` is seeded into
/// the pending log so the run coalesces into the right predecessor.
///
/// Returns the advanced `onto`, which is also written back to the state.
pub fn skip_unnecessary_picks(
    git: &Git,
    store: &StateStore,
    onto: &Oid,
) -> Result<Oid, PlanError> {
    let todo = store.read_todo()?;
    let mut onto = onto.clone();
    let mut kept = TodoList::new();
    let mut skipping = true;

    for line in todo.lines() {
        if skipping {
            match &line.kind {
                LineKind::Comment | LineKind::Blank => {
                    store.append_done_line(&line.raw)?;
                    continue;
                }
                LineKind::Instruction(Instruction::Pick { commit, .. }) => {
                    let oid = git.resolve_commit_ref(commit)?;
                    if git.first_parent(&oid)?.as_ref() == Some(&onto) {
                        store.append_done_line(&line.raw)?;
                        onto = oid;
                        continue;
                    }
                    skipping = false;
                }
                _ => skipping = false,
            }
        }
        kept.push_raw(line.raw.clone());
    }

    store.write_todo(&kept)?;
    if kept
        .peek_next_opcode()
        .is_some_and(|op| op.is_squash_fixup())
    {
        store.append_rewritten_pending(&onto)?;
    }
    store.write_onto(&onto)?;
    Ok(onto)
}

/// Append the command legend and removal warnings shown under the generated
/// program.
pub fn append_help(todo: &mut TodoList, upstream_short: &str, head_short: &str, onto_short: &str) {
    todo.push_blank();
    todo.push_comment(&format!(
        "Rebase {upstream_short}..{head_short} onto {onto_short}"
    ));
    todo.push_comment("");
    todo.push_comment("Commands:");
    todo.push_comment(" p, pick = use commit");
    todo.push_comment(" r, reword = use commit, but edit the commit message");
    todo.push_comment(" e, edit = use commit, but stop for amending");
    todo.push_comment(" s, squash = use commit, but meld into previous commit");
    todo.push_comment(" f, fixup = like \"squash\", but discard this commit's log message");
    todo.push_comment(" x, exec = run command (the rest of the line) using shell");
    todo.push_comment(" l, label = record current HEAD under the given name");
    todo.push_comment(" g, goto = reset HEAD to a previously recorded label");
    todo.push_comment(" m, merge [-c <commit>] <parent>... = recreate a merge commit");
    todo.push_comment("");
    todo.push_comment("If you remove a line here THAT COMMIT WILL BE LOST.");
    todo.push_comment("However, if you remove everything, the rebase will be aborted.");
    todo.push_comment("");
}

/// Append the note shown when the todo of an ongoing rebase is reopened.
pub fn append_edit_todo_help(todo: &mut TodoList) {
    todo.push_blank();
    todo.push_comment("You are editing the todo file of an ongoing interactive rebase.");
    todo.push_comment("To continue rebase after editing, run:");
    todo.push_comment("    rsq continue");
    todo.push_comment("");
}

#[cfg(test)]
mod tests {
    use super::*;

    mod insert_exec {
        use super::*;

        fn actions(todo: &TodoList) -> Vec<String> {
            todo.instructions().map(|i| i.to_string()).collect()
        }

        #[test]
        fn after_every_pick_and_at_end() {
            let todo = TodoList::parse("pick deadbee a\npick cafe123 b\n");
            let out = insert_exec(&todo, "make test");
            assert_eq!(
                actions(&out),
                vec![
                    "pick deadbee a",
                    "exec make test",
                    "pick cafe123 b",
                    "exec make test",
                ]
            );
        }

        #[test]
        fn not_before_first_pick() {
            let todo = TodoList::parse("# header\npick deadbee a\n");
            let out = insert_exec(&todo, "true");
            assert_eq!(out.lines()[0].raw, "# header");
            assert_eq!(out.lines()[1].raw, "pick deadbee a");
        }

        #[test]
        fn squash_run_keeps_exec_after_run() {
            let todo =
                TodoList::parse("pick deadbee a\nsquash cafe123 b\nfixup faceb00 c\npick beef1234 d\n");
            let out = insert_exec(&todo, "true");
            assert_eq!(
                actions(&out),
                vec![
                    "pick deadbee a",
                    "squash cafe123 b",
                    "fixup faceb00 c",
                    "exec true",
                    "pick beef1234 d",
                    "exec true",
                ]
            );
        }

        #[test]
        fn appended_even_without_picks() {
            let todo = TodoList::parse("noop\n");
            let out = insert_exec(&todo, "true");
            assert_eq!(actions(&out), vec!["noop", "exec true"]);
        }
    }

    mod help {
        use super::*;

        #[test]
        fn help_footer_shape() {
            let mut todo = TodoList::parse("pick deadbee a\n");
            append_help(&mut todo, "deadbee", "cafe123", "deadbee");
            let text = todo.to_text();
            insta::assert_snapshot!(text, @r###"
            pick deadbee a

            # Rebase deadbee..cafe123 onto deadbee
            #
            # Commands:
            #  p, pick = use commit
            #  r, reword = use commit, but edit the commit message
            #  e, edit = use commit, but stop for amending
            #  s, squash = use commit, but meld into previous commit
            #  f, fixup = like "squash", but discard this commit's log message
            #  x, exec = run command (the rest of the line) using shell
            #  l, label = record current HEAD under the given name
            #  g, goto = reset HEAD to a previously recorded label
            #  m, merge [-c <commit>] <parent>... = recreate a merge commit
            #
            # If you remove a line here THAT COMMIT WILL BE LOST.
            # However, if you remove everything, the rebase will be aborted.
            #
            "###);
        }

        #[test]
        fn help_is_all_comments() {
            let mut todo = TodoList::new();
            append_help(&mut todo, "a", "b", "c");
            assert!(!todo.has_action());
        }

        #[test]
        fn edit_todo_help_mentions_continue() {
            let mut todo = TodoList::new();
            append_edit_todo_help(&mut todo);
            assert!(todo.to_text().contains("rsq continue"));
            assert!(!todo.has_action());
        }
    }
}
