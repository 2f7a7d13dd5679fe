//! engine::exec
//!
//! The instruction interpreter.
//!
//! # Step contract
//!
//! Each step clears the transient pause files, migrates the first todo line
//! to the done log, and dispatches on its opcode. A line is consumed the
//! moment it is read: a paused instruction lives in `done`, and `continue`
//! resumes after it. When the todo runs out, finalisation updates the
//! branch ref, fires the post-rewrite hook, and removes the state
//! directory.
//!
//! # Pausing
//!
//! A pause is an [`Outcome`], not an error: the process exits with the
//! returned status and a later entry point re-enters the loop. Errors are
//! reserved for situations the user must resolve outside the normal
//! continue/skip/abort flow.

use crate::core::types::{LabelName, Oid};
use crate::git::{CherryPickOpts, CommitOpts, Git};
use crate::state::{RebaseOptions, StateStore};
use crate::todo::{Instruction, LineKind, MergeParent, TodoError, TodoList};
use crate::ui::output::{self, Verbosity};

use super::squash::{update_squash_message, SquashStyle};
use super::RebaseError;

/// Guidance printed under every conflict pause.
const RESOLVE_HINT: &str = "\
When you have resolved this problem run \"rsq continue\".
If you would prefer to skip this patch run \"rsq skip\".
To discard the rebase state and give up run \"rsq abort\".";

/// How a rebase invocation ended.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Every instruction was consumed and finalisation ran.
    Completed,
    /// The engine paused for the user; exit with this status.
    Paused {
        /// The process exit code to report.
        exit_code: i32,
    },
}

/// Result of one dispatched instruction.
enum StepResult {
    Continue,
    Pause { code: i32 },
}

/// The instruction interpreter.
pub struct Executor<'a> {
    git: &'a Git,
    store: &'a StateStore,
    opts: RebaseOptions,
    verbosity: Verbosity,
}

impl<'a> Executor<'a> {
    /// Create an executor over an open state store.
    pub fn new(git: &'a Git, store: &'a StateStore, verbosity: Verbosity) -> Result<Self, RebaseError> {
        let opts = store.read_options()?;
        Ok(Self {
            git,
            store,
            opts,
            verbosity,
        })
    }

    /// Consume instructions until the todo is empty or a pause is needed.
    pub fn run(&self) -> Result<Outcome, RebaseError> {
        loop {
            self.store.clear_message()?;
            self.store.clear_author()?;
            self.store.clear_amend()?;

            let mut todo = self.store.read_todo()?;
            let Some(line) = todo.shift() else {
                return self.finalize();
            };
            self.store.append_done_line(&line.raw)?;
            self.store.write_todo(&todo)?;

            let step = match &line.kind {
                LineKind::Comment | LineKind::Blank => StepResult::Continue,
                LineKind::Instruction(insn) => self.dispatch(insn, &todo)?,
                LineKind::Invalid { token, error } => {
                    self.handle_invalid(&line.raw, token.as_deref(), error)?
                }
            };
            match step {
                StepResult::Continue => continue,
                StepResult::Pause { code } => return Ok(Outcome::Paused { exit_code: code }),
            }
        }
    }

    fn dispatch(&self, insn: &Instruction, rest: &TodoList) -> Result<StepResult, RebaseError> {
        match insn {
            Instruction::Noop => Ok(StepResult::Continue),
            Instruction::Pick { commit, subject } => {
                let oid = self.git.resolve_commit_ref(commit)?;
                self.do_pick(&oid, subject, rest)
            }
            Instruction::Reword { commit, subject } => {
                let oid = self.git.resolve_commit_ref(commit)?;
                self.do_reword(&oid, subject, rest)
            }
            Instruction::Edit { commit, subject } => {
                let oid = self.git.resolve_commit_ref(commit)?;
                self.do_edit(&oid, subject)
            }
            Instruction::Squash { commit, subject } => {
                let oid = self.git.resolve_commit_ref(commit)?;
                self.do_squash(&oid, subject, SquashStyle::Squash, rest)
            }
            Instruction::Fixup { commit, subject } => {
                let oid = self.git.resolve_commit_ref(commit)?;
                self.do_squash(&oid, subject, SquashStyle::Fixup, rest)
            }
            Instruction::Exec { command } => self.do_exec(command),
            Instruction::Label { name } => {
                let head = self.git.head_oid()?;
                self.store.write_label(name, &head)?;
                Ok(StepResult::Continue)
            }
            Instruction::Goto { name } => self.do_goto(name),
            Instruction::Merge {
                message_from,
                parents,
            } => self.do_merge(message_from.as_ref(), parents),
        }
    }

    // =========================================================================
    // Pick family
    // =========================================================================

    fn cherry_pick_opts(&self) -> CherryPickOpts {
        CherryPickOpts {
            no_commit: false,
            allow_empty: self.opts.keep_empty,
            ff: !self.opts.force_rebase,
        }
    }

    fn do_pick(&self, oid: &Oid, subject: &str, rest: &TodoList) -> Result<StepResult, RebaseError> {
        if self.git.cherry_pick(oid, self.cherry_pick_opts()).is_err() {
            return self.pause_with_patch(oid, subject, "apply");
        }
        self.record_in_rewritten(oid, rest)?;
        Ok(StepResult::Continue)
    }

    fn do_reword(
        &self,
        oid: &Oid,
        subject: &str,
        rest: &TodoList,
    ) -> Result<StepResult, RebaseError> {
        if self.git.cherry_pick(oid, self.cherry_pick_opts()).is_err() {
            return self.pause_with_patch(oid, subject, "apply");
        }
        let amend = CommitOpts {
            amend: true,
            edit: true,
            ..Default::default()
        };
        if self.git.commit(amend).is_err() {
            let head = self.git.head_oid()?;
            self.store.write_stopped_sha(oid)?;
            self.store.write_amend(&head)?;
            self.warn(format!(
                "Could not amend commit after successfully picking {}... {}",
                self.git.short_id(oid)?,
                subject
            ));
            self.warn("This is most likely due to an empty commit message, or the pre-commit");
            self.warn("hook failed. Fix the message or the hook, then run \"rsq continue\".");
            return Ok(StepResult::Pause { code: 1 });
        }
        self.record_in_rewritten(oid, rest)?;
        Ok(StepResult::Continue)
    }

    fn do_edit(&self, oid: &Oid, subject: &str) -> Result<StepResult, RebaseError> {
        if self.git.cherry_pick(oid, self.cherry_pick_opts()).is_err() {
            return self.pause_with_patch(oid, subject, "apply");
        }
        self.store.write_stopped_sha(oid)?;
        self.make_patch(oid)?;
        let head = self.git.head_oid()?;
        self.store.write_amend(&head)?;
        self.warn(format!(
            "Stopped at {}... {}",
            self.git.short_id(oid)?,
            subject
        ));
        self.warn("You can amend the commit now, with");
        self.warn("\tgit commit --amend");
        self.warn("Once you are satisfied with your changes, run");
        self.warn("\trsq continue");
        Ok(StepResult::Pause { code: 0 })
    }

    // =========================================================================
    // Squash / fixup
    // =========================================================================

    fn do_squash(
        &self,
        oid: &Oid,
        subject: &str,
        style: SquashStyle,
        rest: &TodoList,
    ) -> Result<StepResult, RebaseError> {
        let done = self.store.read_done()?;
        // The current line is already in the done log; it needs a
        // predecessor to meld into.
        if done.instructions().count() < 2 {
            let name = match style {
                SquashStyle::Squash => "squash",
                SquashStyle::Fixup => "fixup",
            };
            return Err(RebaseError::Precondition(format!(
                "Cannot '{name}' without a previous commit"
            )));
        }

        let head = self.git.head_oid()?;
        let head_info = self.git.commit_info(&head)?;
        self.store.write_author(&head_info.author)?;

        let incoming = self.git.commit_message(oid)?;
        update_squash_message(self.store, &head_info.message, &incoming, style)?;

        let pick = CherryPickOpts {
            no_commit: true,
            allow_empty: self.opts.keep_empty,
            ff: false,
        };
        if self.git.cherry_pick(oid, pick).is_err() {
            return self.fail_squash(oid, subject, &head);
        }

        let run_continues = rest
            .peek_next_opcode()
            .is_some_and(|op| op.is_squash_fixup());
        let committed = if run_continues {
            // Intermediate commit; the long message is only needed if a
            // later step fails.
            let squash_path = self.store.paths().message_squash();
            self.git.commit(CommitOpts {
                amend: true,
                no_verify: true,
                message_file: Some(squash_path.as_path()),
                ..Default::default()
            })
        } else if self.store.read_fixup_message()?.is_some() {
            let fixup_path = self.store.paths().message_fixup();
            self.git.commit(CommitOpts {
                amend: true,
                no_verify: true,
                message_file: Some(fixup_path.as_path()),
                ..Default::default()
            })
        } else {
            self.store.export_squash_message_scratch()?;
            let scratch = self.store.paths().squash_msg_scratch();
            self.git.commit(CommitOpts {
                amend: true,
                no_verify: true,
                edit: true,
                message_file: Some(scratch.as_path()),
                ..Default::default()
            })
        };
        if committed.is_err() {
            return self.fail_squash(oid, subject, &head);
        }
        if !run_continues {
            self.store.clear_squash_message()?;
            self.store.clear_fixup_message()?;
        }
        self.record_in_rewritten(oid, rest)?;
        Ok(StepResult::Continue)
    }

    fn fail_squash(
        &self,
        oid: &Oid,
        subject: &str,
        head_before: &Oid,
    ) -> Result<StepResult, RebaseError> {
        self.store.move_squash_message_to_message()?;
        self.store.clear_fixup_message()?;
        self.store.export_message_as_merge_msg()?;
        self.store.write_amend(head_before)?;
        self.warn("");
        self.pause_with_patch(oid, subject, "apply")
    }

    // =========================================================================
    // Exec
    // =========================================================================

    fn do_exec(&self, command: &str) -> Result<StepResult, RebaseError> {
        let head = self.git.head_oid()?;
        self.store.write_stopped_sha(&head)?;
        output::print(format!("Executing: {command}"), self.verbosity);
        let status = self.git.run_shell(command)?;
        let dirty = !self.git.is_worktree_clean()?;
        if status != 0 {
            self.warn(format!("Execution failed: {command}"));
            if dirty {
                self.warn("and made changes to the index and/or the working tree");
            }
            self.warn("You can fix the problem, and then run \"rsq continue\".");
            // 127 is the shell's command-not-found
            let code = if status == 127 { 1 } else { status };
            return Ok(StepResult::Pause { code });
        }
        if dirty {
            self.warn(format!("Execution succeeded: {command}"));
            self.warn("but left changes in the index and/or the working tree");
            self.warn("Commit or stash your changes, and then run \"rsq continue\".");
            return Ok(StepResult::Pause { code: 1 });
        }
        Ok(StepResult::Continue)
    }

    // =========================================================================
    // Labels and merges
    // =========================================================================

    fn do_goto(&self, name: &LabelName) -> Result<StepResult, RebaseError> {
        let oid = self
            .store
            .read_label(name)?
            .ok_or_else(|| RebaseError::MissingLabel(name.to_string()))?;
        self.git.checkout_detached(&oid)?;
        Ok(StepResult::Continue)
    }

    fn do_merge(
        &self,
        message_from: Option<&crate::core::types::CommitRef>,
        parents: &[MergeParent],
    ) -> Result<StepResult, RebaseError> {
        let mut resolved = Vec::new();
        for parent in parents {
            let oid = match parent {
                MergeParent::Commit(commit) => self.git.resolve_commit_ref(commit)?,
                MergeParent::Label(name) => self
                    .store
                    .read_label(name)?
                    .ok_or_else(|| RebaseError::MissingLabel(name.to_string()))?,
            };
            resolved.push(oid);
        }

        let source = match message_from {
            Some(commit) => Some(self.git.resolve_commit_ref(commit)?),
            None => None,
        };
        let message = match &source {
            // The referenced commit's body is taken literally, even when it
            // is not itself part of the rebased range.
            Some(oid) => self.git.commit_message(oid)?,
            None => {
                let names: Vec<String> = parents.iter().map(|p| p.to_string()).collect();
                format!("Merge {}", names.join(" "))
            }
        };

        if self.git.merge_no_ff(&message, &resolved).is_ok() {
            return Ok(StepResult::Continue);
        }

        // Leave enough state for `continue` to create the merge commit once
        // the user resolves: git itself keeps MERGE_HEAD.
        let stopped = source.clone().unwrap_or_else(|| resolved[0].clone());
        self.store.write_stopped_sha(&stopped)?;
        self.store.write_message(&message)?;
        let author = match &source {
            Some(oid) => self.git.commit_info(oid)?.author,
            None => self.git.commit_info(&self.git.head_oid()?)?.author,
        };
        self.store.write_author(&author)?;
        self.warn(format!("Could not merge {}", stopped.short(7)));
        self.warn(RESOLVE_HINT);
        Ok(StepResult::Pause { code: 1 })
    }

    // =========================================================================
    // Invalid lines
    // =========================================================================

    fn handle_invalid(
        &self,
        raw: &str,
        token: Option<&str>,
        error: &TodoError,
    ) -> Result<StepResult, RebaseError> {
        self.warn(format!("{error}: {raw}"));
        if let Some(oid) = token.and_then(|t| self.git.try_resolve(t)) {
            self.warn("Please fix this in the todo file with \"rsq edit-todo\".");
            return self.pause_with_patch(&oid, raw, "interpret");
        }
        Err(RebaseError::MalformedTodo(raw.to_string()))
    }

    // =========================================================================
    // Pause plumbing
    // =========================================================================

    fn warn(&self, message: impl std::fmt::Display) {
        output::warn(message, self.verbosity);
    }

    fn pause_with_patch(
        &self,
        oid: &Oid,
        subject: &str,
        verb: &str,
    ) -> Result<StepResult, RebaseError> {
        self.store.write_stopped_sha(oid)?;
        self.make_patch(oid)?;
        self.warn(format!(
            "Could not {verb} {}... {}",
            self.git.short_id(oid)?,
            subject
        ));
        self.warn(RESOLVE_HINT);
        Ok(StepResult::Pause { code: 1 })
    }

    /// Materialise the failed commit: patch text always, message and author
    /// only when a more specific value is not already in place.
    fn make_patch(&self, oid: &Oid) -> Result<(), RebaseError> {
        self.store.write_patch(&self.git.patch_text(oid)?)?;
        if !self.store.paths().message().exists() {
            self.store.write_message(&self.git.commit_message(oid)?)?;
        }
        if !self.store.paths().author_script().exists() {
            self.store.write_author(&self.git.commit_info(oid)?.author)?;
        }
        Ok(())
    }

    // =========================================================================
    // Rewritten bookkeeping
    // =========================================================================

    /// Record an old commit as rewritten; flush the pending log to the
    /// final list unless a squash/fixup is about to extend the run.
    fn record_in_rewritten(&self, old: &Oid, rest: &TodoList) -> Result<(), RebaseError> {
        self.store.append_rewritten_pending(old)?;
        let run_continues = rest
            .peek_next_opcode()
            .is_some_and(|op| op.is_squash_fixup());
        if !run_continues {
            self.flush_rewritten_pending()?;
        }
        Ok(())
    }

    /// Record against the current on-disk todo (the resume entry points).
    pub(crate) fn record_stopped(&self, old: &Oid) -> Result<(), RebaseError> {
        let todo = self.store.read_todo()?;
        self.record_in_rewritten(old, &todo)
    }

    fn flush_rewritten_pending(&self) -> Result<(), RebaseError> {
        let new = self.git.head_oid()?;
        for old in self.store.read_rewritten_pending()? {
            self.store.append_rewritten_pair(&old, &new)?;
        }
        self.store.clear_rewritten_pending()
            .map_err(RebaseError::from)
    }

    // =========================================================================
    // Finalisation
    // =========================================================================

    fn finalize(&self) -> Result<Outcome, RebaseError> {
        let new_head = self.git.head_oid()?;
        let head_name = self.store.read_head_name()?;
        let onto = self.store.read_onto()?;
        let orig_head = self.store.read_orig_head()?;

        if let Some(name) = head_name.as_deref().filter(|n| n.starts_with("refs/")) {
            let refname = crate::core::types::RefName::new(name)?;
            let short_onto = onto
                .as_ref()
                .map(|o| o.short(7).to_string())
                .unwrap_or_else(|| "onto".to_string());
            let message = format!("rebase -i (finish): {refname} onto {short_onto}");
            self.git.update_ref(refname.as_str(), &new_head, &message)?;
            self.git.set_head(&refname)?;
        }

        if self.store.is_verbose() {
            if let Some(orig) = &orig_head {
                self.git.print_diffstat(orig, &new_head);
            }
        }

        let rewritten = self.store.read_rewritten_list_raw()?;
        if !rewritten.is_empty() {
            self.git.copy_notes_for_rewrite(&rewritten);
            self.git.run_post_rewrite_hook(&rewritten);
        }

        let label = head_name.unwrap_or_else(|| "detached HEAD".to_string());
        self.store.remove()?;
        self.git.gc_auto();
        output::print(
            format!("Successfully rebased and updated {label}."),
            self.verbosity,
        );
        Ok(Outcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_equality() {
        assert_eq!(Outcome::Completed, Outcome::Completed);
        assert_eq!(
            Outcome::Paused { exit_code: 1 },
            Outcome::Paused { exit_code: 1 }
        );
        assert_ne!(Outcome::Completed, Outcome::Paused { exit_code: 0 });
    }

    #[test]
    fn resolve_hint_names_all_entry_points() {
        assert!(RESOLVE_HINT.contains("rsq continue"));
        assert!(RESOLVE_HINT.contains("rsq skip"));
        assert!(RESOLVE_HINT.contains("rsq abort"));
    }
}
