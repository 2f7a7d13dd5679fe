//! engine::resume
//!
//! The entry points of a rebase: `start`, `continue`, `skip`, `abort`, and
//! `edit-todo`.
//!
//! Between invocations the process holds nothing in memory; every entry
//! point reconstructs its world from the state directory and hands control
//! to the executor loop. `start` owns the one-time setup: preconditions,
//! todo generation and its transformations, the editor round, and the
//! detach onto the new base.

use crate::core::config::Config;
use crate::core::types::Oid;
use crate::git::{CommitOpts, Git};
use crate::state::{RebaseOptions, StateStore};
use crate::ui::output::Verbosity;
use crate::ui::{edit_file, EditKind};

use super::exec::{Executor, Outcome};
use super::{autosquash, merges, plan, RebaseError};

/// Inputs to `start`, as collected by the CLI.
#[derive(Debug, Clone)]
pub struct StartParams {
    /// Revision whose ancestors are kept out of the rebase.
    pub upstream: String,
    /// New base; defaults to `upstream`.
    pub onto: Option<String>,
    /// Branch to check out before rebasing, if any.
    pub branch: Option<String>,
    /// The option block to persist for the whole run.
    pub opts: RebaseOptions,
}

/// Begin an interactive rebase.
///
/// # Errors
///
/// Precondition failures (missing identity, missing HEAD, rebase already in
/// progress) abort without touching working state. A failure during setup
/// (editor, empty todo) removes the just-created state directory.
pub fn start(
    git: &Git,
    params: &StartParams,
    config: &Config,
    verbosity: Verbosity,
) -> Result<Outcome, RebaseError> {
    git.require_identity()?;
    if let Some(branch) = &params.branch {
        git.checkout(branch)?;
    }
    let orig_head = git.head_oid().map_err(|_| {
        RebaseError::Precondition("no HEAD to rebase; the repository has no commits".to_string())
    })?;
    let head_name = match git.head_ref_name()? {
        Some(refname) => refname.to_string(),
        None => "detached HEAD".to_string(),
    };
    let upstream = git.resolve(&params.upstream)?;
    let onto = match &params.onto {
        Some(spec) => git.resolve(spec)?,
        None => upstream.clone(),
    };

    let store = StateStore::create(git.git_dir())?;
    if let Err(e) = prepare(
        git, &store, params, config, &upstream, &onto, &orig_head, &head_name,
    ) {
        // Nothing has been replayed yet; leave no state behind.
        let _ = store.remove();
        return Err(e);
    }
    Executor::new(git, &store, verbosity)?.run()
}

/// One-time setup between state-dir creation and the first instruction.
#[allow(clippy::too_many_arguments)]
fn prepare(
    git: &Git,
    store: &StateStore,
    params: &StartParams,
    config: &Config,
    upstream: &Oid,
    onto: &Oid,
    orig_head: &Oid,
    head_name: &str,
) -> Result<(), RebaseError> {
    let opts = &params.opts;
    store.mark_interactive()?;
    store.set_verbose(opts.verbose)?;
    store.write_upstream(upstream)?;
    store.write_onto(onto)?;
    store.write_orig_head(orig_head)?;
    store.write_head_name(head_name)?;
    store.write_options(opts)?;

    let mut todo = if opts.preserve_merges {
        merges::generate_merge_todo(git, upstream, orig_head)?
    } else {
        plan::generate_todo(git, store, upstream, orig_head, opts)?
    };
    if opts.autosquash {
        todo = autosquash::rearrange_autosquash(&todo, |r| git.try_resolve(r.as_str()));
    }
    if let Some(cmd) = &opts.exec_cmd {
        todo = plan::insert_exec(&todo, cmd);
    }
    plan::append_help(
        &mut todo,
        &git.short_id(upstream)?,
        &git.short_id(orig_head)?,
        &git.short_id(onto)?,
    );
    store.write_todo(&todo)?;
    store.backup_todo()?;

    edit_file(
        &store.paths().todo(),
        EditKind::Sequence,
        config.editor.as_deref(),
    )?;

    if !store.read_todo()?.has_action() {
        return Err(RebaseError::NothingToDo);
    }

    let onto = if opts.force_rebase {
        onto.clone()
    } else {
        plan::skip_unnecessary_picks(git, store, onto)?
    };
    git.checkout_detached(&onto)?;
    git.update_ref("ORIG_HEAD", orig_head, "rebase -i (start)")?;
    Ok(())
}

/// Resume after a pause.
///
/// Staged changes become a commit first: amended onto HEAD when the amend
/// marker still matches, fresh otherwise, always with the recorded author.
/// The stopped commit then enters the rewritten bookkeeping and the
/// executor loop takes over.
pub fn continue_rebase(git: &Git, verbosity: Verbosity) -> Result<Outcome, RebaseError> {
    let store = StateStore::open(git.git_dir())?;
    let executor = Executor::new(git, &store, verbosity)?;

    // A pause that expects a commit always recorded author or amend state;
    // an exec pause recorded neither, and its stopped-sha must not be
    // treated as a rewritten commit.
    let had_pause_context =
        store.paths().author_script().exists() || store.paths().amend().exists();

    if git.worktree_status()?.has_staged() {
        let author = store.read_author()?.ok_or(RebaseError::AmendRequired)?;
        let amend = match store.read_amend()? {
            None => false,
            Some(marker) => {
                if marker != git.head_oid()? {
                    return Err(RebaseError::Precondition(
                        "You have uncommitted changes in your working tree. Please commit them\n\
                         first and then run \"rsq continue\" again."
                            .to_string(),
                    ));
                }
                true
            }
        };
        let message_path = store.paths().message();
        let message_file = message_path.exists().then(|| message_path.clone());
        git.commit(CommitOpts {
            amend,
            no_verify: true,
            edit: true,
            message_file: message_file.as_deref(),
            author: Some(&author),
        })
        .map_err(|_| {
            RebaseError::Precondition("Could not commit staged changes.".to_string())
        })?;
        store.clear_amend()?;
    }

    if let Some(stopped) = store.read_stopped_sha()? {
        if had_pause_context {
            executor.record_stopped(&stopped)?;
        }
        store.clear_stopped_sha()?;
    }

    if !git.is_worktree_clean()? {
        return Err(RebaseError::DirtyWorktree(
            "you have unstaged changes".to_string(),
        ));
    }
    executor.run()
}

/// Drop the instruction that paused and move on.
pub fn skip(git: &Git, verbosity: Verbosity) -> Result<Outcome, RebaseError> {
    let store = StateStore::open(git.git_dir())?;
    git.reset_hard_head()?;
    git.rerere_clear();
    store.clear_stopped_sha()?;
    Executor::new(git, &store, verbosity)?.run()
}

/// Abandon the rebase: drop the state directory.
///
/// Restoring the original branch tip is the enclosing driver's concern.
pub fn abort(git: &Git) -> Result<(), RebaseError> {
    let store = StateStore::open(git.git_dir())?;
    store.remove()?;
    Ok(())
}

/// Reopen the remaining todo in the editor.
pub fn edit_todo(git: &Git, config: &Config) -> Result<(), RebaseError> {
    let store = StateStore::open(git.git_dir())?;
    let mut todo = store.read_todo()?;
    todo.strip_comments();
    plan::append_edit_todo_help(&mut todo);
    store.write_todo(&todo)?;
    edit_file(
        &store.paths().todo(),
        EditKind::Sequence,
        config.editor.as_deref(),
    )?;
    Ok(())
}
