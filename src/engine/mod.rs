//! engine
//!
//! The instruction interpreter and its supporting state machine.
//!
//! # Architecture
//!
//! A rebase run is: Plan -> Execute -> Finalise, resumable at every pause.
//!
//! 1. **Plan** ([`plan`], [`autosquash`], [`merges`]): generate the todo
//!    program from a revision range and transform it (autosquash, exec
//!    insertion, preserve-merges expansion, unnecessary-pick skipping).
//! 2. **Execute** ([`exec`]): interpret one instruction at a time, mutating
//!    the worktree through [`crate::git::Git`] and the durable state through
//!    [`crate::state::StateStore`]; pause by exiting the process.
//! 3. **Resume** ([`resume`]): the `start`/`continue`/`skip`/`abort`/
//!    `edit-todo` entry points that re-enter the loop across invocations.
//!
//! # Invariants
//!
//! - Only the executor mutates the worktree, index, and refs
//! - Every consumed commit-producing instruction lands exactly once in the
//!   rewritten bookkeeping
//! - After every completed instruction the on-disk state is resumable

pub mod autosquash;
pub mod exec;
pub mod merges;
pub mod plan;
pub mod resume;
pub mod squash;

pub use exec::{Executor, Outcome};
pub use plan::PlanError;
pub use resume::StartParams;

use thiserror::Error;

use crate::core::author::AuthorError;
use crate::core::types::TypeError;
use crate::git::GitError;
use crate::state::StateError;
use crate::ui::EditorError;

/// Errors that terminate a rebase invocation (as opposed to pauses, which
/// are an [`Outcome`]).
#[derive(Debug, Error)]
pub enum RebaseError {
    /// Git operation failed.
    #[error("git error: {0}")]
    Git(#[from] GitError),

    /// State persistence failed.
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// Planning failed.
    #[error("planning failed: {0}")]
    Plan(#[from] PlanError),

    /// Editor invocation failed.
    #[error("{0}")]
    Editor(#[from] EditorError),

    /// Identifier validation failed.
    #[error("{0}")]
    Type(#[from] TypeError),

    /// Author script could not be interpreted.
    #[error("{0}")]
    Author(#[from] AuthorError),

    /// The edited todo contains no actionable instruction.
    #[error("Nothing to do")]
    NothingToDo,

    /// `continue` found staged changes but no recorded author.
    #[error(
        "You have staged changes in your working tree.\n\
         If these changes are meant to be squashed into the previous commit, run:\n\
         \n  git commit --amend\n\n\
         If they are meant to go into a new commit, run:\n\
         \n  git commit\n\n\
         In both cases, once you're done, continue with:\n\
         \n  rsq continue\n"
    )]
    AmendRequired,

    /// The working tree is not in a state the engine can proceed from.
    #[error("cannot rebase: {0}")]
    DirtyWorktree(String),

    /// A todo line could not be interpreted and its argument is not a
    /// commit.
    #[error("malformed todo line: {0}\nPlease fix this using \"rsq edit-todo\".")]
    MalformedTodo(String),

    /// A `goto` or `merge` referenced a label never recorded.
    #[error("no such label: {0}")]
    MissingLabel(String),

    /// A precondition of the entry point does not hold.
    #[error("{0}")]
    Precondition(String),
}
