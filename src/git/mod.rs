//! git
//!
//! The single doorway to the repository. Object and ref reads go through
//! git2; worktree mutations shell out to the `git` binary. No other module
//! touches the repository directly.

pub mod interface;

pub use interface::{CherryPickOpts, CommitInfo, CommitOpts, Git, GitError, WorktreeStatus};
