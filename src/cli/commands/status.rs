//! status command - report on the rebase in progress
//!
//! Read-only: consults the state directory and the oracle, mutates
//! nothing.

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::git::Git;
use crate::state::StateStore;
use crate::todo::TodoLine;
use crate::ui::output::{self, Verbosity};

/// Run `rsq status`.
pub fn run(cwd: &Path, verbosity: Verbosity) -> Result<i32> {
    let git = Git::open(cwd).context("failed to open repository")?;
    if !StateStore::in_progress(git.git_dir()) {
        output::print("No rebase in progress.", verbosity);
        return Ok(0);
    }
    let store = StateStore::open(git.git_dir())?;

    let done = store.read_done()?;
    let todo = store.read_todo()?;
    let done_count = done.instructions().count();
    let total = done_count + todo.instructions().count();

    let head_name = store
        .read_head_name()?
        .unwrap_or_else(|| "detached HEAD".to_string());
    if let Some(onto) = store.read_onto()? {
        output::print(
            format!("Rebasing {head_name} onto {}", onto.short(7)),
            verbosity,
        );
    }
    output::print(
        format!("{done_count}/{total} instructions done"),
        verbosity,
    );

    if let Some(stopped) = store.read_stopped_sha()? {
        let summary = git
            .commit_info(&stopped)
            .map(|info| info.summary)
            .unwrap_or_default();
        output::print(
            format!("Stopped at {} {summary}", stopped.short(7)),
            verbosity,
        );
    }
    if let Some(next) = todo.lines().iter().find(|l: &&TodoLine| !l.is_ignorable()) {
        output::print(format!("Next instruction: {}", next.raw), verbosity);
    }
    Ok(0)
}
