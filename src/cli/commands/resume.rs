//! resume commands - continue, skip, abort, edit-todo
//!
//! Thin wrappers over the engine's resume entry points; each opens the
//! repository, delegates, and maps the outcome to an exit code.

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::core::config::Config;
use crate::engine::resume;
use crate::git::Git;
use crate::ui::output::{self, Verbosity};

use super::exit_code;

/// Run `rsq continue`.
pub fn continue_rebase(cwd: &Path, verbosity: Verbosity) -> Result<i32> {
    let git = Git::open(cwd).context("failed to open repository")?;
    let outcome = resume::continue_rebase(&git, verbosity)?;
    Ok(exit_code(outcome))
}

/// Run `rsq skip`.
pub fn skip(cwd: &Path, verbosity: Verbosity) -> Result<i32> {
    let git = Git::open(cwd).context("failed to open repository")?;
    let outcome = resume::skip(&git, verbosity)?;
    Ok(exit_code(outcome))
}

/// Run `rsq abort`.
pub fn abort(cwd: &Path, verbosity: Verbosity) -> Result<i32> {
    let git = Git::open(cwd).context("failed to open repository")?;
    resume::abort(&git)?;
    output::print("Rebase aborted.", verbosity);
    Ok(0)
}

/// Run `rsq edit-todo`.
pub fn edit_todo(cwd: &Path) -> Result<i32> {
    let git = Git::open(cwd).context("failed to open repository")?;
    let config = Config::load(git.git_dir()).context("failed to load configuration")?;
    resume::edit_todo(&git, &config)?;
    Ok(0)
}
