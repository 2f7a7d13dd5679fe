//! start command - begin an interactive rebase
//!
//! Merges CLI flags over configured defaults into the persistent option
//! block, then hands off to the engine's `start` entry point.

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::core::config::Config;
use crate::engine::resume;
use crate::engine::StartParams;
use crate::git::Git;
use crate::state::RebaseOptions;
use crate::ui::output::Verbosity;

use super::exit_code;

/// Flags collected from the CLI for `start`.
#[derive(Debug, Clone, Default)]
pub struct StartArgs {
    pub upstream: String,
    pub branch: Option<String>,
    pub onto: Option<String>,
    pub autosquash: bool,
    pub no_autosquash: bool,
    pub keep_empty: bool,
    pub exec: Option<String>,
    pub preserve_merges: bool,
    pub force_rebase: bool,
}

/// Run `rsq start`.
pub fn run(args: StartArgs, cwd: &Path, verbosity: Verbosity) -> Result<i32> {
    let git = Git::open(cwd).context("failed to open repository")?;
    let config = Config::load(git.git_dir()).context("failed to load configuration")?;

    let autosquash = if args.no_autosquash {
        false
    } else {
        args.autosquash || config.autosquash.unwrap_or(false)
    };
    let opts = RebaseOptions {
        autosquash,
        keep_empty: args.keep_empty || config.keep_empty.unwrap_or(false),
        preserve_merges: args.preserve_merges,
        force_rebase: args.force_rebase,
        verbose: verbosity == Verbosity::Verbose || config.verbose.unwrap_or(false),
        exec_cmd: args.exec,
    };
    let params = StartParams {
        upstream: args.upstream,
        onto: args.onto,
        branch: args.branch,
        opts,
    };

    let outcome = resume::start(&git, &params, &config, verbosity)?;
    Ok(exit_code(outcome))
}
