//! cli::commands
//!
//! Command handlers. Each handler opens the repository, delegates to the
//! engine, and maps the outcome to a process exit code.

pub mod completion;
pub mod resume;
pub mod start;
pub mod status;

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::args::{Cli, Command};
use crate::engine::Outcome;
use crate::ui::output::Verbosity;

/// Map an engine outcome to the process exit code.
pub fn exit_code(outcome: Outcome) -> i32 {
    match outcome {
        Outcome::Completed => 0,
        Outcome::Paused { exit_code } => exit_code,
    }
}

/// Dispatch a parsed command line.
pub fn dispatch(cli: Cli) -> Result<i32> {
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    let cwd: PathBuf = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Command::Start {
            upstream,
            branch,
            onto,
            autosquash,
            no_autosquash,
            keep_empty,
            exec,
            preserve_merges,
            force_rebase,
        } => start::run(
            start::StartArgs {
                upstream,
                branch,
                onto,
                autosquash,
                no_autosquash,
                keep_empty,
                exec,
                preserve_merges,
                force_rebase,
            },
            &cwd,
            verbosity,
        ),
        Command::Continue => resume::continue_rebase(&cwd, verbosity),
        Command::Skip => resume::skip(&cwd, verbosity),
        Command::Abort => resume::abort(&cwd, verbosity),
        Command::EditTodo => resume::edit_todo(&cwd),
        Command::Status => status::run(&cwd, verbosity),
        Command::Completion { shell } => completion::run(shell),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(exit_code(Outcome::Completed), 0);
        assert_eq!(exit_code(Outcome::Paused { exit_code: 0 }), 0);
        assert_eq!(exit_code(Outcome::Paused { exit_code: 1 }), 1);
        assert_eq!(exit_code(Outcome::Paused { exit_code: 5 }), 5);
    }
}
