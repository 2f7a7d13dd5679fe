//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--quiet` / `-q`: Minimal output
//! - `--verbose` / `-v`: Extra progress output and a closing diffstat

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Interactive history rewriting for Git
#[derive(Parser, Debug)]
#[command(name = "rsq")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if rsq was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Extra output; also prints a diffstat when the rebase finishes
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Begin rewriting upstream..HEAD onto a new base
    Start {
        /// Commits reachable from this revision are left alone
        upstream: String,

        /// Branch to check out and rebase (default: the current branch)
        branch: Option<String>,

        /// Replay onto this revision instead of onto upstream itself
        #[arg(long, value_name = "REV")]
        onto: Option<String>,

        /// Move squash!/fixup! commits under their targets
        #[arg(long, conflicts_with = "no_autosquash")]
        autosquash: bool,

        /// Disable autosquash even if configured on
        #[arg(long)]
        no_autosquash: bool,

        /// Keep commits that do not change their parent's tree
        #[arg(long)]
        keep_empty: bool,

        /// Insert `exec <CMD>` after every pick
        #[arg(long, short = 'x', value_name = "CMD")]
        exec: Option<String>,

        /// Recreate merge commits with a label/goto/merge program
        #[arg(long)]
        preserve_merges: bool,

        /// Replay every commit even where fast-forwarding would do
        #[arg(long, short = 'f')]
        force_rebase: bool,
    },

    /// Resume after resolving a conflict or finishing an edit
    #[command(name = "continue")]
    Continue,

    /// Drop the instruction that paused and move on
    Skip,

    /// Abandon the rebase and remove its state
    Abort,

    /// Reopen the remaining instruction stream in the editor
    #[command(name = "edit-todo")]
    EditTodo,

    /// Show progress of the rebase in progress
    Status,

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory as _;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_start_with_flags() {
        let cli = Cli::try_parse_from([
            "rsq",
            "start",
            "--onto",
            "main",
            "--autosquash",
            "-x",
            "make test",
            "main",
            "topic",
        ])
        .unwrap();
        match cli.command {
            Command::Start {
                upstream,
                branch,
                onto,
                autosquash,
                exec,
                ..
            } => {
                assert_eq!(upstream, "main");
                assert_eq!(branch.as_deref(), Some("topic"));
                assert_eq!(onto.as_deref(), Some("main"));
                assert!(autosquash);
                assert_eq!(exec.as_deref(), Some("make test"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn autosquash_flags_conflict() {
        assert!(Cli::try_parse_from(["rsq", "start", "--autosquash", "--no-autosquash", "main"])
            .is_err());
    }

    #[test]
    fn parses_resume_entry_points() {
        for (args, expect_continue) in [
            (vec!["rsq", "continue"], true),
            (vec!["rsq", "skip"], false),
        ] {
            let cli = Cli::try_parse_from(args).unwrap();
            assert_eq!(matches!(cli.command, Command::Continue), expect_continue);
        }
        assert!(matches!(
            Cli::try_parse_from(["rsq", "edit-todo"]).unwrap().command,
            Command::EditTodo
        ));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["rsq", "status", "--quiet"]).unwrap();
        assert!(cli.quiet);
    }
}
