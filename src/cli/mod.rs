//! cli
//!
//! Command-line interface layer.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to command handlers
//! - Does NOT perform repository mutations directly
//!
//! The CLI layer is thin: it parses arguments via clap and dispatches to
//! [`crate::engine`]. All repository state changes flow through the
//! executor.

pub mod args;
pub mod commands;

pub use args::Cli;

use anyhow::Result;

/// Run the CLI application, returning the process exit code.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<i32> {
    commands::dispatch(Cli::parse_args())
}
