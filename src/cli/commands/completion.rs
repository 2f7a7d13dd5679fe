//! completion command - generate shell completion scripts

use anyhow::Result;
use clap::CommandFactory as _;
use clap_complete::Shell;

use crate::cli::args::Cli;

/// Run `rsq completion <shell>`.
pub fn run(shell: Shell) -> Result<i32> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "rsq", &mut std::io::stdout());
    Ok(0)
}
