//! Shell completions

use anyhow::Result;
use clap_complete::Shell;
use std::io;

pub fn handle(shell: Shell) -> Result<()> {
    let mut cmd = segskip::cli::command();
    clap_complete::generate(shell, &mut cmd, "segskip", &mut io::stdout());
    Ok(())
}
