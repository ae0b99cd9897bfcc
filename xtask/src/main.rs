//! Development tasks for segskip
//!
//! Run with `cargo run -p xtask -- <task>`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "xtask")]
struct Xtask {
    #[command(subcommand)]
    task: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Render man pages for segskip and its subcommands
    Man {
        /// Output directory
        #[arg(long, default_value = "target/man")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    match Xtask::parse().task {
        Task::Man { out } => generate_man_pages(&out),
    }
}

fn generate_man_pages(out: &Path) -> Result<()> {
    fs::create_dir_all(out).with_context(|| format!("Failed to create {}", out.display()))?;

    let cmd = segskip::cli::command();
    clap_mangen::generate_to(cmd, out).context("Failed to render man pages")?;

    println!("Man pages written to {}", out.display());
    Ok(())
}
