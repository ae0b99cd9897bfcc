//! segskip CLI entry point

mod commands;

use anyhow::Result;
use clap::FromArgMatches;
use tracing_subscriber::EnvFilter;

use segskip::cli::{Cli, Commands, ConfigCommands};

/// Log to stderr. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("segskip={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let matches = segskip::cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;
    init_logging(cli.verbose);

    match cli.command {
        Commands::Validate { file } => commands::validate::handle(&file),
        Commands::Plan { file, from } => commands::plan::handle(&file, from),
        Commands::Simulate(args) => commands::simulate::handle(&args),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::handle_show(),
            ConfigCommands::Path => commands::config::handle_path(),
            ConfigCommands::Edit => commands::config::handle_edit(),
            ConfigCommands::Migrate { yes } => commands::config::handle_migrate(yes),
        },
        Commands::Completions { shell } => commands::completions::handle(shell),
    }
}
