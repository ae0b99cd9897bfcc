//! CLI definitions for segskip
//!
//! Lives in the library so xtask can render the man page from it.

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Version string with build date and, for dev builds, the commit.
pub fn long_version() -> String {
    let date = env!("SEGSKIP_BUILD_DATE");
    match option_env!("VERGEN_GIT_SHA") {
        Some(sha) if sha != "unknown" => {
            format!("{} ({} {})", env!("CARGO_PKG_VERSION"), &sha[..sha.len().min(7)], date)
        }
        _ => format!("{} ({})", env!("CARGO_PKG_VERSION"), date),
    }
}

/// The clap command with build info attached.
pub fn command() -> clap::Command {
    Cli::command().long_version(long_version())
}

#[derive(Parser, Debug)]
#[command(name = "segskip")]
#[command(version)]
#[command(about = "Skip crowd-sourced segments while tracking an unreliable playback clock")]
#[command(
    long_about = "Skip crowd-sourced segments while tracking an unreliable playback clock.

Segments are time ranges (sponsor reads, intros, ...) fetched per video.
segskip waits until playback reaches a segment, then seeks past it,
chaining overlapping and adjacent segments into a single skip.

EXAMPLES:
    segskip validate segments/abc.json        Check a segment file
    segskip plan segments/abc.json            Show where skips would happen
    segskip simulate segments abc --duration 120 --speed 10
                                              Run a simulated session

CONFIGURATION:
    ~/.config/segskip/config.toml (override with $SEGSKIP_CONFIG)
    Logging: RUST_LOG, or -v / -vv"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a segment file for invalid or misordered segments
    #[command(long_about = "Check a segment file for invalid or misordered segments.

The file uses the segment server's response format:
    [{\"UUID\": \"...\", \"category\": \"sponsor\", \"segment\": [start, end]}]

Every segment must be longer than 0.1 seconds and start times must be
strictly increasing. Exits with status 1 when the list is invalid.")]
    Validate {
        /// Segment file (JSON)
        file: PathBuf,
    },

    /// Show the skips a session would perform
    #[command(long_about = "Show the skips a session would perform.

Walks the segments from --from onwards the way the scheduler would:
each checkpoint with its chained end and the position the skip lands on.
Margins come from the [skip] section of the config file.")]
    Plan {
        /// Segment file (JSON)
        file: PathBuf,

        /// Media time to start from, in seconds
        #[arg(long, default_value_t = 0.0)]
        from: f64,
    },

    /// Run a monitored session against a simulated player
    Simulate(SimulateArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(clap::Args, Debug)]
#[command(long_about = "Run a monitored session against a simulated player.

Plays the given videos in order in a wall-clock driven player and skips
their segments, read from <DIR>/<VIDEO_ID>.json. Each skip is printed.
Press Ctrl-C to stop early.")]
pub struct SimulateArgs {
    /// Directory with one <VIDEO_ID>.json segment file per video
    pub dir: PathBuf,

    /// Videos to play, in order
    #[arg(required = true)]
    pub video_ids: Vec<String>,

    /// Duration of each video in seconds
    #[arg(long)]
    pub duration: f64,

    /// Playback speed multiplier
    #[arg(long, default_value_t = 1.0)]
    pub speed: f64,

    /// How long the player keeps reporting the old position after a seek
    #[arg(long, default_value_t = 0)]
    pub seek_latency_ms: u64,

    /// Start playing the first video at this time, in seconds
    #[arg(long, default_value_t = 0.0)]
    pub start: f64,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Print the config file path
    Path,
    /// Open configuration file in $EDITOR
    Edit,
    /// Add missing fields with their default values
    Migrate {
        /// Apply without asking
        #[arg(short, long)]
        yes: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_simulate() {
        let cli = Cli::try_parse_from([
            "segskip",
            "simulate",
            "segments",
            "abc",
            "def",
            "--duration",
            "60",
            "--speed",
            "4",
        ])
        .unwrap();
        match cli.command {
            Commands::Simulate(args) => {
                assert_eq!(args.video_ids, vec!["abc", "def"]);
                assert_eq!(args.duration, 60.0);
                assert_eq!(args.speed, 4.0);
                assert_eq!(args.seek_latency_ms, 0);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn verbose_is_counted() {
        let cli = Cli::try_parse_from(["segskip", "-vv", "validate", "x.json"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn long_version_starts_with_package_version() {
        assert!(long_version().starts_with(env!("CARGO_PKG_VERSION")));
    }
}
