//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: start the tracker and wait for a shutdown signal
//! - track-once: run one batch over every user and print the outcome
//! - nearby: print the five attractions closest to a user

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tourtrack - periodic location tracking for TourGuide users
#[derive(Parser, Debug)]
#[command(name = "tourtrack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the tracker and run until interrupted (default)
    Run,

    /// Refresh every user once and report the batch outcome
    TrackOnce {
        /// Batch deadline in seconds (defaults to the tracker interval)
        #[arg(short, long)]
        budget_secs: Option<u64>,
    },

    /// Show the five attractions closest to a user
    Nearby {
        /// User name, e.g. internalUser0
        user: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_no_args() {
        // No args means run the tracker
        let cli = Cli::try_parse_from(["tourtrack"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["tourtrack", "-v"]).unwrap();
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["tourtrack", "-c", "/path/to/tourtrack.yml"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/tourtrack.yml")));
    }

    #[test]
    fn test_run_command() {
        let cli = Cli::try_parse_from(["tourtrack", "run"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Run)));
    }

    #[test]
    fn test_track_once_command() {
        let cli = Cli::try_parse_from(["tourtrack", "track-once"]).unwrap();
        match cli.command {
            Some(Commands::TrackOnce { budget_secs }) => assert!(budget_secs.is_none()),
            _ => panic!("Expected track-once command"),
        }
    }

    #[test]
    fn test_track_once_with_budget() {
        let cli = Cli::try_parse_from(["tourtrack", "track-once", "-b", "30"]).unwrap();
        match cli.command {
            Some(Commands::TrackOnce { budget_secs }) => assert_eq!(budget_secs, Some(30)),
            _ => panic!("Expected track-once command"),
        }
    }

    #[test]
    fn test_nearby_command() {
        let cli = Cli::try_parse_from(["tourtrack", "nearby", "internalUser3"]).unwrap();
        match cli.command {
            Some(Commands::Nearby { user }) => assert_eq!(user, "internalUser3"),
            _ => panic!("Expected nearby command"),
        }
    }

    #[test]
    fn test_nearby_requires_user() {
        assert!(Cli::try_parse_from(["tourtrack", "nearby"]).is_err());
    }

    #[test]
    fn test_help_works() {
        // Verify help doesn't panic
        Cli::command().debug_assert();
    }
}
