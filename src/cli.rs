//! CLI argument parsing for the address-cleanser binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "address-cleanser", about = "Geocode and normalize new source addresses")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = ".config")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Clean the next batch of addresses (default if no subcommand given)
    Run,
    /// Print the highest key already present in the target table and exit
    Cutoff,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_no_command_defaults_to_none() {
        let cli = Cli::parse_from(["address-cleanser"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from(".config"));
    }

    #[test]
    fn test_cli_cutoff_command_parses() {
        let cli = Cli::parse_from(["address-cleanser", "cutoff"]);
        assert_eq!(cli.command, Some(Command::Cutoff));
    }

    #[test]
    fn test_cli_config_path_parses() {
        let cli = Cli::parse_from(["address-cleanser", "--config", "/etc/cleanser.toml", "run"]);
        assert_eq!(cli.config, PathBuf::from("/etc/cleanser.toml"));
        assert_eq!(cli.command, Some(Command::Run));
    }
}
