//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// linkmasker - outbound link masking and redirect service
#[derive(Parser)]
#[command(name = "linkmasker")]
#[command(version)]
#[command(about = "Mask outbound links behind your own domain", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short = 'c', global = true, default_value = "config.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Write a sample configuration file
    ConfigGen {
        /// Output path (default: config.example.toml)
        path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Generate a new AES-256 link encryption key
    GenKey {
        /// Store the key in the options table instead of printing it
        #[arg(long)]
        store: bool,
    },

    /// Delete redirect logs older than N days
    PurgeLogs {
        /// Retention in days (default: logs.log_duration)
        #[arg(long)]
        days: Option<u32>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_serve_with_default_config() {
        let cli = Cli::parse_from(["linkmasker"]);
        assert_eq!(cli.config, "config.toml");
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_subcommands() {
        let cli = Cli::parse_from(["linkmasker", "-c", "/etc/lm.toml", "gen-key", "--store"]);
        assert_eq!(cli.config, "/etc/lm.toml");
        assert_eq!(cli.command, Some(Commands::GenKey { store: true }));

        let cli = Cli::parse_from(["linkmasker", "config-gen", "out.toml"]);
        assert_eq!(
            cli.command,
            Some(Commands::ConfigGen {
                path: Some("out.toml".to_string()),
                force: false
            })
        );

        let cli = Cli::parse_from(["linkmasker", "purge-logs", "--days", "30"]);
        assert_eq!(cli.command, Some(Commands::PurgeLogs { days: Some(30) }));
    }
}
