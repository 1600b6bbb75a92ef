// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `serve`: Start the HTTP server (default)
//! - `validate`: Validate configuration file
//! - `hash-secret`: Hash a secret for the configuration file
//! - `version`: Show version information

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// Tollgate - session, rate limit and permission gateway
#[derive(Parser, Debug)]
#[command(
    name = "tollgate",
    author = "Sylvex <contact@sylvex.io>",
    version = tollgate_core::VERSION,
    about = "Session, rate limit and permission gateway",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "tollgate.yaml",
        env = "TOLLGATE_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        default_value = "info",
        env = "TOLLGATE_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json, compact)
    #[arg(long, default_value = "text", env = "TOLLGATE_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

    /// Enable quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the HTTP server
    ///
    /// This is the default command when no subcommand is specified.
    Serve(ServeArgs),

    /// Validate the configuration file
    ///
    /// Loads the file, applies environment overrides and checks every value
    /// the server needs, without binding a port or connecting to the store.
    Validate(ValidateArgs),

    /// Hash a secret
    ///
    /// Prints an argon2 PHC string suitable for `admin.secret_hash` or a
    /// user's `password_hash`.
    #[command(name = "hash-secret")]
    HashSecret(HashSecretArgs),

    /// Show detailed version information
    Version,
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `serve` command.
#[derive(Args, Debug, Default, Clone)]
pub struct ServeArgs {
    /// Override the listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Run without a config file (defaults plus environment overrides)
    #[arg(long)]
    pub no_config: bool,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug, Default, Clone)]
pub struct ValidateArgs {
    /// Show parsed configuration after validation
    #[arg(short, long)]
    pub show_config: bool,

    /// Output format for validation results
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the `hash-secret` command.
#[derive(Args, Debug, Clone)]
pub struct HashSecretArgs {
    /// Secret to hash
    #[arg(required_unless_present = "stdin")]
    pub value: Option<String>,

    /// Read the secret from stdin
    #[arg(long)]
    pub stdin: bool,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for programmatic parsing
    Json,
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective command, defaulting to `Serve` if none specified.
    pub fn effective_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Serve(ServeArgs::default()))
    }

    /// Get the effective log level based on flags.
    pub fn effective_log_level(&self) -> &str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            &self.log_level
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command() {
        let cli = Cli::parse_from(["tollgate"]);
        assert!(cli.command.is_none());
        assert!(matches!(cli.effective_command(), Commands::Serve(_)));
    }

    #[test]
    fn test_serve_port_override() {
        let cli = Cli::parse_from(["tollgate", "serve", "-p", "9000"]);
        match cli.command {
            Some(Commands::Serve(args)) => assert_eq!(args.port, Some(9000)),
            other => panic!("Expected Serve command, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_command() {
        let cli = Cli::parse_from(["tollgate", "validate", "--show-config", "-f", "json"]);
        match cli.command {
            Some(Commands::Validate(args)) => {
                assert!(args.show_config);
                assert_eq!(args.format, OutputFormat::Json);
            }
            other => panic!("Expected Validate command, got {:?}", other),
        }
    }

    #[test]
    fn test_hash_secret_command() {
        let cli = Cli::parse_from(["tollgate", "hash-secret", "s3cret"]);
        match cli.command {
            Some(Commands::HashSecret(args)) => {
                assert_eq!(args.value.as_deref(), Some("s3cret"));
                assert!(!args.stdin);
            }
            other => panic!("Expected HashSecret command, got {:?}", other),
        }
    }

    #[test]
    fn test_hash_secret_requires_value() {
        assert!(Cli::try_parse_from(["tollgate", "hash-secret"]).is_err());
    }

    #[test]
    fn test_config_path() {
        let cli = Cli::parse_from(["tollgate", "-c", "/etc/tollgate/tollgate.yaml"]);
        assert_eq!(cli.config, PathBuf::from("/etc/tollgate/tollgate.yaml"));
    }

    #[test]
    fn test_quiet_and_verbose() {
        let cli = Cli::parse_from(["tollgate", "-q"]);
        assert_eq!(cli.effective_log_level(), "warn");

        let cli = Cli::parse_from(["tollgate", "-v"]);
        assert_eq!(cli.effective_log_level(), "debug");
    }
}
