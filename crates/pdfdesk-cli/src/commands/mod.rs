//! CLI command definitions and dispatch.

pub mod config;
pub mod serve;
pub mod sweep;
pub mod tools;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use pdfdesk_core::config::AppConfig;
use pdfdesk_core::error::AppError;

/// PDFDesk, a self-hosted PDF toolkit server
#[derive(Debug, Parser)]
#[command(name = "pdfdesk", version, about, long_about = None)]
pub struct Cli {
    /// Path to a configuration file layered over config/default.toml
    #[arg(short, long, env = "PDFDESK_CONFIG")]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the PDFDesk server
    Serve(serve::ServeArgs),
    /// Run one retention sweep now
    Sweep(sweep::SweepArgs),
    /// Show external converter availability
    Tools,
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Whether the command starts the server.
    pub fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve(_))
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config_path = self.config.as_deref();
        match &self.command {
            Commands::Serve(args) => serve::execute(args, config_path).await,
            Commands::Sweep(args) => sweep::execute(args, config_path, self.format).await,
            Commands::Tools => tools::execute(config_path, self.format).await,
            Commands::Config(args) => config::execute(args, config_path, self.format).await,
        }
    }
}

/// Helper: load configuration
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_subcommands() {
        let cli = Cli::try_parse_from(["pdfdesk", "--format", "json", "tools"]).unwrap();
        assert!(matches!(cli.command, Commands::Tools));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(!cli.is_serve());

        let cli = Cli::try_parse_from(["pdfdesk", "serve", "--port", "8080"]).unwrap();
        assert!(cli.is_serve());

        let cli = Cli::try_parse_from(["pdfdesk", "sweep", "--older-than-hours", "0"]).unwrap();
        assert!(matches!(cli.command, Commands::Sweep(_)));
    }
}
