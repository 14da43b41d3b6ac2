//! CLI command definitions and dispatch.

pub mod migrate;
pub mod repo;
pub mod user;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use filehub_core::config::AppConfig;
use filehub_core::error::AppError;
use filehub_database::DatabasePool;

use crate::output::OutputFormat;

/// FileHub administration
#[derive(Debug, Parser)]
#[command(name = "filehub-cli", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to the CONFIG_PATH search)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

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
    /// Apply database migrations
    Migrate,
    /// User management
    User(user::UserArgs),
    /// Repository management
    Repo(repo::RepoArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = load_config(self.config.as_deref())?;
        match &self.command {
            Commands::Migrate => migrate::execute(&config).await,
            Commands::User(args) => user::execute(args, &config, self.format).await,
            Commands::Repo(args) => repo::execute(args, &config).await,
        }
    }
}

/// Helper: load configuration from an explicit file or the search path
pub fn load_config(path: Option<&std::path::Path>) -> Result<AppConfig, AppError> {
    match path {
        Some(path) => AppConfig::load_from(Some(path)),
        None => AppConfig::load(),
    }
}

/// Helper: connect to the configured database
pub async fn connect(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(&config.database).await
}

/// Helper: read a password twice from the terminal
pub fn prompt_password(prompt: &str) -> Result<String, AppError> {
    dialoguer::Password::new()
        .with_prompt(prompt)
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {}", e)))
}
