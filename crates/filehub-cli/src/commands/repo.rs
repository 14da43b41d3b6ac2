//! Repository management CLI commands.

use clap::{Args, Subcommand};

use filehub_core::config::AppConfig;
use filehub_core::error::AppError;
use filehub_database::repositories::{PgRepositoryDirectory, PgUserDirectory};
use filehub_database::{RepositoryDirectory, UserDirectory};
use filehub_entity::repository::CreateRepository;

use crate::output;

/// Arguments for repository commands
#[derive(Debug, Args)]
pub struct RepoArgs {
    /// Repository subcommand
    #[command(subcommand)]
    pub command: RepoCommand,
}

/// Repository subcommands
#[derive(Debug, Subcommand)]
pub enum RepoCommand {
    /// Register a repository for a user
    Add {
        /// Owning username
        owner: String,
        /// Repository name
        name: String,
        /// Root URI: file:///abs/dir or s3://bucket/prefix
        root_uri: String,
    },
}

/// Execute repository commands
pub async fn execute(args: &RepoArgs, config: &AppConfig) -> Result<(), AppError> {
    let pool = super::connect(config).await?;
    let users = PgUserDirectory::new(pool.pool().clone());
    let repositories = PgRepositoryDirectory::new(pool.pool().clone());

    match &args.command {
        RepoCommand::Add {
            owner,
            name,
            root_uri,
        } => {
            let user = users
                .find_by_username(owner)
                .await?
                .ok_or_else(|| AppError::not_found(format!("User '{}' not found", owner)))?;
            let repo = repositories
                .create(CreateRepository {
                    owner_id: user.id,
                    name: name.clone(),
                    root_uri: root_uri.clone(),
                })
                .await?;
            output::print_success(&format!(
                "Repository '{}' created for '{}' at {}",
                repo.name, user.username, repo.root_uri
            ));
        }
    }

    pool.close().await;
    Ok(())
}
