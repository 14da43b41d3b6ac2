//! User management CLI commands.

use std::sync::Arc;

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use filehub_auth::{CredentialStore, PasswordHasher};
use filehub_core::config::AppConfig;
use filehub_core::error::AppError;
use filehub_database::UserDirectory;
use filehub_database::repositories::PgUserDirectory;

use crate::output::{self, OutputFormat};

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Create a user
    Add {
        /// Username
        username: String,
        /// Grant administrator rights
        #[arg(long)]
        admin: bool,
        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Set a user's password
    Passwd {
        /// Username
        username: String,
        /// New password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// List all users
    List,
}

/// User display row for table output
#[derive(Debug, Serialize, Tabled)]
struct UserRow {
    id: String,
    username: String,
    admin: bool,
    active: bool,
    used_bytes: i64,
    created_at: String,
    last_login: String,
}

/// Execute user commands
pub async fn execute(
    args: &UserArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let pool = super::connect(config).await?;
    let users: Arc<dyn UserDirectory> = Arc::new(PgUserDirectory::new(pool.pool().clone()));
    let credentials = CredentialStore::new(
        Arc::clone(&users),
        PasswordHasher::new(config.auth.realm.clone()),
    );

    match &args.command {
        UserCommand::Add {
            username,
            admin,
            password,
        } => {
            let password = match password {
                Some(p) => p.clone(),
                None => super::prompt_password("Password")?,
            };
            let user = credentials.create_user(username, &password, *admin).await?;
            output::print_success(&format!("User '{}' created ({})", user.username, user.id));
        }
        UserCommand::Passwd { username, password } => {
            let user = users
                .find_by_username(username)
                .await?
                .ok_or_else(|| AppError::not_found(format!("User '{}' not found", username)))?;
            let password = match password {
                Some(p) => p.clone(),
                None => super::prompt_password("New password")?,
            };
            credentials.set_password(user.id, &password).await?;
            output::print_success(&format!("Password updated for '{}'", user.username));
        }
        UserCommand::List => {
            let rows: Vec<UserRow> = users
                .list()
                .await?
                .into_iter()
                .map(|u| UserRow {
                    id: u.id.to_string(),
                    username: u.username,
                    admin: u.is_admin,
                    active: u.is_active,
                    used_bytes: u.used_bytes,
                    created_at: u.created_at.format("%Y-%m-%d %H:%M").to_string(),
                    last_login: u
                        .last_login_at
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "-".to_string()),
                })
                .collect();

            output::print_list(&rows, format);
        }
    }

    pool.close().await;
    Ok(())
}
