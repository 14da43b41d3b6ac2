//! FileHub Server: WebDAV over local and object storage.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use filehub_api::AppState;
use filehub_core::config::AppConfig;
use filehub_core::error::AppError;
use filehub_database::DatabasePool;
use filehub_database::repositories::{PgRepositoryDirectory, PgUserDirectory};

#[tokio::main]
async fn main() {
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let default_level = if config.web.debug {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting FileHub v{}", env!("CARGO_PKG_VERSION"));

    if config.root_dir.is_empty() && config.s3.is_none() {
        tracing::warn!("Neither root_dir nor s3 is configured; no repository can be opened");
    }

    let db = DatabasePool::connect(&config.database).await?;
    db.prepare(&config.database).await?;

    let users = Arc::new(PgUserDirectory::new(db.pool().clone()));
    let repositories = Arc::new(PgRepositoryDirectory::new(db.pool().clone()));

    let state = AppState::new(config, users, repositories);
    let result = filehub_api::serve(state).await;

    db.close().await;
    result
}
