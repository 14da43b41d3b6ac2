//! Database migration command.

use filehub_core::config::AppConfig;
use filehub_core::error::AppError;

use crate::output;

/// Apply all pending migrations.
pub async fn execute(config: &AppConfig) -> Result<(), AppError> {
    let pool = super::connect(config).await?;

    println!("Running database migrations...");
    filehub_database::migration::run_migrations(pool.pool()).await?;
    pool.close().await;

    output::print_success("All migrations applied successfully.");
    Ok(())
}
