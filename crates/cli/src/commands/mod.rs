//! CLI subcommands.

pub mod admin;
pub mod migrate;

use secrecy::SecretString;
use thiserror::Error;

use store_ratings_server::db::Database;
use store_ratings_server::services::ServiceError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Account creation was rejected.
    #[error("{0}")]
    Service(#[from] ServiceError),
}

/// Connect to the database named by `RATINGS_DATABASE_URL` or `DATABASE_URL`.
pub(crate) async fn connect() -> Result<Database, CliError> {
    dotenvy::dotenv().ok();

    let url = std::env::var("RATINGS_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CliError::MissingEnvVar("RATINGS_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let db = Database::connect(&SecretString::from(url)).await?;

    if matches!(db, Database::Memory(_)) {
        tracing::warn!("memory:// storage lives only as long as this process; nothing will persist");
    }
    Ok(db)
}
