//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! sr-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `RATINGS_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! Migrations are embedded from `crates/server/migrations/`.

use super::{CliError, connect};

/// Apply every pending migration.
pub async fn run() -> Result<(), CliError> {
    let db = connect().await?;

    tracing::info!("Running migrations...");
    db.migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
