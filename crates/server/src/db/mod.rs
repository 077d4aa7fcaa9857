//! Storage for accounts, stores and ratings.
//!
//! # Backends
//!
//! - `PostgreSQL` (`postgres://...`): production storage, schema managed by
//!   the migrations in `crates/server/migrations/`.
//! - In-memory (`memory://`): a process-local table set enforcing the same
//!   uniqueness, foreign-key and cascade rules. Used by tests and demos.
//!
//! ## Tables
//!
//! - `app_user` - Accounts for every role, unique on `lower(email)`
//! - `store` - One store per `store_owner` account, cascades from its owner
//! - `rating` - At most one row per `(user_id, store_id)`
//!
//! # Migrations
//!
//! ```bash
//! cargo run -p store-ratings-cli -- migrate
//! ```

pub mod memory;
pub mod ratings;
pub mod stores;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use store_ratings_core::Email;

pub use memory::MemoryStore;
pub use ratings::RatingRepository;
pub use stores::StoreRepository;
pub use users::{NewUser, UserRepository};

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// URL scheme that selects the in-memory backend.
pub const MEMORY_URL_PREFIX: &str = "memory://";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation (e.g., email already taken).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Foreign key violation: a referenced row does not exist.
    #[error("missing reference: {0}")]
    MissingReference(String),
}

impl RepositoryError {
    /// Translate storage constraint codes into repository errors.
    ///
    /// `conflict` and `missing` describe what the unique and foreign-key
    /// constraints of the statement protect.
    pub(crate) fn from_constraint(err: sqlx::Error, conflict: &str, missing: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::Conflict(conflict.to_owned());
            }
            if db_err.is_foreign_key_violation() {
                return Self::MissingReference(missing.to_owned());
            }
        }
        Self::Database(err)
    }
}

/// Parse an email read back from storage.
pub(crate) fn stored_email(raw: &str) -> Result<Email, RepositoryError> {
    Email::parse(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))
}

/// Handle to the configured storage backend.
///
/// Cheap to clone; repositories borrow it for the duration of a call.
#[derive(Debug, Clone)]
pub enum Database {
    /// `PostgreSQL` connection pool.
    Postgres(PgPool),
    /// Process-local tables.
    Memory(Arc<MemoryStore>),
}

impl Database {
    /// Connect to the backend named by `database_url`.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if a `PostgreSQL` connection cannot be established.
    pub async fn connect(database_url: &SecretString) -> Result<Self, sqlx::Error> {
        if database_url.expose_secret().starts_with(MEMORY_URL_PREFIX) {
            return Ok(Self::in_memory());
        }
        create_pool(database_url).await.map(Self::Postgres)
    }

    /// Fresh, empty in-memory storage.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::Memory(Arc::new(MemoryStore::default()))
    }

    /// Short backend name for logs.
    #[must_use]
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }

    /// Apply pending migrations. A no-op for the in-memory backend.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::migrate::MigrateError` if a migration fails.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        match self {
            Self::Postgres(pool) => MIGRATOR.run(pool).await,
            Self::Memory(_) => Ok(()),
        }
    }

    /// Check that the backend answers queries.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the round trip fails.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        match self {
            Self::Postgres(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
                Ok(())
            }
            Self::Memory(_) => Ok(()),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
