//! Admin account bootstrap.
//!
//! The HTTP API only lets an existing admin create admins, so the first one
//! is created here.
//!
//! # Usage
//!
//! ```bash
//! SR_ADMIN_PASSWORD='Secret@123' sr-cli admin create \
//!     -n "Platform Administrator" -e admin@example.com -a "1 Main Street"
//! ```
//!
//! # Environment Variables
//!
//! - `RATINGS_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `SR_ADMIN_PASSWORD` - Password of the new account; must satisfy the
//!   account password policy

use secrecy::{ExposeSecret, SecretString};

use store_ratings_core::{Role, UserId};
use store_ratings_server::services::{AccountInput, CredentialService};

use super::{CliError, connect};

const PASSWORD_ENV: &str = "SR_ADMIN_PASSWORD";

/// Create an admin account with the server's validation and hashing.
///
/// # Returns
///
/// The ID of the created account.
pub async fn create_admin(name: &str, email: &str, address: &str) -> Result<UserId, CliError> {
    let db = connect().await?;

    let password = std::env::var(PASSWORD_ENV)
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar(PASSWORD_ENV))?;

    tracing::info!("Creating admin account: {}", email);

    let user = CredentialService::new(&db)
        .create_account(
            AccountInput {
                name,
                email,
                address,
                password: password.expose_secret(),
            },
            Role::Admin,
        )
        .await?;

    tracing::info!(
        "Admin account created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(user.id)
}
