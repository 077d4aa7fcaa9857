//! Credential store and bearer tokens.
//!
//! Accounts authenticate with email and password. A successful login or
//! signup returns a signed token (see [`TokenService`]) that the client
//! presents as `Authorization: Bearer <token>`.

mod error;
mod password;
mod token;

pub use error::AuthError;
pub use password::{hash_password, verify_password};
pub use token::{IssuedToken, TokenService};

use store_ratings_core::{Email, Profile, Role, UserId, check_password_policy};

use super::ServiceError;
use crate::db::{Database, NewUser, UserRepository};
use crate::models::User;

/// Raw account fields as submitted by a client.
#[derive(Debug, Clone, Copy)]
pub struct AccountInput<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub address: &'a str,
    pub password: &'a str,
}

impl AccountInput<'_> {
    /// Validate every field, in the order name, email, address, password.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError`.
    pub fn validate(&self) -> Result<Profile, ServiceError> {
        let profile = Profile::parse(self.name, self.email, self.address)?;
        check_password_policy(self.password)?;
        Ok(profile)
    }
}

/// Account creation, password checks and password rotation.
pub struct CredentialService<'a> {
    users: UserRepository<'a>,
}

impl<'a> CredentialService<'a> {
    /// Create a new credential service.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self {
            users: UserRepository::new(db),
        }
    }

    /// Validate input, hash the password and store a new account.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if any field breaks a rule.
    /// Returns `ServiceError::DuplicateEmail` if the email is registered.
    pub async fn create_account(
        &self,
        input: AccountInput<'_>,
        role: Role,
    ) -> Result<User, ServiceError> {
        let profile = input.validate()?;
        let password_hash = hash_password(input.password).await?;

        let user = self
            .users
            .create(&NewUser {
                profile: &profile,
                password_hash: &password_hash,
                role,
            })
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "Account created");
        Ok(user)
    }

    /// Check an email and password.
    ///
    /// An unknown email still costs one hash verification, and both failure
    /// cases return the same error.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Unauthenticated` if the credentials don't match.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        let found = match Email::parse(email.trim()) {
            Ok(email) => self.users.get_with_password_hash(&email).await?,
            Err(_) => None,
        };

        let (user, hash) = match found {
            Some((user, hash)) => (Some(user), Some(hash)),
            None => (None, None),
        };

        verify_password(password, hash).await?;
        user.ok_or(ServiceError::Unauthenticated(AuthError::InvalidCredentials))
    }

    /// Replace an account's password. The caller has already authorized the
    /// change (self or admin).
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if the password breaks the policy.
    /// Returns `ServiceError::NotFound` if the account does not exist.
    pub async fn update_password(&self, user_id: UserId, password: &str) -> Result<(), ServiceError> {
        check_password_policy(password)?;
        let password_hash = hash_password(password).await?;

        self.users
            .update_password(user_id, &password_hash)
            .await
            .map_err(|e| match ServiceError::from(e) {
                ServiceError::NotFound(_) => ServiceError::NotFound("user"),
                other => other,
            })?;

        tracing::info!(user_id = %user_id, "Password updated");
        Ok(())
    }

    /// Get an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the account does not exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, ServiceError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(ServiceError::NotFound("user"))
    }
}
