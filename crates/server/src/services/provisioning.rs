//! Admin provisioning of accounts and stores.

use secrecy::{ExposeSecret, SecretString};

use store_ratings_core::{Profile, Role, UserId, ValidationError};

use super::ServiceError;
use super::auth::{AccountInput, CredentialService, hash_password};
use crate::db::{Database, StoreRepository, UserRepository};
use crate::models::{StoreWithOwner, User};

/// Creates and removes accounts and stores on an admin's behalf.
pub struct ProvisioningService<'a> {
    db: &'a Database,
    owner_initial_password: &'a SecretString,
}

impl<'a> ProvisioningService<'a> {
    /// Create a new provisioning service. New store owners get
    /// `owner_initial_password` until they rotate it.
    #[must_use]
    pub const fn new(db: &'a Database, owner_initial_password: &'a SecretString) -> Self {
        Self {
            db,
            owner_initial_password,
        }
    }

    /// Create an `admin` or `user` account.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if `role` is `store_owner` or any
    /// field breaks a rule.
    /// Returns `ServiceError::DuplicateEmail` if the email is registered.
    pub async fn create_user(
        &self,
        input: AccountInput<'_>,
        role: Role,
    ) -> Result<User, ServiceError> {
        if !role.is_directly_provisionable() {
            return Err(ValidationError::RoleNotAssignable(role).into());
        }

        CredentialService::new(self.db)
            .create_account(input, role)
            .await
    }

    /// Create a store and its `store_owner` account in one transaction. The
    /// owner shares the store's name, email and address.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if any field breaks a rule.
    /// Returns `ServiceError::DuplicateEmail` if the email is used by any
    /// account or store; nothing is persisted in that case.
    pub async fn create_store_with_owner(
        &self,
        name: &str,
        email: &str,
        address: &str,
    ) -> Result<StoreWithOwner, ServiceError> {
        let profile = Profile::parse(name, email, address)?;
        let password_hash = hash_password(self.owner_initial_password.expose_secret()).await?;

        let (store, owner) = StoreRepository::new(self.db)
            .create_with_owner(&profile, &password_hash)
            .await?;

        tracing::info!(store_id = %store.id, owner_id = %owner.id, "Store provisioned");
        Ok(StoreWithOwner { store, owner })
    }

    /// Delete an account together with its store and ratings.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the account does not exist.
    pub async fn delete_user(&self, user_id: UserId) -> Result<(), ServiceError> {
        UserRepository::new(self.db)
            .delete(user_id)
            .await
            .map_err(|e| match ServiceError::from(e) {
                ServiceError::NotFound(_) => ServiceError::NotFound("user"),
                other => other,
            })?;

        tracing::info!(user_id = %user_id, "Account deleted");
        Ok(())
    }
}
