//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use store_ratings_core::{Email, Principal, Role, StoreId, UserId};

/// A platform account (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: Email,
    /// Postal address.
    pub address: String,
    /// Role, fixed at creation.
    pub role: Role,
    /// The store this account owns, for store owners.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_id: Option<StoreId>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The identity a token issued for this user carries.
    #[must_use]
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.id,
            email: self.email.clone(),
            role: self.role,
        }
    }
}
