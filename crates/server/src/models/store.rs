//! Store domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use store_ratings_core::{Email, RatingSummary, StoreId, UserId};

use super::user::User;

/// A rated store (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct Store {
    /// Unique store ID.
    pub id: StoreId,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: Email,
    /// Postal address.
    pub address: String,
    /// The store-owner account.
    pub owner_id: UserId,
    /// When the store was created.
    pub created_at: DateTime<Utc>,
}

/// A store with its current rating summary.
#[derive(Debug, Clone, Serialize)]
pub struct StoreListing {
    #[serde(flatten)]
    pub store: Store,
    #[serde(flatten)]
    pub summary: RatingSummary,
}

/// Result of provisioning a store: the store and its new owner account.
#[derive(Debug, Clone, Serialize)]
pub struct StoreWithOwner {
    pub store: Store,
    pub owner: User,
}
