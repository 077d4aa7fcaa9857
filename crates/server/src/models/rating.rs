//! Rating domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use store_ratings_core::{Email, RatingId, RatingSummary, RatingValue, StoreId, UserId};

/// The single rating a user holds for a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rating {
    pub id: RatingId,
    pub user_id: UserId,
    pub store_id: StoreId,
    pub value: RatingValue,
    pub created_at: DateTime<Utc>,
    /// Last time the value was overwritten.
    pub updated_at: DateTime<Utc>,
}

/// A rating joined with the account that placed it.
#[derive(Debug, Clone, Serialize)]
pub struct RatingWithRater {
    pub id: RatingId,
    pub user_id: UserId,
    pub store_id: StoreId,
    pub value: RatingValue,
    /// Email of the rater.
    pub user_email: Email,
    /// Display name of the rater.
    pub user_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of a rating submission.
#[derive(Debug, Clone, Serialize)]
pub struct UpsertOutcome {
    pub rating: Rating,
    /// `true` if this submission created the row, `false` if it overwrote
    /// an earlier value.
    pub created: bool,
}

/// Overall rating of a store next to the viewer's own rating.
#[derive(Debug, Clone, Serialize)]
pub struct StoreRatingSummary {
    pub store_id: StoreId,
    #[serde(flatten)]
    pub summary: RatingSummary,
    /// The viewer's rating, if they have rated the store.
    pub your_rating: Option<RatingValue>,
}
