//! Rating ledger: submission with upsert-on-conflict semantics.

use serde::Deserialize;

use store_ratings_core::access::policies;
use store_ratings_core::{Principal, RatingValue, StoreId, UserId};

use super::ServiceError;
use crate::db::{Database, RatingRepository};
use crate::models::UpsertOutcome;

/// A rating as submitted. `value` stays a raw integer so identity is checked
/// before the range.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RatingInput {
    /// Account the rating is placed for; must be the caller.
    pub user_id: UserId,
    pub store_id: StoreId,
    #[serde(alias = "rating")]
    pub value: i64,
}

/// Writes to the ledger of one rating per `(user, store)`.
pub struct RatingLedger<'a> {
    ratings: RatingRepository<'a>,
}

impl<'a> RatingLedger<'a> {
    /// Create a new rating ledger.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self {
            ratings: RatingRepository::new(db),
        }
    }

    /// Record `principal`'s rating of a store, overwriting any earlier value.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` if `input.user_id` is not the caller.
    /// Returns `ServiceError::Validation` if the value is not 1-5.
    /// Returns `ServiceError::MissingReference` if the store does not exist.
    pub async fn submit_rating(
        &self,
        principal: &Principal,
        input: RatingInput,
    ) -> Result<UpsertOutcome, ServiceError> {
        policies::SUBMIT_RATING.check(principal, Some(input.user_id))?;
        let value = RatingValue::new(input.value)?;

        let outcome = self
            .ratings
            .upsert(input.user_id, input.store_id, value)
            .await?;

        tracing::info!(
            user_id = %input.user_id,
            store_id = %input.store_id,
            value = %value,
            created = outcome.created,
            "Rating recorded"
        );
        Ok(outcome)
    }
}
