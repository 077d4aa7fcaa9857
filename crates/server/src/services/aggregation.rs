//! Aggregation engine: rating averages and listings, always recomputed from
//! the ledger.

use store_ratings_core::access::policies;
use store_ratings_core::{Principal, RatingSummary, StoreId, UserId};

use super::ServiceError;
use crate::db::{Database, RatingRepository, StoreRepository};
use crate::models::{Rating, RatingWithRater, Store, StoreListing, StoreRatingSummary};

/// Read-side queries over stores and their ratings.
pub struct AggregationService<'a> {
    stores: StoreRepository<'a>,
    ratings: RatingRepository<'a>,
}

impl<'a> AggregationService<'a> {
    /// Create a new aggregation service.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self {
            stores: StoreRepository::new(db),
            ratings: RatingRepository::new(db),
        }
    }

    /// Mean (one decimal) and count of a store's ratings; zero when unrated.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if storage fails.
    pub async fn average_rating(&self, store_id: StoreId) -> Result<RatingSummary, ServiceError> {
        Ok(self.ratings.summary_for_store(store_id).await?)
    }

    /// Every rating a store has received, with rater email and name.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if storage fails.
    pub async fn ratings_for_store(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<RatingWithRater>, ServiceError> {
        Ok(self.ratings.list_for_store(store_id).await?)
    }

    /// The rating one user gave one store, if any.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if storage fails.
    pub async fn rating_for_user(
        &self,
        user_id: UserId,
        store_id: StoreId,
    ) -> Result<Option<Rating>, ServiceError> {
        Ok(self.ratings.find(user_id, store_id).await?)
    }

    /// Every rating on the platform with its rater.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if storage fails.
    pub async fn all_ratings(&self) -> Result<Vec<RatingWithRater>, ServiceError> {
        Ok(self.ratings.list_all_with_raters().await?)
    }

    /// Every store with its rating summary.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if storage fails.
    pub async fn store_listing(&self) -> Result<Vec<StoreListing>, ServiceError> {
        Ok(self.stores.list_with_summaries().await?)
    }

    /// A store's overall summary next to `viewer`'s own rating.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the store does not exist.
    pub async fn store_summary(
        &self,
        store_id: StoreId,
        viewer: UserId,
    ) -> Result<StoreRatingSummary, ServiceError> {
        let store = self.store(store_id).await?;
        let summary = self.average_rating(store.id).await?;
        let own = self.rating_for_user(viewer, store.id).await?;

        Ok(StoreRatingSummary {
            store_id: store.id,
            summary,
            your_rating: own.map(|r| r.value),
        })
    }

    /// Ratings a store received, for an admin or the store's own owner.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the store does not exist.
    /// Returns `ServiceError::Forbidden` if the caller is neither an admin
    /// nor the owner of this store.
    pub async fn ratings_received(
        &self,
        principal: &Principal,
        store_id: StoreId,
    ) -> Result<Vec<RatingWithRater>, ServiceError> {
        policies::VIEW_STORE_RATINGS.check_role(principal)?;
        let store = self.store(store_id).await?;
        policies::VIEW_STORE_RATINGS.check_scope(principal, Some(store.owner_id))?;

        self.ratings_for_store(store.id).await
    }

    async fn store(&self, store_id: StoreId) -> Result<Store, ServiceError> {
        self.stores
            .get(store_id)
            .await?
            .ok_or(ServiceError::NotFound("store"))
    }
}
