//! Rating repository: the ledger of one rating per `(user, store)`.

use chrono::{DateTime, Utc};

use store_ratings_core::{RatingId, RatingSummary, RatingValue, StoreId, UserId};

use super::{Database, RepositoryError, stored_email};
use crate::models::{Rating, RatingWithRater, UpsertOutcome};

#[derive(sqlx::FromRow)]
struct RatingRow {
    id: i32,
    user_id: i32,
    store_id: i32,
    value: RatingValue,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RatingRow> for Rating {
    fn from(row: RatingRow) -> Self {
        Self {
            id: RatingId::new(row.id),
            user_id: UserId::new(row.user_id),
            store_id: StoreId::new(row.store_id),
            value: row.value,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    rating: RatingRow,
    created: bool,
}

#[derive(sqlx::FromRow)]
struct RatingWithRaterRow {
    #[sqlx(flatten)]
    rating: RatingRow,
    user_email: String,
    user_name: String,
}

impl TryFrom<RatingWithRaterRow> for RatingWithRater {
    type Error = RepositoryError;

    fn try_from(row: RatingWithRaterRow) -> Result<Self, Self::Error> {
        let rating = Rating::from(row.rating);
        Ok(Self {
            id: rating.id,
            user_id: rating.user_id,
            store_id: rating.store_id,
            value: rating.value,
            user_email: stored_email(&row.user_email)?,
            user_name: row.user_name,
            created_at: rating.created_at,
            updated_at: rating.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TotalsRow {
    rating_sum: i64,
    rating_count: i64,
}

const WITH_RATER_SELECT: &str = r"
    SELECT r.id, r.user_id, r.store_id, r.value, r.created_at, r.updated_at,
           u.email AS user_email, u.name AS user_name
    FROM rating r
    JOIN app_user u ON u.id = r.user_id
";

/// Repository for rating operations.
pub struct RatingRepository<'a> {
    db: &'a Database,
}

impl<'a> RatingRepository<'a> {
    /// Create a new rating repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert the rating or overwrite the value of the existing one.
    ///
    /// A single statement, so concurrent submissions for the same pair
    /// serialize on the unique constraint and the last commit wins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::MissingReference` if the user or store does
    /// not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn upsert(
        &self,
        user_id: UserId,
        store_id: StoreId,
        value: RatingValue,
    ) -> Result<UpsertOutcome, RepositoryError> {
        let pool = match self.db {
            Database::Postgres(pool) => pool,
            Database::Memory(store) => return store.upsert_rating(user_id, store_id, value),
        };

        // `xmax = 0` only for rows this statement inserted.
        let row = sqlx::query_as::<_, UpsertRow>(
            r"
            INSERT INTO rating (user_id, store_id, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, store_id)
            DO UPDATE SET value = EXCLUDED.value, updated_at = now()
            RETURNING id, user_id, store_id, value, created_at, updated_at,
                      (xmax = 0) AS created
            ",
        )
        .bind(user_id)
        .bind(store_id)
        .bind(value)
        .fetch_one(pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "rating", "user or store does not exist"))?;

        Ok(UpsertOutcome {
            rating: row.rating.into(),
            created: row.created,
        })
    }

    /// Every rating on the platform with its rater, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all_with_raters(&self) -> Result<Vec<RatingWithRater>, RepositoryError> {
        let pool = match self.db {
            Database::Postgres(pool) => pool,
            Database::Memory(store) => return Ok(store.ratings_with_raters(None)),
        };

        let rows = sqlx::query_as::<_, RatingWithRaterRow>(&format!(
            "{WITH_RATER_SELECT} ORDER BY r.id"
        ))
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(RatingWithRater::try_from).collect()
    }

    /// Ratings received by one store with their raters, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_store(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<RatingWithRater>, RepositoryError> {
        let pool = match self.db {
            Database::Postgres(pool) => pool,
            Database::Memory(store) => return Ok(store.ratings_with_raters(Some(store_id))),
        };

        let rows = sqlx::query_as::<_, RatingWithRaterRow>(&format!(
            "{WITH_RATER_SELECT} WHERE r.store_id = $1 ORDER BY r.id"
        ))
        .bind(store_id)
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(RatingWithRater::try_from).collect()
    }

    /// The rating `user_id` gave `store_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find(
        &self,
        user_id: UserId,
        store_id: StoreId,
    ) -> Result<Option<Rating>, RepositoryError> {
        let pool = match self.db {
            Database::Postgres(pool) => pool,
            Database::Memory(store) => return Ok(store.find_rating(user_id, store_id)),
        };

        let row = sqlx::query_as::<_, RatingRow>(
            r"
            SELECT id, user_id, store_id, value, created_at, updated_at
            FROM rating
            WHERE user_id = $1 AND store_id = $2
            ",
        )
        .bind(user_id)
        .bind(store_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Rating::from))
    }

    /// Mean and count of the ratings a store has received.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn summary_for_store(
        &self,
        store_id: StoreId,
    ) -> Result<RatingSummary, RepositoryError> {
        let pool = match self.db {
            Database::Postgres(pool) => pool,
            Database::Memory(store) => return Ok(store.summary_for_store(store_id)),
        };

        let totals = sqlx::query_as::<_, TotalsRow>(
            r"
            SELECT COALESCE(SUM(value), 0)::BIGINT AS rating_sum,
                   COUNT(*) AS rating_count
            FROM rating
            WHERE store_id = $1
            ",
        )
        .bind(store_id)
        .fetch_one(pool)
        .await?;

        Ok(RatingSummary::from_totals(
            totals.rating_sum,
            totals.rating_count,
        ))
    }
}
