//! Store repository for database operations.

use chrono::{DateTime, Utc};

use store_ratings_core::{Profile, RatingSummary, Role, StoreId, UserId};

use super::users::{NewUser, insert_user};
use super::{Database, RepositoryError, stored_email};
use crate::models::{Store, StoreListing, User};

#[derive(sqlx::FromRow)]
struct StoreRow {
    id: i32,
    name: String,
    email: String,
    address: String,
    owner_id: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: StoreId::new(row.id),
            name: row.name,
            email: stored_email(&row.email)?,
            address: row.address,
            owner_id: UserId::new(row.owner_id),
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StoreListingRow {
    #[sqlx(flatten)]
    store: StoreRow,
    rating_sum: i64,
    rating_count: i64,
}

/// Repository for store operations.
pub struct StoreRepository<'a> {
    db: &'a Database,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a `store_owner` account and the store it owns in one
    /// transaction. Nothing is persisted if either insert fails.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already used by an
    /// account or a store.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_owner(
        &self,
        profile: &Profile,
        owner_password_hash: &str,
    ) -> Result<(Store, User), RepositoryError> {
        let pool = match self.db {
            Database::Postgres(pool) => pool,
            Database::Memory(store) => {
                return store.create_store_with_owner(profile, owner_password_hash);
            }
        };

        let mut tx = pool.begin().await?;

        let owner = insert_user(
            &mut *tx,
            &NewUser {
                profile,
                password_hash: owner_password_hash,
                role: Role::StoreOwner,
            },
        )
        .await?;

        let row = sqlx::query_as::<_, StoreRow>(
            r"
            INSERT INTO store (name, email, address, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, address, owner_id, created_at
            ",
        )
        .bind(profile.name.as_str())
        .bind(profile.email.as_str())
        .bind(profile.address.as_str())
        .bind(owner.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            RepositoryError::from_constraint(e, "store email already exists", "store owner")
        })?;

        tx.commit().await?;

        let store = Store::try_from(row)?;
        let owner = User {
            store_id: Some(store.id),
            ..owner
        };
        Ok((store, owner))
    }

    /// Get a store by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let pool = match self.db {
            Database::Postgres(pool) => pool,
            Database::Memory(store) => return Ok(store.store_by_id(id)),
        };

        let row = sqlx::query_as::<_, StoreRow>(
            r"
            SELECT id, name, email, address, owner_id, created_at
            FROM store
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        row.map(Store::try_from).transpose()
    }

    /// List every store with the sum and count of its ratings, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored email is invalid.
    pub async fn list_with_summaries(&self) -> Result<Vec<StoreListing>, RepositoryError> {
        let pool = match self.db {
            Database::Postgres(pool) => pool,
            Database::Memory(store) => return Ok(store.list_stores()),
        };

        let rows = sqlx::query_as::<_, StoreListingRow>(
            r"
            SELECT s.id, s.name, s.email, s.address, s.owner_id, s.created_at,
                   COALESCE(SUM(r.value), 0)::BIGINT AS rating_sum,
                   COUNT(r.id) AS rating_count
            FROM store s
            LEFT JOIN rating r ON r.store_id = s.id
            GROUP BY s.id
            ORDER BY s.id
            ",
        )
        .fetch_all(pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(StoreListing {
                    summary: RatingSummary::from_totals(row.rating_sum, row.rating_count),
                    store: row.store.try_into()?,
                })
            })
            .collect()
    }
}
