//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use store_ratings_core::{Email, Profile, Role, StoreId, UserId};

use super::{Database, RepositoryError, stored_email};
use crate::models::User;

/// Columns selected for a [`User`]; `store_id` comes from a join on `store`.
const USER_COLUMNS: &str = "u.id, u.name, u.email, u.address, u.role, s.id AS store_id, \
                            u.created_at, u.updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    address: String,
    role: Role,
    store_id: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::new(row.id),
            name: row.name,
            email: stored_email(&row.email)?,
            address: row.address,
            role: row.role,
            store_id: row.store_id.map(StoreId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// Validated input for a new account row.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    /// Name, email and address.
    pub profile: &'a Profile,
    /// Argon2 PHC string.
    pub password_hash: &'a str,
    /// Role, fixed for the lifetime of the account.
    pub role: Role,
}

/// Insert an account row on any executor (pool or open transaction).
pub(crate) async fn insert_user<'e, E>(
    executor: E,
    new: &NewUser<'_>,
) -> Result<User, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, UserRow>(
        r"
        INSERT INTO app_user (name, email, address, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, name, email, address, role, NULL::INTEGER AS store_id,
                  created_at, updated_at
        ",
    )
    .bind(new.profile.name.as_str())
    .bind(new.profile.email.as_str())
    .bind(new.profile.address.as_str())
    .bind(new.password_hash)
    .bind(new.role)
    .fetch_one(executor)
    .await
    .map_err(|e| RepositoryError::from_constraint(e, "email already exists", "user"))?;

    row.try_into()
}

/// Repository for account operations.
pub struct UserRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Get a user and their password hash by email, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let pool = match self.db {
            Database::Postgres(pool) => pool,
            Database::Memory(store) => return Ok(store.user_by_email(email)),
        };

        let row = sqlx::query_as::<_, UserWithHashRow>(&format!(
            r"
            SELECT {USER_COLUMNS}, u.password_hash
            FROM app_user u
            LEFT JOIN store s ON s.owner_id = u.id
            WHERE lower(u.email) = lower($1)
            "
        ))
        .bind(email.as_str())
        .fetch_optional(pool)
        .await?;

        row.map(|r| Ok((r.user.try_into()?, r.password_hash)))
            .transpose()
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let pool = match self.db {
            Database::Postgres(pool) => pool,
            Database::Memory(store) => return Ok(store.user_by_id(id)),
        };

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            SELECT {USER_COLUMNS}
            FROM app_user u
            LEFT JOIN store s ON s.owner_id = u.id
            WHERE u.id = $1
            "
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// List every account, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored email is invalid.
    pub async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let pool = match self.db {
            Database::Postgres(pool) => pool,
            Database::Memory(store) => return Ok(store.list_users()),
        };

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r"
            SELECT {USER_COLUMNS}
            FROM app_user u
            LEFT JOIN store s ON s.owner_id = u.id
            ORDER BY u.id
            "
        ))
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewUser<'_>) -> Result<User, RepositoryError> {
        match self.db {
            Database::Postgres(pool) => insert_user(pool, new).await,
            Database::Memory(store) => store.insert_user(new),
        }
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let pool = match self.db {
            Database::Postgres(pool) => pool,
            Database::Memory(store) => return store.update_password(id, password_hash),
        };

        let result = sqlx::query(
            r"
            UPDATE app_user
            SET password_hash = $2, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete an account. The schema cascades to its store and every rating
    /// placed by the account or received by its store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let pool = match self.db {
            Database::Postgres(pool) => pool,
            Database::Memory(store) => return store.delete_user(id),
        };

        let result = sqlx::query("DELETE FROM app_user WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
