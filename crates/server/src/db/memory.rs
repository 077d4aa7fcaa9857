//! In-memory storage backend.
//!
//! Mirrors the `PostgreSQL` schema rules: case-insensitive unique emails per
//! table, one store per owner, one rating per `(user, store)`, foreign keys
//! and `ON DELETE CASCADE`. Every operation runs under a single lock
//! acquisition and never awaits while holding it, so composite writes are
//! atomic.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use store_ratings_core::{
    Email, Profile, RatingId, RatingSummary, RatingValue, Role, StoreId, UserId,
};

use super::RepositoryError;
use super::users::NewUser;
use crate::models::{Rating, RatingWithRater, Store, StoreListing, UpsertOutcome, User};

#[derive(Debug, Clone)]
struct UserRecord {
    id: UserId,
    name: String,
    email: Email,
    address: String,
    password_hash: String,
    role: Role,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, UserRecord>,
    stores: BTreeMap<StoreId, Store>,
    ratings: BTreeMap<RatingId, Rating>,
    last_user_id: i32,
    last_store_id: i32,
    last_rating_id: i32,
}

impl Tables {
    fn user_email_taken(&self, email: &Email) -> bool {
        self.users.values().any(|u| u.email.matches(email.as_str()))
    }

    fn store_email_taken(&self, email: &Email) -> bool {
        self.stores.values().any(|s| s.email.matches(email.as_str()))
    }

    fn store_owned_by(&self, owner: UserId) -> Option<StoreId> {
        self.stores
            .values()
            .find(|s| s.owner_id == owner)
            .map(|s| s.id)
    }

    fn to_user(&self, record: &UserRecord) -> User {
        User {
            id: record.id,
            name: record.name.clone(),
            email: record.email.clone(),
            address: record.address.clone(),
            role: record.role,
            store_id: self.store_owned_by(record.id),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    fn insert_user(&mut self, new: &NewUser<'_>) -> Result<User, RepositoryError> {
        if self.user_email_taken(&new.profile.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        self.last_user_id += 1;
        let now = Utc::now();
        let record = UserRecord {
            id: UserId::new(self.last_user_id),
            name: new.profile.name.as_str().to_owned(),
            email: new.profile.email.clone(),
            address: new.profile.address.as_str().to_owned(),
            password_hash: new.password_hash.to_owned(),
            role: new.role,
            created_at: now,
            updated_at: now,
        };
        let user = self.to_user(&record);
        self.users.insert(record.id, record);
        Ok(user)
    }

    fn totals_for(&self, store_id: StoreId) -> RatingSummary {
        RatingSummary::from_values(
            self.ratings
                .values()
                .filter(|r| r.store_id == store_id)
                .map(|r| r.value),
        )
    }

    fn with_rater(&self, rating: &Rating) -> Option<RatingWithRater> {
        let rater = self.users.get(&rating.user_id)?;
        Some(RatingWithRater {
            id: rating.id,
            user_id: rating.user_id,
            store_id: rating.store_id,
            value: rating.value,
            user_email: rater.email.clone(),
            user_name: rater.name.clone(),
            created_at: rating.created_at,
            updated_at: rating.updated_at,
        })
    }
}

/// Process-local tables behind one mutex.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        // Every write completes before the guard drops, so a poisoned lock
        // still guards consistent tables.
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn insert_user(&self, new: &NewUser<'_>) -> Result<User, RepositoryError> {
        self.lock().insert_user(new)
    }

    pub(crate) fn user_by_email(&self, email: &Email) -> Option<(User, String)> {
        let tables = self.lock();
        tables
            .users
            .values()
            .find(|u| u.email.matches(email.as_str()))
            .map(|record| (tables.to_user(record), record.password_hash.clone()))
    }

    pub(crate) fn user_by_id(&self, id: UserId) -> Option<User> {
        let tables = self.lock();
        tables.users.get(&id).map(|record| tables.to_user(record))
    }

    pub(crate) fn list_users(&self) -> Vec<User> {
        let tables = self.lock();
        tables.users.values().map(|r| tables.to_user(r)).collect()
    }

    pub(crate) fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        let record = tables.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        password_hash.clone_into(&mut record.password_hash);
        record.updated_at = Utc::now();
        Ok(())
    }

    pub(crate) fn delete_user(&self, id: UserId) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        if tables.users.remove(&id).is_none() {
            return Err(RepositoryError::NotFound);
        }

        let owned: Vec<StoreId> = tables
            .stores
            .values()
            .filter(|s| s.owner_id == id)
            .map(|s| s.id)
            .collect();
        tables.stores.retain(|_, s| s.owner_id != id);
        tables
            .ratings
            .retain(|_, r| r.user_id != id && !owned.contains(&r.store_id));
        Ok(())
    }

    pub(crate) fn create_store_with_owner(
        &self,
        profile: &Profile,
        owner_password_hash: &str,
    ) -> Result<(Store, User), RepositoryError> {
        let mut tables = self.lock();

        // Both checks run before either insert so a conflict leaves no rows.
        if tables.user_email_taken(&profile.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        if tables.store_email_taken(&profile.email) {
            return Err(RepositoryError::Conflict(
                "store email already exists".to_owned(),
            ));
        }

        let owner = tables.insert_user(&NewUser {
            profile,
            password_hash: owner_password_hash,
            role: Role::StoreOwner,
        })?;

        tables.last_store_id += 1;
        let store = Store {
            id: StoreId::new(tables.last_store_id),
            name: profile.name.as_str().to_owned(),
            email: profile.email.clone(),
            address: profile.address.as_str().to_owned(),
            owner_id: owner.id,
            created_at: Utc::now(),
        };
        tables.stores.insert(store.id, store.clone());

        let owner = User {
            store_id: Some(store.id),
            ..owner
        };
        Ok((store, owner))
    }

    pub(crate) fn store_by_id(&self, id: StoreId) -> Option<Store> {
        self.lock().stores.get(&id).cloned()
    }

    pub(crate) fn list_stores(&self) -> Vec<StoreListing> {
        let tables = self.lock();
        tables
            .stores
            .values()
            .map(|store| StoreListing {
                store: store.clone(),
                summary: tables.totals_for(store.id),
            })
            .collect()
    }

    pub(crate) fn upsert_rating(
        &self,
        user_id: UserId,
        store_id: StoreId,
        value: RatingValue,
    ) -> Result<UpsertOutcome, RepositoryError> {
        let mut tables = self.lock();
        if !tables.users.contains_key(&user_id) {
            return Err(RepositoryError::MissingReference("user does not exist".to_owned()));
        }
        if !tables.stores.contains_key(&store_id) {
            return Err(RepositoryError::MissingReference(
                "store does not exist".to_owned(),
            ));
        }

        let now = Utc::now();
        if let Some(existing) = tables
            .ratings
            .values_mut()
            .find(|r| r.user_id == user_id && r.store_id == store_id)
        {
            existing.value = value;
            existing.updated_at = now;
            return Ok(UpsertOutcome {
                rating: existing.clone(),
                created: false,
            });
        }

        tables.last_rating_id += 1;
        let rating = Rating {
            id: RatingId::new(tables.last_rating_id),
            user_id,
            store_id,
            value,
            created_at: now,
            updated_at: now,
        };
        tables.ratings.insert(rating.id, rating.clone());
        Ok(UpsertOutcome {
            rating,
            created: true,
        })
    }

    pub(crate) fn ratings_with_raters(&self, store_id: Option<StoreId>) -> Vec<RatingWithRater> {
        let tables = self.lock();
        tables
            .ratings
            .values()
            .filter(|r| store_id.is_none_or(|id| r.store_id == id))
            .filter_map(|r| tables.with_rater(r))
            .collect()
    }

    pub(crate) fn find_rating(&self, user_id: UserId, store_id: StoreId) -> Option<Rating> {
        self.lock()
            .ratings
            .values()
            .find(|r| r.user_id == user_id && r.store_id == store_id)
            .cloned()
    }

    pub(crate) fn summary_for_store(&self, store_id: StoreId) -> RatingSummary {
        self.lock().totals_for(store_id)
    }
}
