//! Domain models for the ratings API.
//!
//! These types are what services return and routes serialize. Password
//! hashes never appear in them.

pub mod rating;
pub mod store;
pub mod user;

pub use rating::{Rating, RatingWithRater, StoreRatingSummary, UpsertOutcome};
pub use store::{Store, StoreListing, StoreWithOwner};
pub use user::User;
