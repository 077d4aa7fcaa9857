//! Business logic for the ratings API.
//!
//! # Services
//!
//! - `auth` - Credential store, password hashing and bearer tokens
//! - `ledger` - Rating submission (one rating per user and store)
//! - `aggregation` - Per-store averages and rating listings
//! - `provisioning` - Admin creation and deletion of accounts and stores

pub mod aggregation;
pub mod auth;
mod error;
pub mod ledger;
pub mod provisioning;

pub use aggregation::AggregationService;
pub use auth::{AccountInput, CredentialService, TokenService};
pub use error::ServiceError;
pub use ledger::{RatingInput, RatingLedger};
pub use provisioning::ProvisioningService;
