//! Core types for the store ratings platform.
//!
//! This module provides type-safe wrappers for the domain concepts shared by
//! the server and the CLI.

pub mod email;
pub mod id;
pub mod profile;
pub mod rating;
pub mod role;

pub use email::{Email, EmailError};
pub use id::*;
pub use profile::{
    DisplayName, PASSWORD_SPECIAL_CHARS, PostalAddress, Profile, ValidationError,
    check_password_policy,
};
pub use rating::{RatingSummary, RatingValue};
pub use role::Role;
