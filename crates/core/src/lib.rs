//! Store Ratings Core - Shared domain types.
//!
//! This crate provides the types used across all store ratings components:
//! - `server` - JSON API for signup, login, provisioning and ratings
//! - `cli` - Command-line tools for migrations and admin bootstrap
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP. Validation, rating arithmetic and authorization policies
//! live here so every component applies them identically.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, roles, profile fields and rating values
//! - [`access`] - Declarative per-operation authorization policies

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod types;

pub use access::{AccessDenied, Policy, Principal, SelfScope};
pub use types::*;
