//! Declarative authorization policies.
//!
//! Every protected operation is described by a [`Policy`]: the roles allowed
//! to invoke it and whether the caller must also be the account the request
//! targets. Handlers check the policy against the [`Principal`] decoded from
//! the caller's bearer token.
//!
//! ```
//! use store_ratings_core::{Email, Principal, Role, UserId};
//! use store_ratings_core::access::policies;
//!
//! let alice = Principal {
//!     user_id: UserId::new(1),
//!     email: Email::parse("alice@example.com").unwrap(),
//!     role: Role::User,
//! };
//!
//! assert!(policies::CREATE_STORE.check_role(&alice).is_err());
//! assert!(policies::SUBMIT_RATING.check(&alice, Some(UserId::new(1))).is_ok());
//! assert!(policies::SUBMIT_RATING.check(&alice, Some(UserId::new(2))).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Email, Role, UserId};

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Account the caller authenticated as.
    pub user_id: UserId,
    /// Email of that account at the time the token was issued.
    pub email: Email,
    /// Role of that account.
    pub role: Role,
}

/// How an operation relates the caller to the account it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfScope {
    /// Any caller with an allowed role may act on any target.
    Unscoped,
    /// The caller must be the target account.
    Required,
    /// The caller must be the target account unless they hold one of these
    /// roles.
    RequiredUnless(&'static [Role]),
}

/// Why a policy rejected a caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenied {
    /// The caller's role is not allowed.
    #[error("role {role} is not allowed to {operation}")]
    Role {
        /// Operation that was attempted.
        operation: &'static str,
        /// Role the caller holds.
        role: Role,
    },
    /// The caller is not the targeted account.
    #[error("you may only {operation} for your own account")]
    NotSelf {
        /// Operation that was attempted.
        operation: &'static str,
    },
}

/// Authorization rule for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    operation: &'static str,
    roles: Option<&'static [Role]>,
    self_scope: SelfScope,
}

impl Policy {
    /// Any authenticated caller, no self-scope.
    #[must_use]
    pub const fn authenticated(operation: &'static str) -> Self {
        Self {
            operation,
            roles: None,
            self_scope: SelfScope::Unscoped,
        }
    }

    /// Only callers holding one of `roles`.
    #[must_use]
    pub const fn for_roles(operation: &'static str, roles: &'static [Role]) -> Self {
        Self {
            operation,
            roles: Some(roles),
            self_scope: SelfScope::Unscoped,
        }
    }

    /// Add a self-scope rule.
    #[must_use]
    pub const fn self_scoped(mut self, scope: SelfScope) -> Self {
        self.self_scope = scope;
        self
    }

    /// Human-readable operation name.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        self.operation
    }

    /// Check only the role requirement.
    ///
    /// # Errors
    ///
    /// Returns `AccessDenied::Role` if the caller's role is not allowed.
    pub fn check_role(&self, principal: &Principal) -> Result<(), AccessDenied> {
        match self.roles {
            Some(roles) if !roles.contains(&principal.role) => Err(AccessDenied::Role {
                operation: self.operation,
                role: principal.role,
            }),
            _ => Ok(()),
        }
    }

    /// Check only the self-scope requirement against `target`.
    ///
    /// A self-scoped policy with no target fails closed.
    ///
    /// # Errors
    ///
    /// Returns `AccessDenied::NotSelf` if the caller is not the target and
    /// holds no bypass role.
    pub fn check_scope(
        &self,
        principal: &Principal,
        target: Option<UserId>,
    ) -> Result<(), AccessDenied> {
        let bypass: &[Role] = match self.self_scope {
            SelfScope::Unscoped => return Ok(()),
            SelfScope::Required => &[],
            SelfScope::RequiredUnless(roles) => roles,
        };

        if bypass.contains(&principal.role) || target == Some(principal.user_id) {
            Ok(())
        } else {
            Err(AccessDenied::NotSelf {
                operation: self.operation,
            })
        }
    }

    /// Check the role and then the self-scope requirement.
    ///
    /// # Errors
    ///
    /// Returns the first requirement the caller fails.
    pub fn check(&self, principal: &Principal, target: Option<UserId>) -> Result<(), AccessDenied> {
        self.check_role(principal)?;
        self.check_scope(principal, target)
    }
}

/// Policies for every protected operation of the API.
pub mod policies {
    use super::{Policy, SelfScope};
    use crate::types::Role;

    /// Read listings of users, stores and ratings.
    pub const READ_DATA: Policy = Policy::authenticated("read platform data");

    /// Create an admin or user account.
    pub const CREATE_USER: Policy = Policy::for_roles("create users", &[Role::Admin]);

    /// Create a store together with its owner account.
    pub const CREATE_STORE: Policy = Policy::for_roles("create stores", &[Role::Admin]);

    /// Delete an account and everything that depends on it.
    pub const DELETE_USER: Policy = Policy::for_roles("delete users", &[Role::Admin]);

    /// Rotate an account password.
    pub const CHANGE_PASSWORD: Policy = Policy::authenticated("change the password")
        .self_scoped(SelfScope::RequiredUnless(&[Role::Admin]));

    /// Submit or overwrite a rating.
    pub const SUBMIT_RATING: Policy =
        Policy::authenticated("submit ratings").self_scoped(SelfScope::Required);

    /// View the individual ratings a store received. The target is the
    /// store's owner.
    pub const VIEW_STORE_RATINGS: Policy =
        Policy::for_roles("view store ratings", &[Role::Admin, Role::StoreOwner])
            .self_scoped(SelfScope::RequiredUnless(&[Role::Admin]));
}
