//! Bearer-token authentication extractors.
//!
//! [`RequireAuth`] decodes the caller's token. [`Authorized`] additionally
//! enforces the role requirement of an operation's policy. Both run before
//! any body extractor, so a caller with the wrong role is refused before the
//! payload is even parsed.

use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use store_ratings_core::access::{Policy, policies};
use store_ratings_core::Principal;

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn me(RequireAuth(principal): RequireAuth) -> String {
///     principal.email.to_string()
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub Principal);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AuthError::MissingToken)?;
        let principal = state.tokens().verify(token)?;

        tracing::Span::current().record("user_id", principal.user_id.as_i32());
        set_sentry_user(&principal.user_id, Some(principal.email.as_str()));

        Ok(Self(principal))
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// An operation whose role requirement is checked at extraction time.
pub trait Guard {
    /// Policy of the guarded operation.
    const POLICY: Policy;
}

/// Extractor that requires a valid token whose role passes `G::POLICY`.
///
/// Self-scope rules need the request target, so handlers check those.
#[derive(Debug)]
pub struct Authorized<G> {
    pub principal: Principal,
    guard: PhantomData<fn() -> G>,
}

impl<G: Guard> FromRequestParts<AppState> for Authorized<G> {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(principal) = RequireAuth::from_request_parts(parts, state).await?;
        G::POLICY.check_role(&principal)?;

        Ok(Self {
            principal,
            guard: PhantomData,
        })
    }
}

macro_rules! guard {
    ($(#[$meta:meta])* $name:ident => $policy:expr) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name;

        impl Guard for $name {
            const POLICY: Policy = $policy;
        }
    };
}

guard!(
    /// Listings open to every authenticated role.
    ReadData => policies::READ_DATA
);
guard!(
    /// Admin-only account creation.
    CreateUsers => policies::CREATE_USER
);
guard!(
    /// Admin-only store provisioning.
    CreateStores => policies::CREATE_STORE
);
guard!(
    /// Admin-only account deletion.
    DeleteUsers => policies::DELETE_USER
);
