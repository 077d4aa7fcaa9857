//! Account self-service.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;

use store_ratings_core::UserId;
use store_ratings_core::access::policies;

use super::{ApiJson, ApiPath};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::CredentialService;
use crate::state::AppState;

/// Body of `PUT /users/{id}/password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub password: String,
}

/// Replace an account's password. Callers may change their own; admins may
/// change anyone's.
#[tracing::instrument(skip_all, fields(target_id = %user_id))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiPath(user_id): ApiPath<UserId>,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> Result<StatusCode> {
    policies::CHANGE_PASSWORD.check(&principal, Some(user_id))?;

    CredentialService::new(state.db())
        .update_password(user_id, &body.password)
        .await?;

    tracing::info!(changed_by = %principal.user_id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}
