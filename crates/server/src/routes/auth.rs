//! Login, signup and token introspection.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use store_ratings_core::{Principal, Role};

use super::ApiJson;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::services::{AccountInput, CredentialService};
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Signup request body.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub address: String,
    pub password: String,
}

/// A bearer token and the account it was issued for.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// Identity carried by the token next to the current account record.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub identity: Principal,
    pub user: User,
}

fn token_response(state: &AppState, user: User) -> Result<TokenResponse> {
    let issued = state.tokens().issue(&user.principal())?;
    Ok(TokenResponse {
        token: issued.token,
        token_type: "Bearer",
        expires_at: issued.expires_at,
        user,
    })
}

/// Verify credentials and issue a token.
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    let user = CredentialService::new(state.db())
        .verify_credentials(&body.email, &body.password)
        .await?;

    tracing::info!(user_id = %user.id, "Login succeeded");
    Ok(Json(token_response(&state, user)?))
}

/// Create a `user` account and issue a token.
#[tracing::instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<TokenResponse>)> {
    let user = CredentialService::new(state.db())
        .create_account(
            AccountInput {
                name: &body.name,
                email: &body.email,
                address: &body.address,
                password: &body.password,
            },
            Role::User,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(token_response(&state, user)?)))
}

/// Describe the caller.
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
) -> Result<Json<MeResponse>> {
    let user = CredentialService::new(state.db())
        .get_user(principal.user_id)
        .await?;

    Ok(Json(MeResponse {
        identity: principal,
        user,
    }))
}
