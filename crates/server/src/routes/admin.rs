//! Admin-only provisioning.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use store_ratings_core::{Role, UserId};

use super::{ApiJson, ApiPath};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::Authorized;
use crate::middleware::auth::{CreateStores, CreateUsers, DeleteUsers};
use crate::models::{StoreWithOwner, User};
use crate::services::{AccountInput, ProvisioningService};
use crate::state::AppState;

/// Body of `POST /admin/users`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub address: String,
    pub password: String,
    /// Defaults to `user`. `store_owner` is rejected: owners come with a store.
    #[serde(default)]
    pub role: Option<Role>,
}

/// Body of `POST /admin/stores`.
#[derive(Debug, Deserialize)]
pub struct CreateStoreRequest {
    pub name: String,
    pub email: String,
    pub address: String,
}

fn provisioning(state: &AppState) -> ProvisioningService<'_> {
    ProvisioningService::new(state.db(), &state.config().owner_initial_password)
}

/// Create an `admin` or `user` account.
#[tracing::instrument(skip_all, fields(admin_id = %caller.principal.user_id))]
pub async fn create_user(
    State(state): State<AppState>,
    caller: Authorized<CreateUsers>,
    ApiJson(body): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let role = body.role.unwrap_or(Role::User);
    let user = provisioning(&state)
        .create_user(
            AccountInput {
                name: &body.name,
                email: &body.email,
                address: &body.address,
                password: &body.password,
            },
            role,
        )
        .await?;

    add_breadcrumb(
        "admin",
        "Account created",
        &[("user_id", user.id.to_string()), ("role", role.to_string())],
    );
    Ok((StatusCode::CREATED, Json(user)))
}

/// Create a store together with its `store_owner` account.
#[tracing::instrument(skip_all, fields(admin_id = %caller.principal.user_id))]
pub async fn create_store(
    State(state): State<AppState>,
    caller: Authorized<CreateStores>,
    ApiJson(body): ApiJson<CreateStoreRequest>,
) -> Result<(StatusCode, Json<StoreWithOwner>)> {
    let created = provisioning(&state)
        .create_store_with_owner(&body.name, &body.email, &body.address)
        .await?;

    add_breadcrumb(
        "admin",
        "Store created",
        &[
            ("store_id", created.store.id.to_string()),
            ("owner_id", created.owner.id.to_string()),
        ],
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// Delete an account, its store and every dependent rating.
#[tracing::instrument(skip_all, fields(admin_id = %caller.principal.user_id, user_id = %user_id))]
pub async fn delete_user(
    State(state): State<AppState>,
    caller: Authorized<DeleteUsers>,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<StatusCode> {
    provisioning(&state).delete_user(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
