//! HTTP route handlers for the ratings API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                 - Liveness
//! GET    /health/ready           - Readiness (storage ping)
//!
//! # Auth (login and signup rate limited per client IP)
//! POST   /auth/login             - Verify credentials, issue token
//! POST   /auth/signup            - Create a `user` account, issue token
//! GET    /auth/me                - Identity of the bearer token
//!
//! # Data (any authenticated role)
//! GET    /data/users             - All accounts (+ owned store ID)
//! GET    /data/stores            - All stores with rating summary
//! GET    /data/ratings           - All ratings with rater email
//!
//! # Admin
//! POST   /admin/users            - Create `admin` or `user` account
//! POST   /admin/stores           - Create store and its owner atomically
//! DELETE /admin/users/{id}       - Delete account (cascades)
//!
//! # Self-service
//! PUT    /users/{id}/password    - Rotate password (self or admin)
//! POST   /ratings                - Submit or overwrite own rating
//! GET    /stores/{id}/rating     - Store summary + caller's rating
//! GET    /stores/{id}/ratings    - Ratings received (admin or store owner)
//! ```

pub mod admin;
pub mod auth;
pub mod data;
pub mod health;
pub mod ratings;
pub mod users;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts},
    routing::{delete, get, post, put},
};

use crate::error::AppError;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// JSON body extractor that reports malformed input as `AppError`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path extractor that reports malformed segments as `AppError`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Create the credential routes router: the unauthenticated endpoints that
/// check or create passwords.
pub fn credential_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/signup", post(auth::signup))
}

/// Create the shared data listing routes router.
pub fn data_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(data::users))
        .route("/stores", get(data::stores))
        .route("/ratings", get(data::ratings))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(admin::create_user))
        .route("/users/{id}", delete(admin::delete_user))
        .route("/stores", post(admin::create_store))
}

/// Every route. Credential routes are not rate limited here; see
/// [`rate_limited_routes`].
pub fn routes() -> Router<AppState> {
    with_credentials(credential_routes())
}

/// Every route, with login and signup rate limited per client IP.
///
/// The limiter keys on proxy headers or the peer address, so the service
/// must be served with `ConnectInfo<SocketAddr>`.
pub fn rate_limited_routes() -> Router<AppState> {
    with_credentials(credential_routes().layer(auth_rate_limiter()))
}

fn with_credentials(credentials: Router<AppState>) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(credentials)
        .route("/auth/me", get(auth::me))
        .nest("/data", data_routes())
        .nest("/admin", admin_routes())
        .route("/users/{id}/password", put(users::change_password))
        .route("/ratings", post(ratings::submit))
        .route("/stores/{id}/rating", get(ratings::store_summary))
        .route("/stores/{id}/ratings", get(ratings::store_ratings))
}
