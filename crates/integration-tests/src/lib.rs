//! HTTP integration tests for the store ratings API.
//!
//! Tests drive the real router in-process with `tower::ServiceExt::oneshot`,
//! so no server or network is needed.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory backend only
//! cargo test -p store-ratings-integration-tests
//!
//! # Include the PostgreSQL tests
//! DATABASE_URL=postgres://localhost/ratings_test \
//!     cargo test -p store-ratings-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `auth` - Signup, login, token handling
//! - `admin` - Provisioning, deletion, password rotation
//! - `ratings` - Ledger and aggregation through the API
//! - `platform` - Health, request IDs, security headers
//! - `postgres` - The same flows against `PostgreSQL`

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::task::JoinSet;
use tower::ServiceExt;

use store_ratings_core::Role;
use store_ratings_server::config::ServerConfig;
use store_ratings_server::db::Database;
use store_ratings_server::services::{AccountInput, CredentialService};
use store_ratings_server::state::AppState;

/// Initial password given to provisioned store owners in tests.
pub const OWNER_PASSWORD: &str = "Owner@1234";

/// Password used for every account the helpers create.
pub const PASSWORD: &str = "Valid@123";

/// Configuration for an in-process server.
#[must_use]
pub fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("memory://"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 4000,
        token_secret: SecretString::from("kX9#mP2$vL7@nQ4&wR8*tY3!zB6^cF1%"),
        token_ttl_hours: 24,
        owner_initial_password: SecretString::from(OWNER_PASSWORD),
        heartbeat_interval: Duration::from_secs(30),
        allowed_origins: vec!["http://localhost:3000".to_owned()],
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A display name of valid length derived from `seed`.
#[must_use]
pub fn name(seed: &str) -> String {
    format!("{seed:.<24}")
}

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The `error` message of an error body.
    #[must_use]
    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

/// An application instance with its own storage.
pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// An application backed by fresh in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::with_database(Database::in_memory())
    }

    /// An application backed by `db`.
    #[must_use]
    pub fn with_database(db: Database) -> Self {
        Self::with_config(test_config(), db)
    }

    /// An application with a custom configuration.
    #[must_use]
    pub fn with_config(config: ServerConfig, db: Database) -> Self {
        let state = AppState::new(config, db);
        let router = store_ratings_server::app(state.clone());
        Self { state, router }
    }

    /// Send a request with an optional bearer token and JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.send(request).await
    }

    /// Send a prepared request.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// Sign up a `user` account; returns `(token, user_id)`.
    pub async fn signup(&self, email: &str) -> (String, i64) {
        let res = self
            .post(
                "/auth/signup",
                None,
                json!({
                    "name": name(email),
                    "email": email,
                    "address": "12 Market Street",
                    "password": PASSWORD,
                }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
        token_and_id(&res)
    }

    /// Log in; returns `(token, user_id)`.
    pub async fn login(&self, email: &str, password: &str) -> (String, i64) {
        let res = self
            .post(
                "/auth/login",
                None,
                json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
        token_and_id(&res)
    }

    /// Create an admin directly through the credential service, the way the
    /// CLI bootstraps one, and log in as it.
    pub async fn admin(&self, email: &str) -> (String, i64) {
        CredentialService::new(self.state.db())
            .create_account(
                AccountInput {
                    name: &name(email),
                    email,
                    address: "1 Admin Way",
                    password: PASSWORD,
                },
                Role::Admin,
            )
            .await
            .unwrap();
        self.login(email, PASSWORD).await
    }

    /// Provision a store; returns `(store_id, owner_id)`.
    pub async fn create_store(&self, admin_token: &str, email: &str) -> (i64, i64) {
        let res = self
            .post(
                "/admin/stores",
                Some(admin_token),
                json!({
                    "name": name(email),
                    "email": email,
                    "address": "99 High Street",
                }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
        (
            res.body["store"]["id"].as_i64().unwrap(),
            res.body["owner"]["id"].as_i64().unwrap(),
        )
    }

    /// Submit a rating as `token`'s account.
    pub async fn rate(&self, token: &str, user_id: i64, store_id: i64, value: i64) -> TestResponse {
        self.post(
            "/ratings",
            Some(token),
            json!({ "user_id": user_id, "store_id": store_id, "value": value }),
        )
        .await
    }
}

/// Submit every value in `values` at once, as the same account, for the
/// same store. Returns the responses in completion order.
pub async fn rate_concurrently(
    app: &Arc<TestApp>,
    token: &str,
    user_id: i64,
    store_id: i64,
    values: impl IntoIterator<Item = i64>,
) -> Vec<TestResponse> {
    let mut tasks = JoinSet::new();
    for value in values {
        let app = Arc::clone(app);
        let token = token.to_owned();
        tasks.spawn(async move { app.rate(&token, user_id, store_id, value).await });
    }

    let mut responses = Vec::new();
    while let Some(res) = tasks.join_next().await {
        responses.push(res.unwrap());
    }
    responses
}

fn token_and_id(res: &TestResponse) -> (String, i64) {
    (
        res.body["token"].as_str().unwrap().to_owned(),
        res.body["user"]["id"].as_i64().unwrap(),
    )
}
