//! Health checks and the shared middleware stack.

#![allow(clippy::unwrap_used)]

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::json;

use store_ratings_core::Role;
use store_ratings_integration_tests::{PASSWORD, TestApp, name, test_config};
use store_ratings_server::db::Database;
use store_ratings_server::routes;
use store_ratings_server::services::{AccountInput, CredentialService};
use store_ratings_server::state::AppState;

#[tokio::test]
async fn test_health_and_readiness() {
    let app = TestApp::new();

    let res = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!("ok"));

    let res = app.request(Method::GET, "/health/ready", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_generated_or_propagated() {
    let app = TestApp::new();

    let res = app.request(Method::GET, "/health", None, None).await;
    let generated = res.headers.get("x-request-id").unwrap().to_str().unwrap();
    assert_eq!(generated.len(), 36);

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "edge-abc-123")
        .body(Body::empty())
        .unwrap();
    let res = app.send(request).await;
    assert_eq!(res.headers.get("x-request-id").unwrap(), "edge-abc-123");
}

#[tokio::test]
async fn test_security_headers_on_error_responses() {
    let app = TestApp::new();
    let res = app.request(Method::GET, "/data/stores", None, None).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers.get("x-frame-options").unwrap(), "DENY");
    assert_eq!(res.headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(res.headers.get(header::CACHE_CONTROL).unwrap(), "no-store");
}

#[tokio::test]
async fn test_cors_allows_configured_origin_only() {
    let app = TestApp::new();

    let preflight = |origin: &'static str| {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/auth/login")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    };

    let res = app.send(preflight("http://localhost:3000")).await;
    assert_eq!(
        res.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );

    let res = app.send(preflight("https://evil.example")).await;
    assert!(res.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new();
    let res = app.request(Method::GET, "/nope", None, None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_auth_routes_are_rate_limited_per_client() {
    use tower::ServiceExt;

    let state = AppState::new(test_config(), Database::in_memory());
    let router = store_ratings_server::build_app(state, routes::rate_limited_routes());

    let attempt = |ip: &'static str| {
        Request::builder()
            .method(Method::POST)
            .uri("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", ip)
            .body(Body::from(
                json!({ "email": "x@example.com", "password": "Wrong@123" }).to_string(),
            ))
            .unwrap()
    };

    let mut statuses = Vec::new();
    for _ in 0..8 {
        let res = router.clone().oneshot(attempt("203.0.113.7")).await.unwrap();
        statuses.push(res.status());
    }
    assert!(statuses.contains(&StatusCode::UNAUTHORIZED));
    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));

    // A different client has its own budget
    let res = router.oneshot(attempt("198.51.100.9")).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_me_is_not_rate_limited() {
    use tower::ServiceExt;

    let state = AppState::new(test_config(), Database::in_memory());
    let user = CredentialService::new(state.db())
        .create_account(
            AccountInput {
                name: &name("frequent"),
                email: "frequent@example.com",
                address: "4 Quay Street",
                password: PASSWORD,
            },
            Role::User,
        )
        .await
        .unwrap();
    let token = state.tokens().issue(&user.principal()).unwrap().token;
    let router = store_ratings_server::build_app(state, routes::rate_limited_routes());

    for _ in 0..12 {
        let request = Request::builder()
            .uri("/auth/me")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header("x-forwarded-for", "203.0.113.20")
            .body(Body::empty())
            .unwrap();
        let res = router.clone().oneshot(request).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
