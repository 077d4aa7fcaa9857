//! The API against `PostgreSQL`.
//!
//! These tests require a `DATABASE_URL` pointing at a server where the test
//! user may create databases. Run with `--include-ignored`.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use store_ratings_integration_tests::{OWNER_PASSWORD, TestApp, name, rate_concurrently};
use store_ratings_server::db::Database;

fn app(pool: PgPool) -> TestApp {
    TestApp::with_database(Database::Postgres(pool))
}

#[sqlx::test(migrator = "store_ratings_server::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_upsert_keeps_one_row(pool: PgPool) {
    let app = app(pool.clone());
    let (admin, _) = app.admin("root@example.com").await;
    let (store_id, _) = app.create_store(&admin, "pg-shop@example.com").await;
    let (token, user_id) = app.signup("pg-rater@example.com").await;

    assert_eq!(
        app.rate(&token, user_id, store_id, 2).await.status,
        StatusCode::CREATED
    );
    assert_eq!(
        app.rate(&token, user_id, store_id, 5).await.status,
        StatusCode::OK
    );

    let (count, value): (i64, i16) = sqlx::query_as(
        "SELECT COUNT(*), MAX(value) FROM rating WHERE user_id = $1 AND store_id = $2",
    )
    .bind(i32::try_from(user_id).unwrap())
    .bind(i32::try_from(store_id).unwrap())
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!((count, value), (1, 5));
}

#[sqlx::test(migrator = "store_ratings_server::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_concurrent_upserts_keep_one_row(pool: PgPool) {
    let app = app(pool.clone());
    let (admin, _) = app.admin("root@example.com").await;
    let (store_id, _) = app.create_store(&admin, "pg-busy@example.com").await;
    let (token, user_id) = app.signup("pg-eager@example.com").await;
    let app = Arc::new(app);

    let values: Vec<i64> = (0..16).map(|i| i % 5 + 1).collect();
    let responses = rate_concurrently(&app, &token, user_id, store_id, values.clone()).await;

    let created = responses
        .iter()
        .filter(|r| r.status == StatusCode::CREATED)
        .count();
    assert_eq!(created, 1);
    assert!(responses
        .iter()
        .all(|r| r.status == StatusCode::CREATED || r.status == StatusCode::OK));

    let rows: Vec<(i16,)> =
        sqlx::query_as("SELECT value FROM rating WHERE user_id = $1 AND store_id = $2")
            .bind(i32::try_from(user_id).unwrap())
            .bind(i32::try_from(store_id).unwrap())
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(rows.len(), 1);
    assert!(values.contains(&i64::from(rows[0].0)));
}

#[sqlx::test(migrator = "store_ratings_server::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_store_collision_rolls_back_owner(pool: PgPool) {
    let app = app(pool.clone());
    let (admin, _) = app.admin("root@example.com").await;
    app.create_store(&admin, "first@example.com").await;

    // The owner insert succeeds, then the store email collides
    sqlx::query("UPDATE store SET email = 'second@example.com'")
        .execute(&pool)
        .await
        .unwrap();

    let res = app
        .post(
            "/admin/stores",
            Some(&admin),
            json!({
                "name": name("second"),
                "email": "second@example.com",
                "address": "5 Mill Lane",
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let (users,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM app_user")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(users, 2);
}

#[sqlx::test(migrator = "store_ratings_server::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_listings_and_cascade(pool: PgPool) {
    let app = app(pool);
    let (admin, _) = app.admin("root@example.com").await;
    let (store_id, owner_id) = app.create_store(&admin, "cascade@example.com").await;
    let (owner, _) = app.login("cascade@example.com", OWNER_PASSWORD).await;
    let (a, a_id) = app.signup("a@example.com").await;
    let (b, b_id) = app.signup("b@example.com").await;
    app.rate(&a, a_id, store_id, 5).await;
    app.rate(&b, b_id, store_id, 4).await;

    let users = app.get("/data/users", &owner).await;
    let listed_owner = users
        .body
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["id"].as_i64() == Some(owner_id))
        .cloned()
        .unwrap();
    assert_eq!(listed_owner["store_id"].as_i64(), Some(store_id));

    let stores = app.get("/data/stores", &owner).await;
    assert_eq!(stores.body[0]["average_rating"], 4.5);
    assert_eq!(stores.body[0]["rating_count"], 2);

    let received = app.get(&format!("/stores/{store_id}/ratings"), &owner).await;
    assert_eq!(received.body.as_array().unwrap().len(), 2);

    let res = app
        .request(
            axum::http::Method::DELETE,
            &format!("/admin/users/{owner_id}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let ratings = app.get("/data/ratings", &admin).await;
    assert!(ratings.body.as_array().unwrap().is_empty());
}
