//! Rating submission and aggregation through the API.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{Value, json};

use store_ratings_integration_tests::{TestApp, TestResponse, rate_concurrently};

struct Fixture {
    app: TestApp,
    admin: String,
    store_id: i64,
    owner_id: i64,
}

async fn fixture() -> Fixture {
    let app = TestApp::new();
    let (admin, _) = app.admin("root@example.com").await;
    let (store_id, owner_id) = app.create_store(&admin, "bakery@example.com").await;
    Fixture {
        app,
        admin,
        store_id,
        owner_id,
    }
}

fn listing_for(res: &TestResponse, store_id: i64) -> Value {
    res.body
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["id"].as_i64() == Some(store_id))
        .cloned()
        .unwrap()
}

// ============================================================================
// Ledger
// ============================================================================

#[tokio::test]
async fn test_resubmission_overwrites_single_rating() {
    let f = fixture().await;
    let (token, user_id) = f.app.signup("rater@example.com").await;

    let first = f.app.rate(&token, user_id, f.store_id, 3).await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.body["created"], true);

    let second = f.app.rate(&token, user_id, f.store_id, 5).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["created"], false);
    assert_eq!(second.body["rating"]["id"], first.body["rating"]["id"]);

    let all = f.app.get("/data/ratings", &token).await;
    let mine: Vec<&Value> = all
        .body
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| r["user_id"].as_i64() == Some(user_id))
        .collect();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["value"], 5);
    assert_eq!(mine[0]["user_email"], "rater@example.com");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_leave_one_rating() {
    let f = fixture().await;
    let (token, user_id) = f.app.signup("eager@example.com").await;
    let app = Arc::new(f.app);

    let values: Vec<i64> = (0..32).map(|i| i % 5 + 1).collect();
    let responses = rate_concurrently(&app, &token, user_id, f.store_id, values.clone()).await;

    assert!(responses
        .iter()
        .all(|r| r.status == StatusCode::CREATED || r.status == StatusCode::OK));
    let created = responses
        .iter()
        .filter(|r| r.status == StatusCode::CREATED)
        .count();
    assert_eq!(created, 1);

    let all = app.get("/data/ratings", &token).await;
    let rows: Vec<&Value> = all
        .body
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| {
            r["user_id"].as_i64() == Some(user_id) && r["store_id"].as_i64() == Some(f.store_id)
        })
        .collect();
    assert_eq!(rows.len(), 1);
    assert!(values.contains(&rows[0]["value"].as_i64().unwrap()));
}

#[tokio::test]
async fn test_rating_for_someone_else_is_forbidden() {
    let f = fixture().await;
    let (token, _) = f.app.signup("mallory@example.com").await;
    let (_, victim_id) = f.app.signup("victim@example.com").await;

    let res = f.app.rate(&token, victim_id, f.store_id, 1).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    // Identity is checked before the value, so even a bad value is 403
    let res = f.app.rate(&token, victim_id, f.store_id, 9).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    // Admins get no exemption
    let (_, admin_id) = f.app.login("root@example.com", "Valid@123").await;
    assert_ne!(admin_id, victim_id);
    let res = f.app.rate(&f.admin, victim_id, f.store_id, 1).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_rating_out_of_range_is_bad_request() {
    let f = fixture().await;
    let (token, user_id) = f.app.signup("picky@example.com").await;

    for value in [0, 6, -1] {
        let res = f.app.rate(&token, user_id, f.store_id, value).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{value}");
        assert!(res.error().starts_with("rating must be"), "{}", res.error());
    }

    let res = f
        .app
        .post(
            "/ratings",
            Some(&token),
            json!({ "user_id": user_id, "store_id": f.store_id, "value": 4.5 }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rating_unknown_store_is_not_found() {
    let f = fixture().await;
    let (token, user_id) = f.app.signup("lost@example.com").await;

    let res = f.app.rate(&token, user_id, 9999, 4).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rating_alias_field_is_accepted() {
    let f = fixture().await;
    let (token, user_id) = f.app.signup("alias@example.com").await;

    let res = f
        .app
        .post(
            "/ratings",
            Some(&token),
            json!({ "user_id": user_id, "store_id": f.store_id, "rating": 2 }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["rating"]["value"], 2);
}

// ============================================================================
// Aggregation
// ============================================================================

#[tokio::test]
async fn test_unrated_store_reports_zero() {
    let f = fixture().await;
    let (token, _) = f.app.signup("viewer@example.com").await;

    let res = f.app.get("/data/stores", &token).await;
    assert_eq!(res.status, StatusCode::OK);
    let store = listing_for(&res, f.store_id);
    assert_eq!(store["average_rating"], 0.0);
    assert_eq!(store["rating_count"], 0);
    assert_eq!(store["owner_id"].as_i64().unwrap(), f.owner_id);

    let res = f
        .app
        .get(&format!("/stores/{}/rating", f.store_id), &token)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["average_rating"], 0.0);
    assert_eq!(res.body["your_rating"], Value::Null);
}

#[tokio::test]
async fn test_average_is_rounded_mean() {
    let f = fixture().await;
    let (a, a_id) = f.app.signup("a@example.com").await;
    let (b, b_id) = f.app.signup("b@example.com").await;
    let (c, c_id) = f.app.signup("c@example.com").await;

    f.app.rate(&a, a_id, f.store_id, 5).await;
    f.app.rate(&b, b_id, f.store_id, 4).await;

    let res = f.app.get("/data/stores", &a).await;
    let store = listing_for(&res, f.store_id);
    assert_eq!(store["average_rating"], 4.5);
    assert_eq!(store["rating_count"], 2);

    f.app.rate(&c, c_id, f.store_id, 3).await;

    let res = f
        .app
        .get(&format!("/stores/{}/rating", f.store_id), &c)
        .await;
    assert_eq!(res.body["average_rating"], 4.0);
    assert_eq!(res.body["rating_count"], 3);
    assert_eq!(res.body["your_rating"], 3);
}

#[tokio::test]
async fn test_summary_of_unknown_store_is_not_found() {
    let f = fixture().await;
    let (token, _) = f.app.signup("curious@example.com").await;

    let res = f.app.get("/stores/4242/rating", &token).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.error(), "store not found");
}

// ============================================================================
// Ratings received
// ============================================================================

#[tokio::test]
async fn test_store_ratings_visible_to_owner_and_admin_only() {
    let f = fixture().await;
    let (rater, rater_id) = f.app.signup("fan@example.com").await;
    f.app.rate(&rater, rater_id, f.store_id, 5).await;

    let uri = format!("/stores/{}/ratings", f.store_id);

    let (owner, owner_id) = f.app.login("bakery@example.com", "Owner@1234").await;
    assert_eq!(owner_id, f.owner_id);
    let res = f.app.get(&uri, &owner).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body.as_array().unwrap().len(), 1);
    assert_eq!(res.body[0]["user_email"], "fan@example.com");

    let res = f.app.get(&uri, &f.admin).await;
    assert_eq!(res.status, StatusCode::OK);

    let res = f.app.get(&uri, &rater).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let (other_store, _) = f.app.create_store(&f.admin, "rival@example.com").await;
    assert_ne!(other_store, f.store_id);
    let (rival, _) = f.app.login("rival@example.com", "Owner@1234").await;
    let res = f.app.get(&uri, &rival).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}
