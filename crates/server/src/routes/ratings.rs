//! Rating submission and per-store views.

use axum::{Json, extract::State, http::StatusCode};

use store_ratings_core::StoreId;

use super::{ApiJson, ApiPath};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::{RatingWithRater, StoreRatingSummary, UpsertOutcome};
use crate::services::{AggregationService, RatingInput, RatingLedger};
use crate::state::AppState;

/// Submit or overwrite the caller's rating of a store.
///
/// Responds 201 when the rating is new and 200 when an earlier value was
/// replaced.
pub async fn submit(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiJson(input): ApiJson<RatingInput>,
) -> Result<(StatusCode, Json<UpsertOutcome>)> {
    let outcome = RatingLedger::new(state.db())
        .submit_rating(&principal, input)
        .await?;

    add_breadcrumb(
        "rating",
        if outcome.created { "Rating created" } else { "Rating updated" },
        &[
            ("store_id", input.store_id.to_string()),
            ("value", outcome.rating.value.to_string()),
        ],
    );

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome)))
}

/// Overall rating of a store and the caller's own rating of it.
pub async fn store_summary(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiPath(store_id): ApiPath<StoreId>,
) -> Result<Json<StoreRatingSummary>> {
    let summary = AggregationService::new(state.db())
        .store_summary(store_id, principal.user_id)
        .await?;
    Ok(Json(summary))
}

/// Individual ratings a store received, with rater details.
pub async fn store_ratings(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiPath(store_id): ApiPath<StoreId>,
) -> Result<Json<Vec<RatingWithRater>>> {
    let ratings = AggregationService::new(state.db())
        .ratings_received(&principal, store_id)
        .await?;
    Ok(Json(ratings))
}
