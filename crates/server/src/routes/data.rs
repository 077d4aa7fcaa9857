//! Platform-wide listings, open to every authenticated role.

use axum::{Json, extract::State};

use crate::db::UserRepository;
use crate::error::Result;
use crate::middleware::{Authorized, auth::ReadData};
use crate::models::{RatingWithRater, StoreListing, User};
use crate::services::AggregationService;
use crate::state::AppState;

/// All accounts; store owners carry their store ID.
pub async fn users(
    State(state): State<AppState>,
    _caller: Authorized<ReadData>,
) -> Result<Json<Vec<User>>> {
    Ok(Json(UserRepository::new(state.db()).list_all().await?))
}

/// All stores with their rating summary.
pub async fn stores(
    State(state): State<AppState>,
    _caller: Authorized<ReadData>,
) -> Result<Json<Vec<StoreListing>>> {
    Ok(Json(AggregationService::new(state.db()).store_listing().await?))
}

/// All ratings with the rater's email.
pub async fn ratings(
    State(state): State<AppState>,
    _caller: Authorized<ReadData>,
) -> Result<Json<Vec<RatingWithRater>>> {
    Ok(Json(AggregationService::new(state.db()).all_ratings().await?))
}
