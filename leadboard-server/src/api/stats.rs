//! Stats endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use leadboard_common::Stats;

use crate::db::stats;
use crate::error::ApiResult;
use crate::AppState;

/// GET /stats
///
/// Always recomputed from the lead table.
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<Stats>> {
    Ok(Json(stats::recompute(&state.db, Utc::now()).await?))
}

pub fn stats_routes() -> Router<AppState> {
    Router::new().route("/stats", get(get_stats))
}
