//! Stage endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use leadboard_common::{Lead, Stage};

use crate::api::json_body;
use crate::db::stages::StageChanges;
use crate::error::ApiResult;
use crate::registry;
use crate::AppState;

/// GET /stages
pub async fn list_stages(State(state): State<AppState>) -> ApiResult<Json<Vec<Stage>>> {
    Ok(Json(registry::list(&state.db).await?))
}

/// POST /stages
pub async fn create_stage(
    State(state): State<AppState>,
    stage: Result<Json<Stage>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Stage>)> {
    let stage = json_body(stage)?;
    let stage = registry::create(&state.db, stage).await?;
    Ok((StatusCode::CREATED, Json(stage)))
}

/// PATCH /stages/:id
pub async fn update_stage(
    State(state): State<AppState>,
    Path(id): Path<String>,
    changes: Result<Json<StageChanges>, JsonRejection>,
) -> ApiResult<Json<Stage>> {
    let changes = json_body(changes)?;
    Ok(Json(registry::update(&state.db, &id, changes).await?))
}

/// DELETE /stages/:id
pub async fn delete_stage(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    registry::delete(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /stages/:id/leads
pub async fn stage_leads(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Lead>>> {
    registry::require(&state.db, &id).await?;
    Ok(Json(state.orchestrator.list_leads(Some(&id)).await?))
}

/// Build stage routes
pub fn stage_routes() -> Router<AppState> {
    Router::new()
        .route("/stages", get(list_stages).post(create_stage))
        .route(
            "/stages/:id",
            patch(update_stage).delete(delete_stage),
        )
        .route("/stages/:id/leads", get(stage_leads))
}
