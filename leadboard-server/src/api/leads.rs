//! Lead endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use leadboard_common::fields::RejectedField;
use leadboard_common::Lead;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{json_body, path_param, query_params};
use crate::error::{ApiError, ApiResult};
use crate::orchestrator::LeadOrigin;
use crate::AppState;

/// Accepted spellings of the target stage in a move request
const STAGE_KEYS: [&str; 4] = ["stageId", "columnId", "column", "id"];

#[derive(Debug, Deserialize)]
pub struct LeadQuery {
    pub stage: Option<String>,
    pub id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LeadCreated {
    pub id: i64,
    pub message: String,
    pub lead: Lead,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadUpdated {
    pub id: i64,
    pub message: String,
    pub lead: Lead,
    pub rejected_fields: Vec<RejectedField>,
}

/// GET /leads
///
/// Newest first. `?stage=<id>` filters by stage; `?id=<n>` returns zero or
/// one lead.
pub async fn list_leads(
    State(state): State<AppState>,
    query: Result<Query<LeadQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Lead>>> {
    let query = query_params(query)?;
    if let Some(id) = query.id {
        let leads = match state.orchestrator.get_lead(id).await {
            Ok(lead) => vec![lead],
            Err(leadboard_common::Error::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        return Ok(Json(leads));
    }

    let leads = state
        .orchestrator
        .list_leads(query.stage.as_deref())
        .await?;
    Ok(Json(leads))
}

/// POST /leads
pub async fn create_lead(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<LeadCreated>)> {
    let body = json_body(body)?;
    let lead = state
        .orchestrator
        .create_lead(&body, LeadOrigin::Api)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LeadCreated {
            id: lead.id,
            message: "Lead created successfully".to_string(),
            lead,
        }),
    ))
}

/// GET /leads/:id
pub async fn get_lead(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Lead>> {
    let id = path_param(id)?;
    Ok(Json(state.orchestrator.get_lead(id).await?))
}

/// PATCH /leads/:id
pub async fn update_lead(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<LeadUpdated>> {
    let id = path_param(id)?;
    let body = json_body(body)?;
    let outcome = state.orchestrator.apply_update(id, &body).await?;

    let message = if outcome.rejected_fields.is_empty() {
        "Lead updated successfully".to_string()
    } else {
        format!(
            "Lead updated; {} field(s) rejected",
            outcome.rejected_fields.len()
        )
    };

    Ok(Json(LeadUpdated {
        id,
        message,
        lead: outcome.lead,
        rejected_fields: outcome.rejected_fields,
    }))
}

/// DELETE /leads/:id
pub async fn delete_lead(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = path_param(id)?;
    state.orchestrator.delete_lead(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /leads/:id/stage
pub async fn move_lead(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Lead>> {
    let id = path_param(id)?;
    let body = json_body(body)?;
    let stage_id = STAGE_KEYS
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Validation {
            field: "stageId".to_string(),
            message: "target stage is required".to_string(),
        })?;

    Ok(Json(state.orchestrator.move_to_stage(id, stage_id).await?))
}

/// Build lead routes
pub fn lead_routes() -> Router<AppState> {
    Router::new()
        .route("/leads", get(list_leads).post(create_lead))
        .route(
            "/leads/:id",
            get(get_lead).patch(update_lead).delete(delete_lead),
        )
        .route("/leads/:id/stage", patch(move_lead))
}
