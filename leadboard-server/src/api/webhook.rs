//! Inbound lead webhook
//!
//! Automation platforms post whatever they have; every field is optional
//! and missing identity fields get placeholder values.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use leadboard_common::Lead;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::api::json_body;
use crate::error::ApiResult;
use crate::orchestrator::LeadOrigin;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
    pub lead: Lead,
}

/// POST /webhook/leads
pub async fn receive_lead(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<WebhookResponse>)> {
    let body = json_body(body)?;
    info!("Received lead from webhook");

    let lead = state
        .orchestrator
        .create_lead(&body, LeadOrigin::Webhook)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(WebhookResponse {
            success: true,
            message: "Lead created successfully".to_string(),
            lead,
        }),
    ))
}

pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/webhook/leads", post(receive_lead))
}
