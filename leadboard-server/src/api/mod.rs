//! HTTP API handlers

pub mod auth;
pub mod health;
pub mod leads;
pub mod stages;
pub mod stats;
pub mod webhook;

pub use auth::auth_middleware;
pub use health::health_routes;
pub use leads::lead_routes;
pub use stages::stage_routes;
pub use stats::stats_routes;
pub use webhook::webhook_routes;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::Json;

use crate::error::{ApiError, ApiResult};

// Extractor rejections are reported in the API error shape instead of axum's
// plain-text default.

pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

pub(crate) fn path_param<T>(path: Result<Path<T>, PathRejection>) -> ApiResult<T> {
    path.map(|Path(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

pub(crate) fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}
