//! Agent key middleware
//!
//! When a key is configured, requests must carry it in `X-Agent-Key`,
//! `Xi-Api-Key` or `X-API-Key`. Applied to every route except `/health`.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

const KEY_HEADERS: [&str; 3] = ["x-agent-key", "xi-api-key", "x-api-key"];

pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.agent_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    let rejection = match presented_key(request.headers()) {
        Some(key) if key == expected => None,
        Some(_) => Some("Invalid agent key"),
        None => Some("Missing agent key"),
    };

    match rejection {
        None => Ok(next.run(request).await),
        Some(reason) => {
            warn!(path = %request.uri().path(), reason, "Rejected request");
            Err(ApiError::Forbidden(reason.to_string()))
        }
    }
}

fn presented_key(headers: &HeaderMap) -> Option<&str> {
    KEY_HEADERS
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
}
