//! leadboard-server library
//!
//! HTTP service for the lead pipeline: leads move through ordered stages,
//! questionnaire answers accumulate, and complete questionnaires are scored
//! by an external classifier.

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod assessment;
pub mod db;
pub mod error;
pub mod orchestrator;
pub mod registry;

use assessment::AssessmentEngine;
use orchestrator::Orchestrator;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Lead mutation entry point
    pub orchestrator: Orchestrator,
    /// Shared key required on protected routes; `None` disables the check
    pub agent_key: Option<Arc<str>>,
    /// Service start time, reported by /health
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, engine: AssessmentEngine, agent_key: Option<String>) -> Self {
        let orchestrator = Orchestrator::new(db.clone(), Arc::new(engine));
        Self {
            db,
            orchestrator,
            agent_key: agent_key.map(Arc::from),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// `/health` is public; every other route goes through the agent-key check.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;

    let protected = Router::new()
        .merge(api::lead_routes())
        .merge(api::stage_routes())
        .merge(api::stats_routes())
        .merge(api::webhook_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    Router::new()
        .merge(protected)
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
