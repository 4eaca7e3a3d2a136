//! HTTP front end
//!
//! Thin JSON wrapper around the run controller and the status report.

mod routes;

pub use routes::{
    start_indexing_handler, status_handler, stop_indexing_handler, StatusResponse, TriggerResponse,
};

use crate::indexing::RunController;
use crate::storage::SharedStorage;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<RunController>,
    pub storage: SharedStorage,
}

/// Builds the API router
///
/// | Route | Action |
/// |-------|--------|
/// | `GET /api/startIndexing` | start a run |
/// | `GET /api/stopIndexing` | stop the active run |
/// | `GET /api/status` | indexing statistics |
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/startIndexing", get(start_indexing_handler))
        .route("/api/stopIndexing", get(stop_indexing_handler))
        .route("/api/status", get(status_handler))
        .with_state(state)
}
