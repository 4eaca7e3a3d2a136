//! Handlers for the indexing API
//!
//! Every handler answers 200 with a JSON body; failures are reported in the
//! body, never through the status code.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::output::{load_statistics, IndexingStatistics};
use crate::server::AppState;
use crate::storage::lock;

/// Body of the start and stop endpoints
#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl TriggerResponse {
    fn from_result<T, E: ToString>(result: Result<T, E>) -> Self {
        match result {
            Ok(_) => Self {
                result: true,
                error: None,
            },
            Err(e) => Self {
                result: false,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Body of the status endpoint
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum StatusResponse {
    Statistics(IndexingStatistics),
    Error { result: bool, error: String },
}

pub async fn start_indexing_handler(State(state): State<AppState>) -> Json<TriggerResponse> {
    Json(TriggerResponse::from_result(state.controller.start()))
}

pub async fn stop_indexing_handler(State(state): State<AppState>) -> Json<TriggerResponse> {
    Json(TriggerResponse::from_result(state.controller.stop()))
}

/// Always answers 200; a storage failure is reported in the body
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let indexing = state.controller.is_running();
    let stats = lock(&state.storage).and_then(|storage| load_statistics(&*storage, indexing));

    match stats {
        Ok(stats) => Json(StatusResponse::Statistics(stats)),
        Err(e) => {
            tracing::error!("Failed to load statistics: {}", e);
            Json(StatusResponse::Error {
                result: false,
                error: e.to_string(),
            })
        }
    }
}
