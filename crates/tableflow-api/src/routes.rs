use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use tableflow_orchestrator::StageError;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StageParams {
    pub table: Option<String>,
    pub idx: Option<usize>,
}

/// Stage failures other than precondition violations are swallowed inside
/// the stage; a handler error therefore means either a caller mistake (400)
/// or broken infrastructure (500). Success is a bare "OK", no payload.
fn ack(result: Result<tableflow_orchestrator::StageReport, StageError>) -> Result<&'static str, StatusCode> {
    match result {
        Ok(_) => Ok("OK"),
        Err(err) if err.is_precondition() => {
            tracing::error!("stage precondition violated: {err}");
            Err(StatusCode::BAD_REQUEST)
        }
        Err(err) => {
            tracing::error!("stage failed: {err}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn require_table(params: &StageParams) -> Result<&str, StatusCode> {
    params.table.as_deref().ok_or(StatusCode::BAD_REQUEST)
}

pub async fn cache_pull(
    State(state): State<Arc<AppState>>,
) -> Result<&'static str, StatusCode> {
    ack(state.orchestrator.cache_pull().await)
}

pub async fn update_table(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StageParams>,
) -> Result<&'static str, StatusCode> {
    let table = require_table(&params)?;
    ack(state.orchestrator.update_table(table, params.idx).await)
}

pub async fn combine_table(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StageParams>,
) -> Result<&'static str, StatusCode> {
    let table = require_table(&params)?;
    ack(state.orchestrator.combine_table(table).await)
}

pub async fn publish(
    State(state): State<Arc<AppState>>,
) -> Result<&'static str, StatusCode> {
    ack(state.orchestrator.publish().await)
}
