use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use contracts::shared::logger::{CreateLogRequest, LogEntry};
use serde::Deserialize;

use crate::shared::error::ApiError;
use crate::shared::extract::{ApiJson, ApiQuery};
use crate::shared::logger;
use crate::shared::state::AppState;

const DEFAULT_LIMIT: u64 = 200;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<u64>,
}

/// GET /api/logs
pub async fn list_all(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LogsQuery>,
) -> Result<Json<Vec<LogEntry>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let logs = logger::repository::get_recent_logs(&state.db, limit).await?;
    Ok(Json(logs))
}

/// POST /api/logs
///
/// Used by the frontend to persist errors it showed to the operator.
pub async fn create(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateLogRequest>,
) -> Result<StatusCode, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::validation("log message is empty"));
    }
    logger::repository::log_event(&state.db, req.source, &req.category, &req.message).await?;
    Ok(StatusCode::CREATED)
}

/// DELETE /api/logs
pub async fn clear_all(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    let removed = logger::repository::clear_all_logs(&state.db).await?;
    tracing::info!("Cleared {} log entries", removed);
    Ok(StatusCode::NO_CONTENT)
}
