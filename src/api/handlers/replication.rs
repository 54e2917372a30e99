use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::replication_error;
use crate::api::response::{ApiError, AppJson, JSend};
use crate::coordinator::ReplicationSummary;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SetImportanceRequest {
    pub importance: u32,
}

#[derive(Debug, Serialize)]
pub struct ImportanceResponse {
    pub file_id: u64,
    pub importance: u32,
}

// ============================================================================
// Handlers
// ============================================================================

/// Run one replication pass. Route: POST /_internal/replicate
pub async fn replicate_one(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<ReplicationSummary>>, ApiError> {
    let summary = state
        .replication
        .replicate_one()
        .await
        .map_err(replication_error)?;

    Ok(JSend::success(summary))
}

/// Override how many replicas a file should have.
/// Route: PUT /_internal/files/:file_id/importance (test mode only)
pub async fn set_importance(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<u64>,
    AppJson(req): AppJson<SetImportanceRequest>,
) -> Result<Json<JSend<ImportanceResponse>>, ApiError> {
    let updated = state
        .db
        .set_file_importance(file_id, req.importance)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    if !updated {
        return Err(ApiError::not_found("File not found"));
    }

    tracing::info!(file_id, importance = req.importance, "Updated file importance");

    Ok(JSend::success(ImportanceResponse {
        file_id,
        importance: req.importance,
    }))
}
