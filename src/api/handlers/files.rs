use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::{ingest_error, locate_error};
use crate::api::response::{ApiError, AppQuery, JSend};
use crate::coordinator::StoreOutcome;
use crate::ports::AccessDescriptor;
use crate::storage::models::{FileRecord, OwnershipRecord};
use crate::AppState;

/// Upper bound on replicas resolved per request
const MAX_REPLICAS_PER_REQUEST: usize = 16;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub created_at: String,
    pub hash: String,
    pub id: u64,
    pub importance: u32,
    pub mime_type: String,
    pub size: u64,
}

#[derive(Debug, Serialize)]
pub struct OwnershipResponse {
    pub created_at: String,
    pub extension: String,
    pub file_id: u64,
    pub filename: String,
    pub id: u64,
    pub owner_id: u64,
}

#[derive(Debug, Serialize)]
pub struct LocateResponse {
    pub file: FileResponse,
    pub ownership: OwnershipResponse,
    pub resolved: Vec<AccessDescriptor>,
}

#[derive(Debug, Deserialize)]
pub struct LocateParams {
    #[serde(default)]
    pub replicas: usize,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn store_file(
    State(state): State<Arc<AppState>>,
    Path(owner_id): Path<u64>,
    mut multipart: Multipart,
) -> Result<Json<JSend<StoreOutcome>>, ApiError> {
    let mut file_data: Option<Bytes> = None;
    let mut upload_name: Option<String> = None;
    let mut filename: Option<String> = None;
    let mut extension: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                upload_name = field.file_name().map(|s| s.to_string());

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;

                if data.len() as u64 > state.config.max_file_size {
                    return Err(ApiError::payload_too_large(format!(
                        "File exceeds maximum size of {} bytes",
                        state.config.max_file_size
                    )));
                }

                file_data = Some(data);
            }
            "filename" => {
                filename = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Invalid filename: {e}")))?,
                );
            }
            "extension" => {
                extension = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Invalid extension: {e}")))?,
                );
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let file_data = file_data.ok_or_else(|| ApiError::bad_request("file field is required"))?;

    let (default_name, default_extension) = split_upload_name(upload_name.as_deref());
    let filename = filename.unwrap_or(default_name);
    let extension = extension.unwrap_or(default_extension);

    if filename.trim().is_empty() {
        return Err(ApiError::bad_request("filename must not be empty"));
    }

    // Phase 1: Stage the upload on local disk
    let staging_dir = PathBuf::from(&state.config.storage.staging_dir);
    tokio::fs::create_dir_all(&staging_dir)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to prepare staging directory: {e}")))?;
    let staged = staging_dir.join(uuid::Uuid::new_v4().to_string());
    tokio::fs::write(&staged, &file_data)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to stage upload: {e}")))?;

    // Phase 2: Hash, place and record it (blocking filesystem + redb work)
    let outcome = {
        let state = Arc::clone(&state);
        let staged = staged.clone();
        tokio::task::spawn_blocking(move || {
            state
                .ingestor
                .store(&staged, &filename, &extension, owner_id)
        })
        .await
        .map_err(|e| ApiError::internal(format!("Ingestion task failed: {e}")))?
    };

    // Deduplicated and rejected uploads stay in staging
    if let Err(e) = tokio::fs::remove_file(&staged).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %staged.display(), error = %e, "Failed to remove staged upload");
        }
    }

    let outcome = outcome.map_err(ingest_error)?;

    tracing::debug!(
        owner_id,
        file_id = outcome.file_id,
        ownership_id = outcome.ownership_id,
        "Stored upload"
    );

    Ok(JSend::success(outcome))
}

pub async fn locate_file(
    State(state): State<Arc<AppState>>,
    Path((owner_id, file_id)): Path<(u64, u64)>,
    AppQuery(params): AppQuery<LocateParams>,
) -> Result<Json<JSend<LocateResponse>>, ApiError> {
    if params.replicas > MAX_REPLICAS_PER_REQUEST {
        return Err(ApiError::bad_request(format!(
            "replicas must be at most {MAX_REPLICAS_PER_REQUEST}"
        )));
    }

    let located = state
        .locator
        .locate(owner_id, file_id, params.replicas)
        .await
        .map_err(locate_error)?;

    Ok(JSend::success(LocateResponse {
        file: file_to_response(&located.file),
        ownership: ownership_to_response(&located.ownership),
        resolved: located.resolved,
    }))
}

// ============================================================================
// Helpers
// ============================================================================

/// Split a client-supplied upload name into (filename, extension).
fn split_upload_name(name: Option<&str>) -> (String, String) {
    let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => name,
        None => return ("upload".to_string(), String::new()),
    };

    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), ext.to_string()),
        _ => (name.to_string(), String::new()),
    }
}

fn file_to_response(file: &FileRecord) -> FileResponse {
    FileResponse {
        created_at: file.created_at.to_rfc3339(),
        hash: file.hash.clone(),
        id: file.id,
        importance: file.importance,
        mime_type: file.mime_type.clone(),
        size: file.size,
    }
}

fn ownership_to_response(ownership: &OwnershipRecord) -> OwnershipResponse {
    OwnershipResponse {
        created_at: ownership.created_at.to_rfc3339(),
        extension: ownership.extension.clone(),
        file_id: ownership.file_id,
        filename: ownership.filename.clone(),
        id: ownership.id,
        owner_id: ownership.owner_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{stage_upload, test_state};
    use axum::http::StatusCode;

    #[test]
    fn test_split_upload_name() {
        assert_eq!(
            split_upload_name(Some("photo.png")),
            ("photo".to_string(), "png".to_string())
        );
        assert_eq!(
            split_upload_name(Some("archive.tar.gz")),
            ("archive.tar".to_string(), "gz".to_string())
        );
        assert_eq!(
            split_upload_name(Some(".bashrc")),
            (".bashrc".to_string(), String::new())
        );
        assert_eq!(
            split_upload_name(None),
            ("upload".to_string(), String::new())
        );
    }

    #[tokio::test]
    async fn test_locate_unowned_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let upload = stage_upload(&dir, "a", b"owned by someone else");
        let outcome = state.ingestor.store(&upload, "a", "txt", 1).unwrap();

        let result = locate_file(
            State(Arc::clone(&state)),
            Path((2, outcome.file_id)),
            AppQuery(LocateParams { replicas: 0 }),
        )
        .await;

        match result {
            Err(ApiError::Fail(code, _)) => assert_eq!(code, StatusCode::NOT_FOUND),
            other => panic!("expected 404, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_locate_owned_returns_local_copy() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let upload = stage_upload(&dir, "b", b"report body");
        let outcome = state.ingestor.store(&upload, "report", "txt", 5).unwrap();

        let Json(body) = locate_file(
            State(Arc::clone(&state)),
            Path((5, outcome.file_id)),
            AppQuery(LocateParams { replicas: 0 }),
        )
        .await
        .unwrap();

        assert_eq!(body.data.file.id, outcome.file_id);
        assert_eq!(body.data.ownership.filename, "report");
        assert_eq!(body.data.resolved.len(), 1);
        match &body.data.resolved[0] {
            AccessDescriptor::Local { filename, size, .. } => {
                assert_eq!(filename, "report.txt");
                assert_eq!(*size, 11);
            }
            other => panic!("expected local descriptor, got {other:?}"),
        }
    }

    #[test]
    fn test_descriptor_wire_format() {
        let descriptor = AccessDescriptor::Replica {
            storage_id: 2,
            location_id: 5,
            uri: "https://replica.example.com/abc".to_string(),
            filename: "notes.txt".to_string(),
        };

        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "replica",
                "storage_id": 2,
                "location_id": 5,
                "uri": "https://replica.example.com/abc",
                "filename": "notes.txt",
            })
        );
    }

    #[tokio::test]
    async fn test_locate_rejects_too_many_replicas() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let result = locate_file(
            State(state),
            Path((1, 1)),
            AppQuery(LocateParams {
                replicas: MAX_REPLICAS_PER_REQUEST + 1,
            }),
        )
        .await;

        match result {
            Err(ApiError::Fail(code, _)) => assert_eq!(code, StatusCode::BAD_REQUEST),
            other => panic!("expected 400, got {other:?}"),
        }
    }
}
