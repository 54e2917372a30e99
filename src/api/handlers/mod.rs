mod admin;
mod files;
mod replication;

use crate::api::response::ApiError;
use crate::coordinator::{IngestError, LocateError, ReplicationError};

pub use admin::health;
pub use files::{locate_file, store_file};
pub use replication::{replicate_one, set_importance};

/// Map an IngestError to an ApiError
fn ingest_error(e: IngestError) -> ApiError {
    match e {
        IngestError::NoSourceFile { .. } | IngestError::EmptyContent { .. } => {
            ApiError::bad_request(e.to_string())
        }
        IngestError::ContentTooLarge { .. } => ApiError::payload_too_large(e.to_string()),
        _ => {
            tracing::error!(error = %e, "Ingestion failed");
            ApiError::internal(e.to_string())
        }
    }
}

/// Map a LocateError to an ApiError
fn locate_error(e: LocateError) -> ApiError {
    match e {
        // Never reveal whether a file the caller does not own exists
        LocateError::NotOwned { .. } | LocateError::FileNotFound { .. } => {
            ApiError::not_found("File not found")
        }
        LocateError::ResolverUnavailable { .. } => ApiError::unavailable(e.to_string()),
        LocateError::Lookup { .. } => {
            tracing::error!(error = %e, "File lookup failed");
            ApiError::internal(e.to_string())
        }
    }
}

/// Map a ReplicationError to an ApiError
fn replication_error(e: ReplicationError) -> ApiError {
    match e {
        ReplicationError::NoFileNeedsReplication => ApiError::not_found(e.to_string()),
        ReplicationError::LocalCopyMissing { .. } => ApiError::conflict(e.to_string()),
        ReplicationError::ReplicatorUnavailable { .. } => ApiError::unavailable(e.to_string()),
        _ => {
            tracing::error!(error = %e, "Replication failed");
            ApiError::internal(e.to_string())
        }
    }
}
