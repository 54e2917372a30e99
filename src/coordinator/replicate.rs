use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use super::paths::local_file_path;
use crate::ports::{
    BoxError, FileRepository, ReplicaRepository, ReplicationResult, ReplicatorFactory,
};
use crate::storage::models::ReplicaRecord;

#[derive(Debug, Error)]
pub enum ReplicationError {
    #[error("No file needs replication")]
    NoFileNeedsReplication,
    #[error("Failed to choose a file for replication: {0}")]
    Selection(BoxError),
    #[error("Local copy of file {file_id} missing at {local_path}")]
    LocalCopyMissing { file_id: u64, local_path: String },
    #[error("Failed to load replicas of file {file_id}: {source}")]
    ReplicaLookupFailed { file_id: u64, source: BoxError },
    #[error("No replicator available for file {file_id} ({existing} existing replicas)")]
    ReplicatorUnavailable { file_id: u64, existing: usize },
    #[error("Failed to replicate file {file_id} from {local_path}: {source}")]
    ReplicationFailed {
        file_id: u64,
        local_path: String,
        source: BoxError,
    },
    #[error("Replicated file {file_id} but failed to record the replica: {source}")]
    ReplicaRecordFailed {
        file_id: u64,
        result: ReplicationResult,
        source: BoxError,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplicationSummary {
    pub file_id: u64,
    /// Replicas that existed before this run
    pub prior_replicas: Vec<ReplicaRecord>,
    pub result: ReplicationResult,
    pub replica_id: u64,
}

/// Adds one replica to one under-replicated file per call.
///
/// There is no loop and no retry here; a scheduler calls
/// [`replicate_one`](Self::replicate_one) repeatedly.
pub struct ReplicationCoordinator {
    files: Arc<dyn FileRepository>,
    replicas: Arc<dyn ReplicaRepository>,
    replicators: Arc<dyn ReplicatorFactory>,
}

impl ReplicationCoordinator {
    pub fn new(
        files: Arc<dyn FileRepository>,
        replicas: Arc<dyn ReplicaRepository>,
        replicators: Arc<dyn ReplicatorFactory>,
    ) -> Self {
        Self {
            files,
            replicas,
            replicators,
        }
    }

    pub async fn replicate_one(&self) -> Result<ReplicationSummary, ReplicationError> {
        let file = self
            .files
            .choose_file_for_replication()
            .map_err(ReplicationError::Selection)?
            .ok_or(ReplicationError::NoFileNeedsReplication)?;

        let local_path = local_file_path(&file.storage_dir, &file.hash);
        if !Path::new(&local_path).is_file() {
            tracing::warn!(file_id = file.id, path = %local_path, "File record has no local copy");
            return Err(ReplicationError::LocalCopyMissing {
                file_id: file.id,
                local_path,
            });
        }

        let prior_replicas = self
            .replicas
            .find_for_file(file.id, file.importance as usize)
            .map_err(|source| ReplicationError::ReplicaLookupFailed {
                file_id: file.id,
                source,
            })?;

        let replicator = self
            .replicators
            .make_replicator(Path::new(&local_path), &file, &prior_replicas)
            .ok_or_else(|| ReplicationError::ReplicatorUnavailable {
                file_id: file.id,
                existing: prior_replicas.len(),
            })?;

        let result =
            replicator
                .replicate()
                .await
                .map_err(|source| ReplicationError::ReplicationFailed {
                    file_id: file.id,
                    local_path: local_path.clone(),
                    source,
                })?;

        let replica_id = match self.replicas.create(
            file.id,
            result.storage_id,
            result.location_id,
            &result.context,
        ) {
            Ok(id) => id,
            Err(source) => {
                return Err(ReplicationError::ReplicaRecordFailed {
                    file_id: file.id,
                    result,
                    source,
                })
            }
        };

        tracing::debug!(
            file_id = file.id,
            replica_id,
            storage_id = result.storage_id,
            location_id = result.location_id,
            "Replicated file"
        );

        Ok(ReplicationSummary {
            file_id: file.id,
            prior_replicas,
            result,
            replica_id,
        })
    }
}
