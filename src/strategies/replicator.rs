use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::ReplicaTarget;
use crate::ports::{BoxError, ReplicationResult, Replicator, ReplicatorFactory};
use crate::storage::models::{FileRecord, ReplicaRecord};

/// Copies files to the first configured target that does not hold one yet.
pub struct ObjectStoreReplicatorFactory {
    targets: Vec<ReplicaTarget>,
}

impl ObjectStoreReplicatorFactory {
    pub fn new(targets: Vec<ReplicaTarget>) -> Self {
        Self { targets }
    }
}

impl ReplicatorFactory for ObjectStoreReplicatorFactory {
    fn make_replicator(
        &self,
        local_path: &Path,
        file: &FileRecord,
        existing: &[ReplicaRecord],
    ) -> Option<Box<dyn Replicator>> {
        let target = self.targets.iter().find(|t| {
            !existing
                .iter()
                .any(|r| t.is_at(r.storage_id, r.location_id))
        })?;

        Some(Box::new(ObjectStoreReplicator {
            target: target.clone(),
            local_path: local_path.to_path_buf(),
            key: file.hash.clone(),
        }))
    }
}

struct ObjectStoreReplicator {
    target: ReplicaTarget,
    local_path: PathBuf,
    key: String,
}

#[async_trait]
impl Replicator for ObjectStoreReplicator {
    async fn replicate(&self) -> Result<ReplicationResult, BoxError> {
        self.target
            .store
            .put_file(&self.key, &self.local_path)
            .await?;

        Ok(ReplicationResult {
            storage_id: self.target.storage_id,
            location_id: self.target.location_id,
            context: self.key.clone(),
        })
    }
}
