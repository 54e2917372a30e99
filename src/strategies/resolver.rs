use std::path::PathBuf;

use async_trait::async_trait;

use super::{display_name, ReplicaTarget};
use crate::coordinator::local_file_path;
use crate::ports::{AccessDescriptor, BoxError, Resolver, ResolverFactory};
use crate::storage::models::{FileRecord, OwnershipRecord, ReplicaRecord};

/// Resolves local copies to filesystem paths and replicas to target URIs.
///
/// Replicas on storage targets that are not configured here have no resolver.
pub struct StorageResolverFactory {
    targets: Vec<ReplicaTarget>,
}

impl StorageResolverFactory {
    pub fn new(targets: Vec<ReplicaTarget>) -> Self {
        Self { targets }
    }
}

impl ResolverFactory for StorageResolverFactory {
    fn make_for_local(
        &self,
        ownership: &OwnershipRecord,
        file: &FileRecord,
        _replicas: &[ReplicaRecord],
    ) -> Option<Box<dyn Resolver>> {
        Some(Box::new(LocalResolver {
            path: local_file_path(&file.storage_dir, &file.hash),
            filename: display_name(&ownership.filename, &ownership.extension),
            mime_type: file.mime_type.clone(),
            size: file.size,
        }))
    }

    fn make_for_replica(
        &self,
        ownership: &OwnershipRecord,
        _file: &FileRecord,
        replica: &ReplicaRecord,
    ) -> Option<Box<dyn Resolver>> {
        let target = self
            .targets
            .iter()
            .find(|t| t.is_at(replica.storage_id, replica.location_id))?;

        Some(Box::new(ReplicaResolver {
            target: target.clone(),
            key: replica.context.clone(),
            filename: display_name(&ownership.filename, &ownership.extension),
        }))
    }
}

struct LocalResolver {
    path: String,
    filename: String,
    mime_type: String,
    size: u64,
}

#[async_trait]
impl Resolver for LocalResolver {
    async fn resolve(&self) -> Result<AccessDescriptor, BoxError> {
        let meta = tokio::fs::metadata(PathBuf::from(&self.path)).await?;
        if !meta.is_file() {
            return Err(format!("{} is not a regular file", self.path).into());
        }

        Ok(AccessDescriptor::Local {
            path: self.path.clone(),
            filename: self.filename.clone(),
            mime_type: self.mime_type.clone(),
            size: self.size,
        })
    }
}

struct ReplicaResolver {
    target: ReplicaTarget,
    key: String,
    filename: String,
}

#[async_trait]
impl Resolver for ReplicaResolver {
    async fn resolve(&self) -> Result<AccessDescriptor, BoxError> {
        if !self.target.store.exists(&self.key).await? {
            return Err(format!(
                "object {} missing from storage {} location {}",
                self.key, self.target.storage_id, self.target.location_id
            )
            .into());
        }

        Ok(AccessDescriptor::Replica {
            storage_id: self.target.storage_id,
            location_id: self.target.location_id,
            uri: self.target.store.uri(&self.key),
            filename: self.filename.clone(),
        })
    }
}
