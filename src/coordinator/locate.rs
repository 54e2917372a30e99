use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::ports::{
    AccessDescriptor, BoxError, FileRepository, OwnershipRepository, ReplicaRepository,
    ResolverFactory,
};
use crate::storage::models::{FileRecord, OwnershipRecord};

/// Which copy a resolver was asked to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveTarget {
    Local,
    Replica(u64),
}

impl fmt::Display for ResolveTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveTarget::Local => write!(f, "local copy"),
            ResolveTarget::Replica(id) => write!(f, "replica {id}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("Owner {owner_id} does not own file {file_id}")]
    NotOwned { owner_id: u64, file_id: u64 },
    #[error("File {file_id} not found")]
    FileNotFound { file_id: u64 },
    #[error("Failed to load {entity} for file {file_id}: {source}")]
    Lookup {
        entity: &'static str,
        file_id: u64,
        source: BoxError,
    },
    #[error("No resolver for the {target} of file {file_id}{}", reason_suffix(.reason))]
    ResolverUnavailable {
        file_id: u64,
        target: ResolveTarget,
        /// Set when the resolver was built but failed to resolve
        reason: Option<BoxError>,
    },
}

fn reason_suffix(reason: &Option<BoxError>) -> String {
    reason.as_ref().map(|e| format!(": {e}")).unwrap_or_default()
}

#[derive(Debug, Clone, Serialize)]
pub struct Located {
    pub file: FileRecord,
    pub ownership: OwnershipRecord,
    /// Local copy first, then replicas in repository order
    pub resolved: Vec<AccessDescriptor>,
}

/// Resolves an owner's reference to a file into access descriptors.
pub struct Locator {
    files: Arc<dyn FileRepository>,
    ownerships: Arc<dyn OwnershipRepository>,
    replicas: Arc<dyn ReplicaRepository>,
    resolvers: Arc<dyn ResolverFactory>,
}

impl Locator {
    pub fn new(
        files: Arc<dyn FileRepository>,
        ownerships: Arc<dyn OwnershipRepository>,
        replicas: Arc<dyn ReplicaRepository>,
        resolvers: Arc<dyn ResolverFactory>,
    ) -> Self {
        Self {
            files,
            ownerships,
            replicas,
            resolvers,
        }
    }

    /// Resolve the local copy and up to `desired_replicas` replicas.
    ///
    /// All or nothing: if any requested copy cannot be resolved the whole
    /// call fails and no descriptors are returned.
    pub async fn locate(
        &self,
        owner_id: u64,
        file_id: u64,
        desired_replicas: usize,
    ) -> Result<Located, LocateError> {
        let ownership = self
            .ownerships
            .find_owner_file(owner_id, file_id)
            .map_err(|source| LocateError::Lookup {
                entity: "ownership",
                file_id,
                source,
            })?
            .ok_or(LocateError::NotOwned { owner_id, file_id })?;

        let file = self
            .files
            .get_by_id(file_id)
            .map_err(|source| LocateError::Lookup {
                entity: "file",
                file_id,
                source,
            })?
            .ok_or(LocateError::FileNotFound { file_id })?;

        let replicas = if desired_replicas > 0 {
            self.replicas
                .find_for_file(file_id, desired_replicas)
                .map_err(|source| LocateError::Lookup {
                    entity: "replicas",
                    file_id,
                    source,
                })?
        } else {
            Vec::new()
        };

        let mut resolved = Vec::with_capacity(replicas.len() + 1);

        let local = self
            .resolvers
            .make_for_local(&ownership, &file, &replicas)
            .ok_or(LocateError::ResolverUnavailable {
                file_id,
                target: ResolveTarget::Local,
                reason: None,
            })?;
        resolved.push(run(local.resolve().await, file_id, ResolveTarget::Local)?);

        for replica in &replicas {
            let target = ResolveTarget::Replica(replica.id);
            let resolver = self
                .resolvers
                .make_for_replica(&ownership, &file, replica)
                .ok_or(LocateError::ResolverUnavailable {
                    file_id,
                    target,
                    reason: None,
                })?;
            resolved.push(run(resolver.resolve().await, file_id, target)?);
        }

        tracing::debug!(
            owner_id,
            file_id,
            descriptors = resolved.len(),
            "Located file"
        );

        Ok(Located {
            file,
            ownership,
            resolved,
        })
    }
}

fn run(
    outcome: Result<AccessDescriptor, BoxError>,
    file_id: u64,
    target: ResolveTarget,
) -> Result<AccessDescriptor, LocateError> {
    outcome.map_err(|e| {
        tracing::info!(file_id, %target, error = %e, "Resolver failed");
        LocateError::ResolverUnavailable {
            file_id,
            target,
            reason: Some(e),
        }
    })
}
