//! Collaborator interfaces consumed by the coordinators.
//!
//! Each coordinator is constructed with only the capabilities it needs.
//! Repositories own persisted records; strategies own hashing, placement,
//! byte movement, replication transport and access resolution.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::storage::models::{FileRecord, OwnershipRecord, ReplicaRecord};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ============================================================================
// Repositories
// ============================================================================

pub trait FileRepository: Send + Sync {
    fn find_by_hash(&self, hash: &str) -> Result<Option<FileRecord>, BoxError>;

    /// Create a file for `hash`. Implementations must be safe under
    /// concurrent calls for the same hash and return the id of the single
    /// file that ends up holding it.
    fn create(
        &self,
        hash: &str,
        size: u64,
        mime_type: &str,
        storage_dir: &str,
    ) -> Result<u64, BoxError>;

    fn get_by_id(&self, id: u64) -> Result<Option<FileRecord>, BoxError>;

    /// One file that needs another replica, if any.
    fn choose_file_for_replication(&self) -> Result<Option<FileRecord>, BoxError>;
}

pub trait OwnershipRepository: Send + Sync {
    fn find_owner_file(
        &self,
        owner_id: u64,
        file_id: u64,
    ) -> Result<Option<OwnershipRecord>, BoxError>;

    /// Create an ownership. Same concurrency contract as
    /// [`FileRepository::create`], keyed by `(owner_id, file_id)`.
    fn create(
        &self,
        owner_id: u64,
        file_id: u64,
        filename: &str,
        extension: &str,
    ) -> Result<u64, BoxError>;
}

pub trait ReplicaRepository: Send + Sync {
    /// Up to `count` replicas of a file, in a stable order.
    fn find_for_file(&self, file_id: u64, count: usize) -> Result<Vec<ReplicaRecord>, BoxError>;

    fn create(
        &self,
        file_id: u64,
        storage_id: u64,
        location_id: u64,
        context: &str,
    ) -> Result<u64, BoxError>;
}

// ============================================================================
// Ingestion strategies
// ============================================================================

/// Deterministic content digest: identical bytes give identical hashes.
pub trait ContentHasher: Send + Sync {
    fn hash(&self, path: &Path) -> std::io::Result<String>;
}

/// Places source bytes at their canonical local path.
pub trait FileMover: Send + Sync {
    fn move_file(&self, src: &Path, dst: &Path) -> std::io::Result<()>;
}

/// Picks the storage directory for a new file.
pub trait DirectoryChooser: Send + Sync {
    fn choose_for_store(&self, size: u64, mime_type: &str) -> String;
}

// ============================================================================
// Replication
// ============================================================================

/// Where a replicator put a copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationResult {
    pub storage_id: u64,
    pub location_id: u64,
    pub context: String,
}

#[async_trait]
pub trait Replicator: Send + Sync {
    async fn replicate(&self) -> Result<ReplicationResult, BoxError>;
}

pub trait ReplicatorFactory: Send + Sync {
    /// Build a replicator for this file, or `None` if no target can take it.
    fn make_replicator(
        &self,
        local_path: &Path,
        file: &FileRecord,
        existing: &[ReplicaRecord],
    ) -> Option<Box<dyn Replicator>>;
}

// ============================================================================
// Resolution
// ============================================================================

/// A concrete way for the caller to read a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AccessDescriptor {
    Local {
        path: String,
        filename: String,
        mime_type: String,
        size: u64,
    },
    Replica {
        storage_id: u64,
        location_id: u64,
        uri: String,
        filename: String,
    },
}

#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self) -> Result<AccessDescriptor, BoxError>;
}

pub trait ResolverFactory: Send + Sync {
    fn make_for_local(
        &self,
        ownership: &OwnershipRecord,
        file: &FileRecord,
        replicas: &[ReplicaRecord],
    ) -> Option<Box<dyn Resolver>>;

    fn make_for_replica(
        &self,
        ownership: &OwnershipRecord,
        file: &FileRecord,
        replica: &ReplicaRecord,
    ) -> Option<Box<dyn Resolver>>;
}
