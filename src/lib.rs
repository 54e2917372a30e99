//! storage-coordinator - content-addressed, deduplicating, multi-tenant file storage
//!
//! This crate decides where every stored blob lives and who refers to it:
//! - Ingestion deduplicates uploads by content hash and records per-owner names
//! - Replication copies under-replicated files to configured replica targets
//! - Resolution turns an owner's file reference into local and replica access descriptors
//! - redb embedded database for file, ownership and replica records
//! - REST API with multipart upload support

pub mod api;
pub mod config;
pub mod coordinator;
pub mod object_store;
pub mod ports;
pub mod storage;
pub mod strategies;
#[cfg(test)]
pub mod testutil;

use std::sync::Arc;

use config::{Config, StorageLayout};
use coordinator::{Ingestor, Locator, ReplicationCoordinator};
use ports::DirectoryChooser;
use storage::Database;
use strategies::{
    FlatDirectory, FsMover, ObjectStoreReplicatorFactory, ReplicaTarget, Sha256Hasher,
    StorageResolverFactory, TypedDirectory,
};

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub ingestor: Ingestor,
    pub locator: Locator,
    pub replication: ReplicationCoordinator,
}

impl AppState {
    /// Wire the coordinators to the database and the default strategies.
    pub fn new(config: Config, db: Database, targets: Vec<ReplicaTarget>) -> Self {
        let repo = Arc::new(db.clone());

        let directories: Arc<dyn DirectoryChooser> = match config.storage.layout {
            StorageLayout::Flat => Arc::new(FlatDirectory::new(config.storage.root.clone())),
            StorageLayout::ByType => Arc::new(TypedDirectory::new(config.storage.root.clone())),
        };

        let ingestor = Ingestor::new(
            repo.clone(),
            repo.clone(),
            Arc::new(Sha256Hasher),
            Arc::new(FsMover),
            directories,
            config.max_file_size,
        );

        let replication = ReplicationCoordinator::new(
            repo.clone(),
            repo.clone(),
            Arc::new(ObjectStoreReplicatorFactory::new(targets.clone())),
        );

        let locator = Locator::new(
            repo.clone(),
            repo.clone(),
            repo,
            Arc::new(StorageResolverFactory::new(targets)),
        );

        Self {
            config,
            db,
            ingestor,
            locator,
            replication,
        }
    }
}
