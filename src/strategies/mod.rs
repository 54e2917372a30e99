//! Default implementations of the collaborator interfaces in [`crate::ports`].

mod directory;
mod hasher;
mod mover;
mod replicator;
mod resolver;

pub use directory::{FlatDirectory, TypedDirectory};
pub use hasher::Sha256Hasher;
pub use mover::FsMover;
pub use replicator::ObjectStoreReplicatorFactory;
pub use resolver::StorageResolverFactory;

use std::sync::Arc;

use crate::object_store::ObjectStore;

/// A configured place replicas can be written to and read from.
#[derive(Clone)]
pub struct ReplicaTarget {
    pub storage_id: u64,
    pub location_id: u64,
    pub store: Arc<dyn ObjectStore>,
}

impl ReplicaTarget {
    pub fn new(storage_id: u64, location_id: u64, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            storage_id,
            location_id,
            store,
        }
    }

    fn is_at(&self, storage_id: u64, location_id: u64) -> bool {
        self.storage_id == storage_id && self.location_id == location_id
    }
}

/// Name shown to the owner: `filename.extension`, or just the filename.
pub(crate) fn display_name(filename: &str, extension: &str) -> String {
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        filename.to_string()
    } else {
        format!("{filename}.{extension}")
    }
}
