//! Shared test helpers for handler tests.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, NodeConfig, ReplicationConfig, StorageConfig, StorageLayout};
use crate::object_store::LocalStore;
use crate::storage::Database;
use crate::strategies::ReplicaTarget;
use crate::AppState;

/// Create a test AppState with a temporary database, storage root and one
/// local replica target (storage 1, location 1). New files want no replicas.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let data_dir = temp_dir.path().join("data");
    let files_dir = temp_dir.path().join("files");
    let staging_dir = temp_dir.path().join("staging");
    let replica_dir = temp_dir.path().join("replica");

    let config = Config {
        node: NodeConfig {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: data_dir.to_string_lossy().to_string(),
        },
        replication: ReplicationConfig {
            default_importance: 0,
            interval_seconds: 0,
            ..Default::default()
        },
        storage: StorageConfig {
            layout: StorageLayout::ByType,
            root: files_dir.to_string_lossy().to_string(),
            staging_dir: staging_dir.to_string_lossy().to_string(),
        },
        test_mode: true,
        max_file_size: 10 * 1024 * 1024, // 10MB for tests
    };

    let replica_store = LocalStore::new(&replica_dir).expect("Failed to create replica store");
    let targets = vec![ReplicaTarget::new(1, 1, Arc::new(replica_store))];
    let db = Database::open(&data_dir)
        .expect("Failed to open test database")
        .with_default_importance(config.replication.default_importance)
        .with_replica_limit(targets.len());

    Arc::new(AppState::new(config, db, targets))
}

/// Write `content` to a fresh upload file inside the temp dir.
pub fn stage_upload(temp_dir: &tempfile::TempDir, name: &str, content: &[u8]) -> PathBuf {
    let dir = temp_dir.path().join("uploads");
    std::fs::create_dir_all(&dir).expect("Failed to create upload dir");
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write upload");
    path
}
