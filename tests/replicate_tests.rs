use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use storage_coordinator::coordinator::{Ingestor, ReplicationCoordinator, ReplicationError};
use storage_coordinator::object_store::{LocalStore, ObjectStore};
use storage_coordinator::ports::{
    BoxError, ReplicaRepository, ReplicationResult, Replicator, ReplicatorFactory,
};
use storage_coordinator::storage::models::{FileRecord, ReplicaRecord};
use storage_coordinator::storage::Database;
use storage_coordinator::strategies::{
    FlatDirectory, FsMover, ObjectStoreReplicatorFactory, ReplicaTarget, Sha256Hasher,
};

fn test_db(importance: u32) -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data"))
        .unwrap()
        .with_default_importance(importance);
    (dir, db)
}

/// Ingest `content` through the real pipeline and return the file id.
fn ingest(dir: &tempfile::TempDir, db: &Database, content: &[u8]) -> u64 {
    let ingestor = Ingestor::new(
        Arc::new(db.clone()),
        Arc::new(db.clone()),
        Arc::new(Sha256Hasher),
        Arc::new(FsMover),
        Arc::new(FlatDirectory::new(
            dir.path().join("files").to_string_lossy().to_string(),
        )),
        1024,
    );
    let upload = dir.path().join(format!("upload-{}", content.len()));
    std::fs::write(&upload, content).unwrap();
    ingestor.store(&upload, "f", "bin", 1).unwrap().file_id
}

/// Replicator factory with a scripted outcome.
struct ScriptedReplicators {
    available: bool,
    outcome: Result<ReplicationResult, String>,
    seen_existing: Mutex<Vec<usize>>,
}

impl ScriptedReplicators {
    fn reporting(storage_id: u64, location_id: u64, context: &str) -> Self {
        Self {
            available: true,
            outcome: Ok(ReplicationResult {
                storage_id,
                location_id,
                context: context.to_string(),
            }),
            seen_existing: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            available: true,
            outcome: Err("remote rejected upload".to_string()),
            seen_existing: Mutex::new(Vec::new()),
        }
    }

    fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::failing()
        }
    }
}

impl ReplicatorFactory for ScriptedReplicators {
    fn make_replicator(
        &self,
        local_path: &Path,
        file: &FileRecord,
        existing: &[ReplicaRecord],
    ) -> Option<Box<dyn Replicator>> {
        assert!(local_path.ends_with(&file.hash));
        self.seen_existing.lock().unwrap().push(existing.len());
        if !self.available {
            return None;
        }
        Some(Box::new(ScriptedReplicator {
            outcome: self.outcome.clone(),
        }))
    }
}

struct ScriptedReplicator {
    outcome: Result<ReplicationResult, String>,
}

#[async_trait]
impl Replicator for ScriptedReplicator {
    async fn replicate(&self) -> Result<ReplicationResult, BoxError> {
        self.outcome.clone().map_err(Into::into)
    }
}

/// Replica repository whose writes always fail.
struct BrokenReplicas {
    db: Database,
}

impl ReplicaRepository for BrokenReplicas {
    fn find_for_file(&self, file_id: u64, count: usize) -> Result<Vec<ReplicaRecord>, BoxError> {
        ReplicaRepository::find_for_file(&self.db, file_id, count)
    }

    fn create(&self, _: u64, _: u64, _: u64, _: &str) -> Result<u64, BoxError> {
        Err("database is read-only".into())
    }
}

fn coordinator(db: &Database, replicators: Arc<dyn ReplicatorFactory>) -> ReplicationCoordinator {
    ReplicationCoordinator::new(Arc::new(db.clone()), Arc::new(db.clone()), replicators)
}

#[tokio::test]
async fn test_replication_round_trip() {
    let (dir, db) = test_db(1);
    let file_id = ingest(&dir, &db, b"replicate me");
    let coordinator = coordinator(&db, Arc::new(ScriptedReplicators::reporting(7, 3, "tok")));

    let summary = coordinator.replicate_one().await.unwrap();
    assert_eq!(summary.file_id, file_id);
    assert!(summary.prior_replicas.is_empty());
    assert_eq!(
        summary.result,
        ReplicationResult {
            storage_id: 7,
            location_id: 3,
            context: "tok".to_string(),
        }
    );

    let replicas = db.find_replicas_for_file(file_id, 10).unwrap();
    assert_eq!(replicas.len(), 1);
    assert_eq!(replicas[0].id, summary.replica_id);
    assert_eq!(
        (replicas[0].storage_id, replicas[0].location_id, replicas[0].context.as_str()),
        (7, 3, "tok")
    );
}

#[tokio::test]
async fn test_nothing_to_replicate() {
    let (dir, db) = test_db(0);
    ingest(&dir, &db, b"unimportant");
    let coordinator = coordinator(&db, Arc::new(ScriptedReplicators::reporting(1, 1, "k")));

    assert!(matches!(
        coordinator.replicate_one().await,
        Err(ReplicationError::NoFileNeedsReplication)
    ));
}

#[tokio::test]
async fn test_satisfied_file_is_not_replicated_again() {
    let (dir, db) = test_db(1);
    ingest(&dir, &db, b"once is enough");
    let coordinator = coordinator(&db, Arc::new(ScriptedReplicators::reporting(1, 1, "k")));

    coordinator.replicate_one().await.unwrap();
    assert!(matches!(
        coordinator.replicate_one().await,
        Err(ReplicationError::NoFileNeedsReplication)
    ));
}

#[tokio::test]
async fn test_prior_replicas_reported() {
    let (dir, db) = test_db(2);
    let file_id = ingest(&dir, &db, b"twice");
    let replicators = Arc::new(ScriptedReplicators::reporting(1, 1, "k"));
    let coordinator = coordinator(&db, replicators.clone());

    let first = coordinator.replicate_one().await.unwrap();
    let second = coordinator.replicate_one().await.unwrap();

    assert!(first.prior_replicas.is_empty());
    assert_eq!(second.prior_replicas.len(), 1);
    assert_eq!(second.prior_replicas[0].id, first.replica_id);
    assert_eq!(second.file_id, file_id);
    assert_eq!(*replicators.seen_existing.lock().unwrap(), vec![0, 1]);
}

#[tokio::test]
async fn test_missing_local_copy() {
    let (dir, db) = test_db(1);
    let ghost_dir = dir.path().join("nowhere").to_string_lossy().to_string();
    let file_id = db
        .create_file("0123abcd", 10, "text/plain", &ghost_dir)
        .unwrap();
    let replicators = Arc::new(ScriptedReplicators::reporting(1, 1, "k"));
    let coordinator = coordinator(&db, replicators.clone());

    match coordinator.replicate_one().await {
        Err(ReplicationError::LocalCopyMissing {
            file_id: id,
            local_path,
        }) => {
            assert_eq!(id, file_id);
            assert_eq!(local_path, format!("{ghost_dir}/0123abcd"));
        }
        other => panic!("expected LocalCopyMissing, got {other:?}"),
    }
    assert!(replicators.seen_existing.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_no_replicator_available() {
    let (dir, db) = test_db(1);
    let file_id = ingest(&dir, &db, b"nowhere to go");
    let coordinator = coordinator(&db, Arc::new(ScriptedReplicators::unavailable()));

    assert!(matches!(
        coordinator.replicate_one().await,
        Err(ReplicationError::ReplicatorUnavailable { existing: 0, .. })
    ));
    assert_eq!(db.count_replicas(file_id).unwrap(), 0);
}

#[tokio::test]
async fn test_replicator_failure_records_nothing() {
    let (dir, db) = test_db(1);
    let file_id = ingest(&dir, &db, b"flaky remote");
    let coordinator = coordinator(&db, Arc::new(ScriptedReplicators::failing()));

    assert!(matches!(
        coordinator.replicate_one().await,
        Err(ReplicationError::ReplicationFailed { .. })
    ));
    assert_eq!(db.count_replicas(file_id).unwrap(), 0);
}

#[tokio::test]
async fn test_replica_record_failure_keeps_result() {
    let (dir, db) = test_db(1);
    ingest(&dir, &db, b"copied but not recorded");
    let coordinator = ReplicationCoordinator::new(
        Arc::new(db.clone()),
        Arc::new(BrokenReplicas { db: db.clone() }),
        Arc::new(ScriptedReplicators::reporting(9, 2, "orphan")),
    );

    match coordinator.replicate_one().await {
        Err(ReplicationError::ReplicaRecordFailed { result, .. }) => {
            assert_eq!(result.storage_id, 9);
            assert_eq!(result.context, "orphan");
        }
        other => panic!("expected ReplicaRecordFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_object_store_targets_fill_up() {
    let (dir, db) = test_db(2);
    let file_id = ingest(&dir, &db, b"to every target");

    let dirs: Vec<PathBuf> = vec![dir.path().join("replica-a"), dir.path().join("replica-b")];
    let targets = vec![
        ReplicaTarget::new(1, 1, Arc::new(LocalStore::new(&dirs[0]).unwrap())),
        ReplicaTarget::new(1, 2, Arc::new(LocalStore::new(&dirs[1]).unwrap())),
    ];
    let coordinator = coordinator(&db, Arc::new(ObjectStoreReplicatorFactory::new(targets)));

    let first = coordinator.replicate_one().await.unwrap();
    let second = coordinator.replicate_one().await.unwrap();
    assert_eq!((first.result.storage_id, first.result.location_id), (1, 1));
    assert_eq!((second.result.storage_id, second.result.location_id), (1, 2));

    let file = db.get_file(file_id).unwrap().unwrap();
    assert_eq!(first.result.context, file.hash);
    for replica_dir in &dirs {
        let store = LocalStore::new(replica_dir).unwrap();
        assert_eq!(std::fs::read(store.uri(&file.hash)).unwrap(), b"to every target");
    }

    assert!(matches!(
        coordinator.replicate_one().await,
        Err(ReplicationError::NoFileNeedsReplication)
    ));
}

#[tokio::test]
async fn test_object_store_targets_exhausted() {
    let (dir, db) = test_db(2);
    ingest(&dir, &db, b"only one target");

    let targets = vec![ReplicaTarget::new(
        4,
        1,
        Arc::new(LocalStore::new(dir.path().join("replica")).unwrap()),
    )];
    let coordinator = coordinator(&db, Arc::new(ObjectStoreReplicatorFactory::new(targets)));

    coordinator.replicate_one().await.unwrap();
    assert!(matches!(
        coordinator.replicate_one().await,
        Err(ReplicationError::ReplicatorUnavailable { existing: 1, .. })
    ));
}

#[tokio::test]
async fn test_unreachable_importance_does_not_starve_other_files() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data"))
        .unwrap()
        .with_replica_limit(1);
    let greedy = ingest(&dir, &db, b"wants five copies");
    let modest = ingest(&dir, &db, b"wants one");
    db.set_file_importance(greedy, 5).unwrap();

    let targets = vec![ReplicaTarget::new(
        1,
        1,
        Arc::new(LocalStore::new(dir.path().join("replica")).unwrap()),
    )];
    let coordinator = coordinator(&db, Arc::new(ObjectStoreReplicatorFactory::new(targets)));

    let mut replicated = Vec::new();
    for _ in 0..3 {
        match coordinator.replicate_one().await {
            Ok(summary) => replicated.push(summary.file_id),
            Err(ReplicationError::NoFileNeedsReplication) => break,
            Err(e) => panic!("replication should not stall: {e}"),
        }
    }

    assert_eq!(replicated, vec![greedy, modest]);
    assert_eq!(db.count_replicas(greedy).unwrap(), 1);
    assert_eq!(db.count_replicas(modest).unwrap(), 1);
}
