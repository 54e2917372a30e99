use redb::{Database as RedbDatabase, ReadTransaction, ReadableTable, WriteTransaction};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use super::tables::*;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Commit error: {0}")]
    Commit(Box<redb::CommitError>),
    #[error("Database error: {0}")]
    Redb(Box<redb::Error>),
    #[error("Database error: {0}")]
    RedbDatabase(Box<redb::DatabaseError>),
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),
    #[error("Storage error: {0}")]
    Storage(Box<redb::StorageError>),
    #[error("Table error: {0}")]
    Table(Box<redb::TableError>),
    #[error("Transaction error: {0}")]
    Transaction(Box<redb::TransactionError>),
}

impl From<redb::CommitError> for DatabaseError {
    fn from(e: redb::CommitError) -> Self {
        DatabaseError::Commit(Box::new(e))
    }
}

impl From<redb::DatabaseError> for DatabaseError {
    fn from(e: redb::DatabaseError) -> Self {
        DatabaseError::RedbDatabase(Box::new(e))
    }
}

impl From<redb::Error> for DatabaseError {
    fn from(e: redb::Error) -> Self {
        DatabaseError::Redb(Box::new(e))
    }
}

impl From<redb::StorageError> for DatabaseError {
    fn from(e: redb::StorageError) -> Self {
        DatabaseError::Storage(Box::new(e))
    }
}

impl From<redb::TableError> for DatabaseError {
    fn from(e: redb::TableError) -> Self {
        DatabaseError::Table(Box::new(e))
    }
}

impl From<redb::TransactionError> for DatabaseError {
    fn from(e: redb::TransactionError) -> Self {
        DatabaseError::Transaction(Box::new(e))
    }
}

/// Importance assigned to files created without an explicit override.
pub const DEFAULT_IMPORTANCE: u32 = 1;

/// Entity store for files, ownerships and replicas.
///
/// redb serializes write transactions, so every find-or-create runs its
/// index check and insert inside one write transaction. Two writers racing
/// on the same hash (or the same owner/file pair) both end up with the id
/// the first one committed.
pub struct Database {
    db: Arc<RedbDatabase>,
    default_importance: u32,
    /// Most replicas any file can hold; one per replica target
    replica_limit: Option<u64>,
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            default_importance: self.default_importance,
            replica_limit: self.replica_limit,
        }
    }
}

impl Database {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        let db_path = data_dir.as_ref().join("storage-coordinator.redb");
        let db = Arc::new(RedbDatabase::create(db_path)?);

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(FILES)?;
            let _ = write_txn.open_table(FILE_HASHES)?;
            let _ = write_txn.open_table(OWNERSHIPS)?;
            let _ = write_txn.open_table(OWNER_FILES)?;
            let _ = write_txn.open_table(REPLICAS)?;
            let _ = write_txn.open_table(FILE_REPLICAS)?;
            let _ = write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db,
            default_importance: DEFAULT_IMPORTANCE,
            replica_limit: None,
        })
    }

    /// Set the importance given to newly created files.
    pub fn with_default_importance(mut self, importance: u32) -> Self {
        self.default_importance = importance;
        self
    }

    pub fn default_importance(&self) -> u32 {
        self.default_importance
    }

    /// Cap the replicas replication selection aims for at `limit`,
    /// regardless of a file's importance. Without a cap importance alone
    /// decides.
    pub fn with_replica_limit(mut self, limit: usize) -> Self {
        self.replica_limit = Some(limit as u64);
        self
    }

    pub fn replica_limit(&self) -> Option<u64> {
        self.replica_limit
    }

    /// Begin a read transaction
    pub fn begin_read(&self) -> Result<ReadTransaction, DatabaseError> {
        Ok(self.db.begin_read()?)
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> Result<WriteTransaction, DatabaseError> {
        Ok(self.db.begin_write()?)
    }
}

/// Allocate the next id for `sequence` inside an open write transaction.
/// Ids start at 1.
pub(crate) fn next_id(write_txn: &WriteTransaction, sequence: &str) -> Result<u64, DatabaseError> {
    let mut table = write_txn.open_table(SEQUENCES)?;
    let last = table.get(sequence)?.map(|v| v.value()).unwrap_or(0);
    let id = last + 1;
    table.insert(sequence, id)?;
    Ok(id)
}
