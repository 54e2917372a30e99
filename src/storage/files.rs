use chrono::Utc;
use redb::ReadableTable;

use super::db::{next_id, Database, DatabaseError};
use super::models::FileRecord;
use super::tables::*;

impl Database {
    // ========================================================================
    // File operations
    // ========================================================================

    /// Create a file record for `hash` unless one already exists.
    ///
    /// Returns the id of the file holding the hash, which is the existing
    /// record's id when another writer got there first.
    pub fn create_file(
        &self,
        hash: &str,
        size: u64,
        mime_type: &str,
        storage_dir: &str,
    ) -> Result<u64, DatabaseError> {
        debug_assert!(!hash.is_empty(), "file hash must not be empty");

        let write_txn = self.begin_write()?;
        let id = {
            let mut hash_table = write_txn.open_table(FILE_HASHES)?;
            let existing = hash_table.get(hash)?.map(|v| v.value());
            match existing {
                Some(id) => id,
                None => {
                    let id = next_id(&write_txn, "files")?;
                    let file = FileRecord {
                        id,
                        hash: hash.to_string(),
                        size,
                        mime_type: mime_type.to_string(),
                        storage_dir: storage_dir.to_string(),
                        importance: self.default_importance(),
                        created_at: Utc::now(),
                    };
                    let data = rmp_serde::to_vec_named(&file)?;
                    let mut table = write_txn.open_table(FILES)?;
                    table.insert(id, data.as_slice())?;
                    hash_table.insert(hash, id)?;
                    id
                }
            }
        };
        write_txn.commit()?;
        Ok(id)
    }

    /// Get a file by id
    pub fn get_file(&self, id: u64) -> Result<Option<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;

        match table.get(id)? {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    /// Get a file by content hash (resolves hash -> id -> file)
    pub fn get_file_by_hash(&self, hash: &str) -> Result<Option<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let hash_table = read_txn.open_table(FILE_HASHES)?;

        let id = match hash_table.get(hash)? {
            Some(data) => data.value(),
            None => return Ok(None),
        };

        let files_table = read_txn.open_table(FILES)?;
        match files_table.get(id)? {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    /// Change how many replicas a file should have. Returns false if the file does not exist.
    pub fn set_file_importance(&self, id: u64, importance: u32) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(FILES)?;
            let existing: Option<FileRecord> = match table.get(id)? {
                Some(data) => Some(rmp_serde::from_slice(data.value())?),
                None => None,
            };
            match existing {
                Some(mut file) => {
                    file.importance = importance;
                    let data = rmp_serde::to_vec_named(&file)?;
                    table.insert(id, data.as_slice())?;
                    true
                }
                None => false,
            }
        };
        write_txn.commit()?;
        Ok(updated)
    }

    /// Get all files in id order
    pub fn get_all_files(&self) -> Result<Vec<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;

        let mut files = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            files.push(rmp_serde::from_slice(value.value())?);
        }

        Ok(files)
    }

    /// Pick the file furthest below its desired replica count.
    ///
    /// The deficit is `importance - replicas`, with importance capped at the
    /// replica limit when one is set; ties go to the lowest id. Files with
    /// no deficit are never chosen.
    pub fn choose_file_for_replication(&self) -> Result<Option<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let files_table = read_txn.open_table(FILES)?;
        let index_table = read_txn.open_table(FILE_REPLICAS)?;

        let mut best: Option<(u64, FileRecord)> = None;
        for result in files_table.iter()? {
            let (_, value) = result?;
            let file: FileRecord = rmp_serde::from_slice(value.value())?;

            let replicas = match index_table.get(file.id)? {
                Some(data) => rmp_serde::from_slice::<Vec<u64>>(data.value())?.len() as u64,
                None => 0,
            };
            let wanted = match self.replica_limit() {
                Some(limit) => u64::from(file.importance).min(limit),
                None => u64::from(file.importance),
            };
            let deficit = wanted.saturating_sub(replicas);
            if deficit == 0 {
                continue;
            }

            // Iteration is in ascending id order, so strict > keeps the lowest id on ties
            if best.as_ref().map_or(true, |(d, _)| deficit > *d) {
                best = Some((deficit, file));
            }
        }

        Ok(best.map(|(_, file)| file))
    }
}
