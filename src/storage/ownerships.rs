use chrono::Utc;
use redb::ReadableTable;

use super::db::{next_id, Database, DatabaseError};
use super::models::OwnershipRecord;
use super::tables::*;

impl Database {
    // ========================================================================
    // Ownership operations
    // ========================================================================

    /// Create an ownership for `(owner_id, file_id)` unless one already exists.
    ///
    /// Returns the id of the ownership for the pair. An existing ownership
    /// keeps its original filename and extension.
    pub fn create_ownership(
        &self,
        owner_id: u64,
        file_id: u64,
        filename: &str,
        extension: &str,
    ) -> Result<u64, DatabaseError> {
        let key = owner_file_key(owner_id, file_id);

        let write_txn = self.begin_write()?;
        let id = {
            let mut index_table = write_txn.open_table(OWNER_FILES)?;
            let existing = index_table.get(key.as_str())?.map(|v| v.value());
            match existing {
                Some(id) => id,
                None => {
                    let id = next_id(&write_txn, "ownerships")?;
                    let ownership = OwnershipRecord {
                        id,
                        owner_id,
                        file_id,
                        filename: filename.to_string(),
                        extension: extension.to_string(),
                        created_at: Utc::now(),
                    };
                    let data = rmp_serde::to_vec_named(&ownership)?;
                    let mut table = write_txn.open_table(OWNERSHIPS)?;
                    table.insert(id, data.as_slice())?;
                    index_table.insert(key.as_str(), id)?;
                    id
                }
            }
        };
        write_txn.commit()?;
        Ok(id)
    }

    /// Get an ownership by id
    pub fn get_ownership(&self, id: u64) -> Result<Option<OwnershipRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(OWNERSHIPS)?;

        match table.get(id)? {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    /// Find the ownership an owner holds on a file
    pub fn find_ownership(
        &self,
        owner_id: u64,
        file_id: u64,
    ) -> Result<Option<OwnershipRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let index_table = read_txn.open_table(OWNER_FILES)?;

        let id = match index_table.get(owner_file_key(owner_id, file_id).as_str())? {
            Some(data) => data.value(),
            None => return Ok(None),
        };

        let table = read_txn.open_table(OWNERSHIPS)?;
        match table.get(id)? {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }
}
