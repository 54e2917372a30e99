use chrono::Utc;
use redb::ReadableTable;

use super::db::{next_id, Database, DatabaseError};
use super::models::ReplicaRecord;
use super::tables::*;

impl Database {
    // ========================================================================
    // Replica operations
    // ========================================================================

    /// Record a completed replication and append it to the file's replica index
    pub fn create_replica(
        &self,
        file_id: u64,
        storage_id: u64,
        location_id: u64,
        context: &str,
    ) -> Result<u64, DatabaseError> {
        let write_txn = self.begin_write()?;
        let id = {
            let id = next_id(&write_txn, "replicas")?;
            let replica = ReplicaRecord {
                id,
                file_id,
                storage_id,
                location_id,
                context: context.to_string(),
                created_at: Utc::now(),
            };
            let data = rmp_serde::to_vec_named(&replica)?;
            let mut table = write_txn.open_table(REPLICAS)?;
            table.insert(id, data.as_slice())?;

            let mut index_table = write_txn.open_table(FILE_REPLICAS)?;
            let mut replica_ids: Vec<u64> = match index_table.get(file_id)? {
                Some(data) => rmp_serde::from_slice(data.value())?,
                None => Vec::new(),
            };
            replica_ids.push(id);
            let index_data = rmp_serde::to_vec_named(&replica_ids)?;
            index_table.insert(file_id, index_data.as_slice())?;
            id
        };
        write_txn.commit()?;
        Ok(id)
    }

    /// Get up to `count` replicas of a file, oldest first
    pub fn find_replicas_for_file(
        &self,
        file_id: u64,
        count: usize,
    ) -> Result<Vec<ReplicaRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let index_table = read_txn.open_table(FILE_REPLICAS)?;
        let table = read_txn.open_table(REPLICAS)?;

        let replica_ids: Vec<u64> = match index_table.get(file_id)? {
            Some(data) => rmp_serde::from_slice(data.value())?,
            None => return Ok(Vec::new()),
        };

        let mut replicas = Vec::new();
        for replica_id in replica_ids.into_iter().take(count) {
            if let Some(data) = table.get(replica_id)? {
                replicas.push(rmp_serde::from_slice(data.value())?);
            }
        }

        Ok(replicas)
    }

    /// Number of replicas recorded for a file
    pub fn count_replicas(&self, file_id: u64) -> Result<usize, DatabaseError> {
        let read_txn = self.begin_read()?;
        let index_table = read_txn.open_table(FILE_REPLICAS)?;

        match index_table.get(file_id)? {
            Some(data) => Ok(rmp_serde::from_slice::<Vec<u64>>(data.value())?.len()),
            None => Ok(0),
        }
    }
}
