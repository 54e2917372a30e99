use super::db::Database;
use super::models::{FileRecord, OwnershipRecord, ReplicaRecord};
use crate::ports::{BoxError, FileRepository, OwnershipRepository, ReplicaRepository};

impl FileRepository for Database {
    fn find_by_hash(&self, hash: &str) -> Result<Option<FileRecord>, BoxError> {
        Ok(self.get_file_by_hash(hash)?)
    }

    fn create(
        &self,
        hash: &str,
        size: u64,
        mime_type: &str,
        storage_dir: &str,
    ) -> Result<u64, BoxError> {
        Ok(self.create_file(hash, size, mime_type, storage_dir)?)
    }

    fn get_by_id(&self, id: u64) -> Result<Option<FileRecord>, BoxError> {
        Ok(self.get_file(id)?)
    }

    fn choose_file_for_replication(&self) -> Result<Option<FileRecord>, BoxError> {
        Ok(Database::choose_file_for_replication(self)?)
    }
}

impl OwnershipRepository for Database {
    fn find_owner_file(
        &self,
        owner_id: u64,
        file_id: u64,
    ) -> Result<Option<OwnershipRecord>, BoxError> {
        Ok(self.find_ownership(owner_id, file_id)?)
    }

    fn create(
        &self,
        owner_id: u64,
        file_id: u64,
        filename: &str,
        extension: &str,
    ) -> Result<u64, BoxError> {
        Ok(self.create_ownership(owner_id, file_id, filename, extension)?)
    }
}

impl ReplicaRepository for Database {
    fn find_for_file(&self, file_id: u64, count: usize) -> Result<Vec<ReplicaRecord>, BoxError> {
        Ok(self.find_replicas_for_file(file_id, count)?)
    }

    fn create(
        &self,
        file_id: u64,
        storage_id: u64,
        location_id: u64,
        context: &str,
    ) -> Result<u64, BoxError> {
        Ok(self.create_replica(file_id, storage_id, location_id, context)?)
    }
}
