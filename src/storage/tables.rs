use redb::TableDefinition;

/// File records: id -> FileRecord (msgpack)
pub const FILES: TableDefinition<u64, &[u8]> = TableDefinition::new("files");

/// Content index: hash -> file id. Enforces one File per hash.
pub const FILE_HASHES: TableDefinition<&str, u64> = TableDefinition::new("file_hashes");

/// Ownership records: id -> OwnershipRecord (msgpack)
pub const OWNERSHIPS: TableDefinition<u64, &[u8]> = TableDefinition::new("ownerships");

/// Ownership index: "owner_id:file_id" -> ownership id
pub const OWNER_FILES: TableDefinition<&str, u64> = TableDefinition::new("owner_files");

/// Replica records: id -> ReplicaRecord (msgpack)
pub const REPLICAS: TableDefinition<u64, &[u8]> = TableDefinition::new("replicas");

/// Replica index: file id -> msgpack Vec of replica ids, in creation order
pub const FILE_REPLICAS: TableDefinition<u64, &[u8]> = TableDefinition::new("file_replicas");

/// Id sequences: table name -> last allocated id
pub const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

pub(crate) fn owner_file_key(owner_id: u64, file_id: u64) -> String {
    format!("{owner_id}:{file_id}")
}
