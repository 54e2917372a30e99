//! The three orchestration flows: ingestion, replication and resolution.
//!
//! They share the entity model in [`crate::storage::models`] and never
//! call each other.

mod ingest;
mod locate;
pub mod paths;
mod replicate;

pub use ingest::{IngestError, Ingestor, StoreOutcome};
pub use locate::{LocateError, Located, Locator, ResolveTarget};
pub use paths::local_file_path;
pub use replicate::{ReplicationCoordinator, ReplicationError, ReplicationSummary};
