mod http;
mod local;

pub use http::HttpStore;
pub use local::LocalStore;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid object key: {0}")]
    InvalidKey(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A replica target holding copies of local files.
/// Keys are content hashes, so a key always names the same bytes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Copy the local file at `path` to `key`, replacing any existing object.
    async fn put_file(&self, key: &str, path: &Path) -> Result<(), ObjectStoreError>;

    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError>;

    /// Address a reader outside this process can use to fetch the object.
    fn uri(&self, key: &str) -> String;
}

/// Keys become path segments and URL components.
pub(crate) fn validate_key(key: &str) -> Result<(), ObjectStoreError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        && key != "."
        && key != "..";
    if valid {
        Ok(())
    } else {
        Err(ObjectStoreError::InvalidKey(key.to_string()))
    }
}
