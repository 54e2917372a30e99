use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{validate_key, ObjectStore, ObjectStoreError};

/// Replica target on a locally mounted filesystem (a second disk, an NFS mount).
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, ObjectStoreError> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn put_file(&self, key: &str, source: &Path) -> Result<(), ObjectStoreError> {
        let path = self.object_path(key)?;
        tokio::fs::copy(source, &path).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
        Ok(self.object_path(key)?.is_file())
    }

    fn uri(&self, key: &str) -> String {
        self.base_path.join(key).to_string_lossy().to_string()
    }
}
