use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use super::paths::local_file_path;
use crate::ports::{
    BoxError, ContentHasher, DirectoryChooser, FileMover, FileRepository, OwnershipRepository,
};

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Upload {path} is not a regular file (owner {owner_id})")]
    NoSourceFile { path: PathBuf, owner_id: u64 },
    #[error("Upload {path} is empty (owner {owner_id})")]
    EmptyContent { path: PathBuf, owner_id: u64 },
    #[error("Upload has {size} bytes, maximum is {max} (owner {owner_id})")]
    ContentTooLarge { size: u64, max: u64, owner_id: u64 },
    #[error("Failed to hash {path}: {source}")]
    HashFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to copy {hash} to {local_path}: {source}")]
    LocalCopyFailed {
        hash: String,
        local_path: String,
        source: std::io::Error,
    },
    #[error("Failed to identify or create file {hash}: {source}")]
    FileIdentificationFailed { hash: String, source: BoxError },
    #[error("Failed to identify ownership of file {file_id} for owner {owner_id} ({filename}.{extension}): {source}")]
    OwnershipIdentificationFailed {
        owner_id: u64,
        file_id: u64,
        filename: String,
        extension: String,
        source: BoxError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreOutcome {
    pub file_id: u64,
    pub ownership_id: u64,
}

/// Turns an uploaded file into a deduplicated file record plus an ownership.
pub struct Ingestor {
    files: Arc<dyn FileRepository>,
    ownerships: Arc<dyn OwnershipRepository>,
    hasher: Arc<dyn ContentHasher>,
    mover: Arc<dyn FileMover>,
    directories: Arc<dyn DirectoryChooser>,
    max_file_size: u64,
}

impl Ingestor {
    pub fn new(
        files: Arc<dyn FileRepository>,
        ownerships: Arc<dyn OwnershipRepository>,
        hasher: Arc<dyn ContentHasher>,
        mover: Arc<dyn FileMover>,
        directories: Arc<dyn DirectoryChooser>,
        max_file_size: u64,
    ) -> Self {
        Self {
            files,
            ownerships,
            hasher,
            mover,
            directories,
            max_file_size,
        }
    }

    /// Store the upload at `upload_path` for `owner_id`.
    ///
    /// Identical content is stored once: repeat uploads reuse the existing
    /// file and, for the same owner, the existing ownership. The upload is
    /// moved into place only when no copy exists at the canonical path yet,
    /// so the caller owns cleanup of `upload_path` when it is left behind.
    pub fn store(
        &self,
        upload_path: &Path,
        filename: &str,
        extension: &str,
        owner_id: u64,
    ) -> Result<StoreOutcome, IngestError> {
        let size = match std::fs::metadata(upload_path) {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => {
                return Err(IngestError::NoSourceFile {
                    path: upload_path.to_path_buf(),
                    owner_id,
                })
            }
        };

        if size == 0 {
            return Err(IngestError::EmptyContent {
                path: upload_path.to_path_buf(),
                owner_id,
            });
        }
        if size > self.max_file_size {
            return Err(IngestError::ContentTooLarge {
                size,
                max: self.max_file_size,
                owner_id,
            });
        }

        let mime_type = detect_mime_type(upload_path, extension);

        let hash = self
            .hasher
            .hash(upload_path)
            .map_err(|source| IngestError::HashFailed {
                path: upload_path.to_path_buf(),
                source,
            })?;

        // A known hash keeps the directory it was first stored under
        let known = self
            .files
            .find_by_hash(&hash)
            .map_err(|source| IngestError::FileIdentificationFailed {
                hash: hash.clone(),
                source,
            })?;
        let storage_dir = match known {
            Some(ref file) => file.storage_dir.clone(),
            None => self.directories.choose_for_store(size, &mime_type),
        };
        let local_path = local_file_path(&storage_dir, &hash);

        self.provide_local_copy(upload_path, &local_path, &hash)?;

        let file_id = match known {
            Some(file) => file.id,
            None => self.create_file(&hash, size, &mime_type, &storage_dir)?,
        };
        let ownership_id = self.identify_ownership(owner_id, file_id, filename, extension)?;

        tracing::debug!(
            owner_id,
            file_id,
            ownership_id,
            hash = %hash,
            "Stored file"
        );

        Ok(StoreOutcome {
            file_id,
            ownership_id,
        })
    }

    fn provide_local_copy(
        &self,
        upload_path: &Path,
        local_path: &str,
        hash: &str,
    ) -> Result<(), IngestError> {
        let target = Path::new(local_path);
        if target.is_file() {
            tracing::debug!(hash = %hash, path = %local_path, "Local copy exists, skipping move");
            return Ok(());
        }

        self.mover
            .move_file(upload_path, target)
            .map_err(|source| IngestError::LocalCopyFailed {
                hash: hash.to_string(),
                local_path: local_path.to_string(),
                source,
            })
    }

    /// Record a new file. The repository returns the winner's id when a
    /// concurrent ingest created the same hash first.
    fn create_file(
        &self,
        hash: &str,
        size: u64,
        mime_type: &str,
        storage_dir: &str,
    ) -> Result<u64, IngestError> {
        self.files
            .create(hash, size, mime_type, storage_dir)
            .map_err(|source| IngestError::FileIdentificationFailed {
                hash: hash.to_string(),
                source,
            })
    }

    fn identify_ownership(
        &self,
        owner_id: u64,
        file_id: u64,
        filename: &str,
        extension: &str,
    ) -> Result<u64, IngestError> {
        let failed = |source| IngestError::OwnershipIdentificationFailed {
            owner_id,
            file_id,
            filename: filename.to_string(),
            extension: extension.to_string(),
            source,
        };

        if let Some(ownership) = self
            .ownerships
            .find_owner_file(owner_id, file_id)
            .map_err(failed)?
        {
            return Ok(ownership.id);
        }

        self.ownerships
            .create(owner_id, file_id, filename, extension)
            .map_err(failed)
    }
}

/// Bytes read from the head of an upload for content sniffing
const SNIFF_LEN: u64 = 8192;

/// MIME type sniffed from the content, then guessed from the upload path,
/// then from the declared extension.
fn detect_mime_type(upload_path: &Path, extension: &str) -> String {
    sniff_mime_type(upload_path)
        .or_else(|| {
            mime_guess::from_path(upload_path)
                .first()
                .or_else(|| mime_guess::from_ext(extension.trim_start_matches('.')).first())
                .map(|m| m.to_string())
        })
        .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string())
}

fn sniff_mime_type(upload_path: &Path) -> Option<String> {
    let file = File::open(upload_path).ok()?;
    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    file.take(SNIFF_LEN).read_to_end(&mut head).ok()?;
    infer::get(&head).map(|kind| kind.mime_type().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn test_mime_from_upload_path() {
        assert_eq!(detect_mime_type(Path::new("/tmp/photo.png"), ""), "image/png");
    }

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(detect_mime_type(Path::new("/tmp/0a1b2c"), "pdf"), "application/pdf");
        assert_eq!(detect_mime_type(Path::new("/tmp/0a1b2c"), ".pdf"), "application/pdf");
    }

    #[test]
    fn test_mime_sniffed_from_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.txt");
        std::fs::write(&path, PNG_HEADER).unwrap();

        // Content wins over both the path and the declared extension
        assert_eq!(detect_mime_type(&path, "txt"), "image/png");
    }

    #[test]
    fn test_mime_fallback() {
        assert_eq!(detect_mime_type(Path::new("/tmp/0a1b2c"), ""), FALLBACK_MIME_TYPE);
    }
}
