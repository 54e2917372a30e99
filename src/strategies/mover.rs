use std::fs;
use std::path::Path;

use crate::ports::FileMover;

/// Moves uploads into place on the local filesystem.
///
/// Tries `rename` first and falls back to copy + delete when the source
/// lives on another filesystem. The copy goes through a temporary sibling
/// of the destination so readers never see a partial file.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsMover;

impl FileMover for FsMover {
    fn move_file(&self, src: &Path, dst: &Path) -> std::io::Result<()> {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }

        match fs::rename(src, dst) {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::debug!(error = %e, src = %src.display(), "Rename failed, copying instead");
                let partial = dst.with_extension(format!("partial-{}", uuid::Uuid::new_v4()));
                if let Err(e) = fs::copy(src, &partial).and_then(|_| fs::rename(&partial, dst)) {
                    let _ = fs::remove_file(&partial);
                    return Err(e);
                }
                fs::remove_file(src)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("upload");
        let dst = dir.path().join("store/image/abc");
        fs::write(&src, b"bytes").unwrap();

        FsMover.move_file(&src, &dst).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(&dst).unwrap(), b"bytes");
    }

    #[test]
    fn test_move_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let result = FsMover.move_file(&dir.path().join("nope"), &dir.path().join("dst"));
        assert!(result.is_err());
        assert!(!dir.path().join("dst").exists());
    }
}
