use std::fs::File;
use std::io::Read;
use std::path::Path;

use ring::digest::{Context, SHA256};

use crate::ports::ContentHasher;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// SHA-256 of the file contents, lowercase hex.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Hasher;

impl ContentHasher for Sha256Hasher {
    fn hash(&self, path: &Path) -> std::io::Result<String> {
        let mut file = File::open(path)?;
        let mut context = Context::new(&SHA256);
        let mut buf = vec![0u8; READ_BUFFER_SIZE];

        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            context.update(&buf[..n]);
        }

        Ok(hex::encode(context.finish().as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello");
        std::fs::write(&path, b"hello world").unwrap();

        assert_eq!(
            Sha256Hasher.hash(&path).unwrap(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_same_bytes_same_hash() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.bin");
        std::fs::write(&a, b"identical").unwrap();
        std::fs::write(&b, b"identical").unwrap();

        assert_eq!(Sha256Hasher.hash(&a).unwrap(), Sha256Hasher.hash(&b).unwrap());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Sha256Hasher.hash(&dir.path().join("missing")).is_err());
    }
}
