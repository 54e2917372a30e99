use crate::ports::DirectoryChooser;
use crate::storage::models::FileType;

/// Every file goes under one root directory.
#[derive(Debug, Clone)]
pub struct FlatDirectory {
    root: String,
}

impl FlatDirectory {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }
}

impl DirectoryChooser for FlatDirectory {
    fn choose_for_store(&self, _size: u64, _mime_type: &str) -> String {
        self.root.clone()
    }
}

/// Files are partitioned under the root by [`FileType`], e.g. `<root>/image`.
#[derive(Debug, Clone)]
pub struct TypedDirectory {
    root: String,
}

impl TypedDirectory {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }
}

impl DirectoryChooser for TypedDirectory {
    fn choose_for_store(&self, _size: u64, mime_type: &str) -> String {
        let root = self.root.trim_end_matches(&['/', '\\'][..]);
        format!("{root}/{}", FileType::from_mime(mime_type).as_dir())
    }
}
