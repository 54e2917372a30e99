/// Canonical local path of a file: the storage directory, with trailing
/// separators stripped, joined with the content hash.
pub fn local_file_path(storage_dir: &str, hash: &str) -> String {
    format!("{}/{}", storage_dir.trim_end_matches(&['/', '\\'][..]), hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joins_dir_and_hash() {
        assert_eq!(local_file_path("/data", "abc"), "/data/abc");
    }

    #[test]
    fn test_trailing_separators_ignored() {
        assert_eq!(local_file_path("/data/", "abc"), local_file_path("/data", "abc"));
        assert_eq!(local_file_path("/data//", "abc"), "/data/abc");
        assert_eq!(local_file_path("C:\\store\\", "abc"), "C:\\store/abc");
    }

    #[test]
    fn test_deterministic() {
        let first = local_file_path("./files/image", "deadbeef");
        let second = local_file_path("./files/image", "deadbeef");
        assert_eq!(first, second);
    }

    #[test]
    fn test_root_dir() {
        assert_eq!(local_file_path("/", "abc"), "/abc");
    }
}
