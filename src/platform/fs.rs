// BillExact - platform/fs.rs
//
// Small filesystem helpers shared by the data store and the exporters.
// Writes go through a sibling temp file and a rename so a crash mid-save
// never leaves a half-written book, history, or export behind.

use std::io;
use std::path::{Path, PathBuf};

/// Sibling temp path used while writing `path`.
pub fn temp_path_for(path: &Path) -> PathBuf {
    with_suffix(path, ".tmp")
}

/// Sibling path a damaged file is moved to before it is replaced.
pub fn backup_path_for(path: &Path) -> PathBuf {
    with_suffix(path, ".bak")
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Write `bytes` to `path` atomically (write temp, then rename).
///
/// Creates the parent directory if needed. On rename failure the temp file
/// is removed and the previous content of `path` is left untouched.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp = temp_path_for(path);
    std::fs::write(&tmp, bytes)?;

    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "File written atomically");
    Ok(())
}

/// Size of the file at `path` in bytes.
pub fn file_size(path: &Path) -> io::Result<u64> {
    Ok(std::fs::metadata(path)?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_temp_path_keeps_extension() {
        let tmp = temp_path_for(Path::new("/data/book.json"));
        assert_eq!(tmp, PathBuf::from("/data/book.json.tmp"));
        assert_eq!(
            backup_path_for(Path::new("/data/export_history.json")),
            PathBuf::from("/data/export_history.json.bak")
        );
    }

    #[test]
    fn test_write_atomic_creates_parent_and_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.txt");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert!(!temp_path_for(&path).exists());
        assert_eq!(file_size(&path).unwrap(), 6);
    }

    #[test]
    fn test_write_atomic_overwrites_stale_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(temp_path_for(&path), b"garbage").unwrap();

        write_atomic(&path, b"[]").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }
}
