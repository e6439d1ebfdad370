//! Small synchronous filesystem helpers exposed to the HTTP layer.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use serde::Serialize;

use porter_core::OpsError;

/// Rename a file or directory in place.
pub fn rename(old: &Path, new: &Path) -> Result<(), OpsError> {
    fs::rename(old, new).map_err(|e| OpsError::io(old, e))
}

/// Change permission bits. A no-op on platforms without Unix modes.
#[cfg(unix)]
pub fn chmod(path: &Path, mode: u32) -> Result<(), OpsError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| OpsError::io(path, e))
}

#[cfg(not(unix))]
pub fn chmod(_path: &Path, _mode: u32) -> Result<(), OpsError> {
    Ok(())
}

/// Create a directory chain with the given mode.
pub fn make_directory(path: &Path, mode: u32) -> Result<(), OpsError> {
    fs::create_dir_all(path).map_err(|e| OpsError::io(path, e))?;
    chmod(path, mode)
}

/// Create an empty file, truncating any existing content.
pub fn create_file(path: &Path) -> Result<(), OpsError> {
    fs::File::create(path).map_err(|e| OpsError::io(path, e))?;
    Ok(())
}

/// Write a text file, replacing any existing content.
pub fn write_text_file(path: &Path, content: &str) -> Result<(), OpsError> {
    fs::write(path, content).map_err(|e| OpsError::io(path, e))
}

/// Read a whole file as UTF-8 text.
pub fn read_text_file(path: &Path) -> Result<String, OpsError> {
    fs::read_to_string(path).map_err(|e| OpsError::io(path, e))
}

/// A directory listing entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

/// List a directory, sorted by name.
pub fn read_dir(path: &Path) -> Result<Vec<FileEntry>, OpsError> {
    let mut items = Vec::new();
    let entries = fs::read_dir(path).map_err(|e| OpsError::io(path, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| OpsError::io(path, e))?;
        let meta = entry.metadata().map_err(|e| OpsError::io(entry.path(), e))?;
        items.push(FileEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir: meta.is_dir(),
            size: meta.len(),
            modified: meta.modified().ok(),
        });
    }
    items.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rename_and_listing() {
        let dir = TempDir::new().unwrap();
        write_text_file(&dir.path().join("b.txt"), "bee").unwrap();
        create_file(&dir.path().join("a.txt")).unwrap();
        rename(&dir.path().join("b.txt"), &dir.path().join("c.txt")).unwrap();

        let listing = read_dir(dir.path()).unwrap();
        let names: Vec<_> = listing.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "c.txt"]);
        assert_eq!(listing[1].size, 3);
    }

    #[test]
    fn test_make_directory_and_text_round_trip() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("x/y/z");
        make_directory(&nested, 0o755).unwrap();
        write_text_file(&nested.join("note.txt"), "hello").unwrap();
        assert_eq!(read_text_file(&nested.join("note.txt")).unwrap(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn test_chmod_sets_mode() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.sh");
        create_file(&file).unwrap();
        chmod(&file, 0o750).unwrap();
        let mode = fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    }
}
