//! Duplicate-destination resolution.

use std::path::{Path, PathBuf};

use porter_core::DuplicatePolicy;

/// Append a `_copy` suffix before the extension:
/// `a.txt` becomes `a_copy.txt`, `a_copy.txt` becomes `a_copy_copy.txt`.
pub(crate) fn duplicate_name(path: &Path) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_copy.{ext}"),
        None => format!("{stem}_copy"),
    };
    path.with_file_name(name)
}

/// Apply the duplicate policy to a destination path.
///
/// Returns the path to actually write, or `None` when the policy says to
/// skip this item. For `Rename` the `_copy` suffix is appended repeatedly
/// until an unused path is found; termination relies on the filesystem
/// not containing an unbounded `_copy` chain.
pub(crate) fn resolve_duplicate(dest: &Path, policy: DuplicatePolicy) -> Option<PathBuf> {
    if policy == DuplicatePolicy::Overwrite {
        return Some(dest.to_path_buf());
    }
    let mut target = dest.to_path_buf();
    while target.exists() {
        if policy == DuplicatePolicy::Skip {
            return None;
        }
        target = duplicate_name(&target);
    }
    Some(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_duplicate_name_suffix() {
        assert_eq!(
            duplicate_name(Path::new("/tmp/a.txt")),
            PathBuf::from("/tmp/a_copy.txt")
        );
        assert_eq!(
            duplicate_name(Path::new("/tmp/a_copy.txt")),
            PathBuf::from("/tmp/a_copy_copy.txt")
        );
        assert_eq!(
            duplicate_name(Path::new("/tmp/noext")),
            PathBuf::from("/tmp/noext_copy")
        );
    }

    #[test]
    fn test_resolve_overwrite_keeps_destination() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("a.txt");
        fs::write(&dest, b"x").unwrap();
        assert_eq!(
            resolve_duplicate(&dest, DuplicatePolicy::Overwrite),
            Some(dest.clone())
        );
    }

    #[test]
    fn test_resolve_skip_on_existing() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("a.txt");
        fs::write(&dest, b"x").unwrap();
        assert_eq!(resolve_duplicate(&dest, DuplicatePolicy::Skip), None);
        // A free path is used as-is even under skip.
        let free = dir.path().join("b.txt");
        assert_eq!(
            resolve_duplicate(&free, DuplicatePolicy::Skip),
            Some(free.clone())
        );
    }

    #[test]
    fn test_resolve_rename_walks_suffix_chain() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("a.txt");
        fs::write(&dest, b"x").unwrap();
        fs::write(dir.path().join("a_copy.txt"), b"x").unwrap();
        assert_eq!(
            resolve_duplicate(&dest, DuplicatePolicy::Rename),
            Some(dir.path().join("a_copy_copy.txt"))
        );
    }
}
