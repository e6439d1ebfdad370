//! Pre-flight sizing pass for copy, move and delete tasks.

use std::fs;
use std::path::Path;

use porter_core::OpsError;

/// File count and byte totals computed before a transfer or deletion
/// starts. The totals are fixed once the analyze phase completes; tasks
/// never re-scan mid-flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceSummary {
    pub file_count: usize,
    pub dir_count: usize,
    pub total_size: u64,
}

impl SourceSummary {
    /// Fold another summary into this one.
    pub fn absorb(&mut self, other: SourceSummary) {
        self.file_count += other.file_count;
        self.dir_count += other.dir_count;
        self.total_size += other.total_size;
    }
}

/// Walk a source, counting files and bytes.
///
/// Synchronous; task loops run it inside `spawn_blocking`.
pub fn analyze_source(src: &Path) -> Result<SourceSummary, OpsError> {
    let meta = fs::metadata(src).map_err(|e| OpsError::io(src, e))?;
    if !meta.is_dir() {
        return Ok(SourceSummary {
            file_count: 1,
            dir_count: 0,
            total_size: meta.len(),
        });
    }

    let mut summary = SourceSummary {
        dir_count: 1,
        ..Default::default()
    };
    analyze_dir(src, &mut summary)?;
    Ok(summary)
}

fn analyze_dir(dir: &Path, summary: &mut SourceSummary) -> Result<(), OpsError> {
    let entries = fs::read_dir(dir).map_err(|e| OpsError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| OpsError::io(dir, e))?;
        let path = entry.path();
        let meta = entry.metadata().map_err(|e| OpsError::io(&path, e))?;
        if meta.is_dir() {
            summary.dir_count += 1;
            analyze_dir(&path, summary)?;
        } else {
            summary.file_count += 1;
            summary.total_size += meta.len();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_analyze_single_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.bin");
        fs::write(&file, vec![0u8; 512]).unwrap();

        let summary = analyze_source(&file).unwrap();
        assert_eq!(summary.file_count, 1);
        assert_eq!(summary.dir_count, 0);
        assert_eq!(summary.total_size, 512);
    }

    #[test]
    fn test_analyze_tree() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.txt"), b"12345").unwrap();
        fs::write(dir.path().join("sub/b.txt"), b"123").unwrap();

        let summary = analyze_source(dir.path()).unwrap();
        assert_eq!(summary.file_count, 2);
        assert_eq!(summary.dir_count, 2);
        assert_eq!(summary.total_size, 8);
    }

    #[test]
    fn test_analyze_missing_source() {
        let dir = TempDir::new().unwrap();
        let err = analyze_source(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, OpsError::NotFound { .. }));
    }
}
