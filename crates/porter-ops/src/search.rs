//! Filename substring search with live hit streaming.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use serde::Serialize;

use porter_core::OpsError;

use crate::notify::SearchNotifier;

/// A single search hit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundFile {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
}

type WalkFuture<'a> = Pin<Box<dyn Future<Output = Result<(), OpsError>> + Send + 'a>>;

/// Walk `root` looking for entries whose base name contains `key`
/// (case-sensitive). Hits are emitted on the notifier as they are found
/// and collected into the returned list.
///
/// The walk stops early when `limit` results have been found (0 means
/// unlimited) or when the stop token fires; both unwind through
/// sentinel errors that are swallowed here, so a stopped search still
/// returns the hits gathered so far.
pub async fn search(
    root: &Path,
    key: &str,
    notifier: &SearchNotifier,
    limit: usize,
) -> Result<Vec<FoundFile>, OpsError> {
    let mut results = Vec::new();
    match search_walk(root, key, notifier, limit, &mut results).await {
        Ok(()) => Ok(results),
        Err(e) if e.is_stop_sentinel() => Ok(results),
        Err(e) => Err(e),
    }
}

fn search_walk<'a>(
    path: &'a Path,
    key: &'a str,
    notifier: &'a SearchNotifier,
    limit: usize,
    results: &'a mut Vec<FoundFile>,
) -> WalkFuture<'a> {
    Box::pin(async move {
        let meta = fs::symlink_metadata(path).map_err(|e| OpsError::io(path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        if name.contains(key) {
            let hit = FoundFile {
                path: path.to_path_buf(),
                name,
                is_dir: meta.is_dir(),
                size: meta.len(),
            };
            let _ = notifier.hit.send(hit.clone()).await;
            results.push(hit);
            if limit != 0 && results.len() == limit {
                return Err(OpsError::LimitReached);
            }
        }
        if notifier.stop.is_cancelled() {
            return Err(OpsError::Interrupted);
        }

        if meta.is_dir() {
            let mut entries: Vec<_> = fs::read_dir(path)
                .map_err(|e| OpsError::io(path, e))?
                .collect::<Result<_, _>>()
                .map_err(|e| OpsError::io(path, e))?;
            entries.sort_by_key(|e| e.file_name());
            for entry in entries {
                search_walk(&entry.path(), key, notifier, limit, results).await?;
            }
        }
        Ok(())
    })
}
