//! Recursive deletion with per-file progress events.

use std::fs;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use porter_core::OpsError;

use crate::notify::DeleteNotifier;

type OpFuture<'a> = Pin<Box<dyn Future<Output = Result<(), OpsError>> + Send + 'a>>;

/// Delete a file or directory tree.
///
/// Files are removed first, each one reported on the deleting/deleted
/// channels; emptied directories go last through a best-effort
/// `remove_dir_all`. The stop flag is inspected after each file and
/// surfaces as the `Interrupted` sentinel, which the task layer treats
/// as a clean stop.
pub async fn delete(src: &Path, notifier: &DeleteNotifier) -> Result<(), OpsError> {
    let meta = fs::metadata(src).map_err(|e| OpsError::io(src, e))?;
    if meta.is_dir() {
        delete_tree(src, src, notifier).await?;
        let _ = fs::remove_dir_all(src);
        Ok(())
    } else {
        delete_one(src, src, notifier).await
    }
}

/// Remove a single file, reporting the batch source it belongs to.
async fn delete_one(file: &Path, root: &Path, notifier: &DeleteNotifier) -> Result<(), OpsError> {
    notifier.deleting(root).await;
    fs::remove_file(file).map_err(|e| OpsError::io(file, e))?;
    notifier.deleted(root).await;
    if notifier.stop.is_cancelled() {
        return Err(OpsError::Interrupted);
    }
    Ok(())
}

fn delete_tree<'a>(dir: &'a Path, root: &'a Path, notifier: &'a DeleteNotifier) -> OpFuture<'a> {
    Box::pin(async move {
        let entries = fs::read_dir(dir).map_err(|e| OpsError::io(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| OpsError::io(dir, e))?;
            let path = entry.path();
            if path.is_dir() {
                delete_tree(&path, root, notifier).await?;
            } else {
                delete_one(&path, root, notifier).await?;
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::delete_channel;
    use porter_core::EngineConfig;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_delete_tree() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("tree");
        fs::create_dir_all(target.join("sub")).unwrap();
        fs::write(target.join("a.txt"), b"a").unwrap();
        fs::write(target.join("sub/b.txt"), b"b").unwrap();

        let (tx, mut rx) = delete_channel(&EngineConfig::default(), CancellationToken::new());
        delete(&target, &tx).await.unwrap();
        drop(tx);

        assert!(!target.exists());
        let mut deleted = 0;
        while rx.deleted.recv().await.is_some() {
            deleted += 1;
        }
        assert_eq!(deleted, 2);
    }

    #[tokio::test]
    async fn test_delete_single_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a.txt");
        fs::write(&target, b"a").unwrap();

        let (tx, _rx) = delete_channel(&EngineConfig::default(), CancellationToken::new());
        delete(&target, &tx).await.unwrap();
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_interrupt_stops_after_first_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("tree");
        fs::create_dir_all(&target).unwrap();
        for i in 0..5 {
            fs::write(target.join(format!("f{i}.txt")), b"x").unwrap();
        }

        let token = CancellationToken::new();
        token.cancel();
        let (tx, _rx) = delete_channel(&EngineConfig::default(), token);

        let err = delete(&target, &tx).await.unwrap_err();
        assert!(matches!(err, OpsError::Interrupted));
        // The flag is checked after each file, so exactly one is gone.
        assert_eq!(fs::read_dir(&target).unwrap().count(), 4);
    }

    #[tokio::test]
    async fn test_delete_missing_source_errors() {
        let dir = TempDir::new().unwrap();
        let (tx, _rx) = delete_channel(&EngineConfig::default(), CancellationToken::new());
        let err = delete(&dir.path().join("nope"), &tx).await.unwrap_err();
        assert!(matches!(err, OpsError::NotFound { .. }));
    }
}
