//! Recursive move: atomic rename when possible, stream-copy + delete
//! otherwise.

use std::fs;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use porter_core::{DuplicatePolicy, OpsError};

use crate::copy::transfer_stream;
use crate::notify::TransferNotifier;
use crate::path::resolve_duplicate;

type OpFuture<'a> = Pin<Box<dyn Future<Output = Result<(), OpsError>> + Send + 'a>>;

/// Move a file or directory tree to `dest`.
///
/// Shares the transfer notifier contract with [`crate::copy`]: rename
/// fast paths report the whole file size as a single byte delta.
pub async fn move_path(
    src: &Path,
    dest: &Path,
    notifier: &TransferNotifier,
    policy: DuplicatePolicy,
) -> Result<(), OpsError> {
    let meta = fs::metadata(src).map_err(|e| OpsError::io(src, e))?;
    if meta.is_dir() {
        move_dir(src, dest, notifier, policy).await
    } else {
        move_file(src, dest, notifier, policy).await
    }
}

/// Move a single file.
pub(crate) async fn move_file(
    src: &Path,
    dest: &Path,
    notifier: &TransferNotifier,
    policy: DuplicatePolicy,
) -> Result<(), OpsError> {
    if notifier.is_stopped() {
        return Ok(());
    }
    notifier.announce(src).await;

    let size = fs::metadata(src).map_err(|e| OpsError::io(src, e))?.len();
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| OpsError::io(parent, e))?;
    }
    let Some(target) = resolve_duplicate(dest, policy) else {
        notifier.done(src).await;
        return Ok(());
    };

    if fs::rename(src, &target).is_ok() {
        // Same-filesystem fast path: nothing was streamed, report the
        // whole size at once.
        notifier.delta(size).await;
        notifier.done(src).await;
        return Ok(());
    }

    // Cross-device fallback: stream the content, then drop the original.
    transfer_stream(src, &target, notifier).await?;
    let mode = fs::metadata(src)
        .map_err(|e| OpsError::io(src, e))?
        .permissions();
    if let Err(e) = fs::set_permissions(&target, mode) {
        tracing::debug!(path = %target.display(), error = %e, "mode propagation failed");
    }
    fs::remove_file(src).map_err(|e| OpsError::io(src, e))?;

    notifier.done(src).await;
    Ok(())
}

/// Depth-first directory move; the emptied source tree is removed once
/// every child has moved.
fn move_dir<'a>(
    src: &'a Path,
    dest: &'a Path,
    notifier: &'a TransferNotifier,
    policy: DuplicatePolicy,
) -> OpFuture<'a> {
    Box::pin(async move {
        if notifier.is_stopped() {
            return Ok(());
        }
        let meta = fs::metadata(src).map_err(|e| OpsError::io(src, e))?;
        fs::create_dir_all(dest).map_err(|e| OpsError::io(dest, e))?;
        let _ = fs::set_permissions(dest, meta.permissions());

        let entries = fs::read_dir(src).map_err(|e| OpsError::io(src, e))?;
        let mut failures: Vec<String> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| OpsError::io(src, e))?;
            let path = entry.path();
            let child_dest = dest.join(entry.file_name());
            let result = if path.is_dir() {
                move_dir(&path, &child_dest, notifier, policy).await
            } else {
                move_file(&path, &child_dest, notifier, policy).await
            };
            if let Err(e) = result {
                if e.is_stop_sentinel() {
                    return Err(e);
                }
                tracing::warn!(path = %path.display(), error = %e, "entry failed during move");
                failures.push(format!("{}: {e}", path.display()));
            }
        }

        if !failures.is_empty() {
            return Err(OpsError::Partial {
                failed: failures.len(),
                message: failures.join("; "),
            });
        }

        fs::remove_dir_all(src).map_err(|e| OpsError::io(src, e))?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::transfer_channel;
    use porter_core::EngineConfig;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_move_file_rename_fast_path() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.txt");
        let dest = dir.path().join("out/a.txt");
        fs::write(&src, b"payload").unwrap();

        let (tx, mut rx) = transfer_channel(&EngineConfig::default(), CancellationToken::new());
        move_path(&src, &dest, &tx, DuplicatePolicy::Overwrite).await.unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"payload");
        // The rename path reports the full size as one delta.
        assert_eq!(rx.byte_delta.recv().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_move_tree_removes_source() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("tree");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("a.txt"), b"aa").unwrap();
        fs::write(src.join("sub/b.txt"), b"bb").unwrap();

        let dest = dir.path().join("moved");
        let (tx, _rx) = transfer_channel(&EngineConfig::default(), CancellationToken::new());
        move_path(&src, &dest, &tx, DuplicatePolicy::Overwrite).await.unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(dest.join("a.txt")).unwrap(), b"aa");
        assert_eq!(fs::read(dest.join("sub/b.txt")).unwrap(), b"bb");
    }

    #[tokio::test]
    async fn test_move_rename_policy() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.txt");
        let dest = dir.path().join("out/a.txt");
        fs::write(&src, b"new").unwrap();
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        fs::write(&dest, b"old").unwrap();

        let (tx, _rx) = transfer_channel(&EngineConfig::default(), CancellationToken::new());
        move_path(&src, &dest, &tx, DuplicatePolicy::Rename).await.unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"old");
        assert_eq!(fs::read(dir.path().join("out/a_copy.txt")).unwrap(), b"new");
    }
}
