//! Recursive copy with byte-level progress and cooperative cancellation.

use std::fs;
use std::future::Future;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

use porter_core::{DuplicatePolicy, OpsError};

use crate::notify::TransferNotifier;
use crate::path::resolve_duplicate;
use crate::reader::CounterReader;

const COPY_BUF_SIZE: usize = 64 * 1024;

type OpFuture<'a> = Pin<Box<dyn Future<Output = Result<(), OpsError>> + Send + 'a>>;

/// Copy a file or directory tree to `dest`.
///
/// Emits current-file, byte-delta and file-complete events on the
/// notifier. Returns `OpsError::Interrupted` when the stop token fires
/// mid-stream; the caller treats that as a controlled stop.
pub async fn copy(
    src: &Path,
    dest: &Path,
    notifier: &TransferNotifier,
    policy: DuplicatePolicy,
) -> Result<(), OpsError> {
    let meta = fs::metadata(src).map_err(|e| OpsError::io(src, e))?;
    if meta.is_dir() {
        copy_dir(src, dest, notifier, policy).await
    } else {
        copy_file(src, dest, notifier, policy).await
    }
}

/// Copy a single file, resolving the duplicate policy first.
pub(crate) async fn copy_file(
    src: &Path,
    dest: &Path,
    notifier: &TransferNotifier,
    policy: DuplicatePolicy,
) -> Result<(), OpsError> {
    if notifier.is_stopped() {
        return Ok(());
    }
    notifier.announce(src).await;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| OpsError::io(parent, e))?;
    }
    let Some(target) = resolve_duplicate(dest, policy) else {
        // Skip policy: the item counts as done with zero bytes copied.
        notifier.done(src).await;
        return Ok(());
    };

    transfer_stream(src, &target, notifier).await?;

    // Mode bits follow the content. A source that cannot be re-stat'ed
    // after a successful copy fails the whole operation.
    let mode = fs::metadata(src)
        .map_err(|e| OpsError::io(src, e))?
        .permissions();
    if let Err(e) = fs::set_permissions(&target, mode) {
        tracing::debug!(path = %target.display(), error = %e, "mode propagation failed");
    }

    notifier.done(src).await;
    Ok(())
}

/// Depth-first directory copy. Creates the destination directory before
/// descending, collects sibling failures, and unwinds immediately on the
/// interrupt sentinel.
fn copy_dir<'a>(
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
                copy_dir(&path, &child_dest, notifier, policy).await
            } else {
                copy_file(&path, &child_dest, notifier, policy).await
            };
            if let Err(e) = result {
                if e.is_stop_sentinel() {
                    return Err(e);
                }
                tracing::warn!(path = %path.display(), error = %e, "entry failed during copy");
                failures.push(format!("{}: {e}", path.display()));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(OpsError::Partial {
                failed: failures.len(),
                message: failures.join("; "),
            })
        }
    })
}

/// Stream the contents of `src` into `target`, reporting byte deltas on
/// the notifier's ticker period.
pub(crate) async fn transfer_stream(
    src: &Path,
    target: &Path,
    notifier: &TransferNotifier,
) -> Result<(), OpsError> {
    let size = fs::metadata(src).map_err(|e| OpsError::io(src, e))?.len();
    let counter = Arc::new(AtomicU64::new(0));
    // Bytes already pushed through the delta channel. Updated before the
    // send so an aborted ticker can only under-report, never double-count.
    let reported = Arc::new(AtomicU64::new(0));

    let ticker = {
        let delta_tx = notifier.byte_delta.clone();
        let counter = Arc::clone(&counter);
        let reported = Arc::clone(&reported);
        let stop = notifier.stop.clone();
        let period = notifier.delta_tick;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let now = counter.load(Ordering::Relaxed);
                        let sent = reported.load(Ordering::Relaxed);
                        if now > sent {
                            reported.store(now, Ordering::Relaxed);
                            if delta_tx.send(now - sent).await.is_err() {
                                break;
                            }
                        }
                        if now >= size {
                            break;
                        }
                    }
                    _ = stop.cancelled() => break,
                }
            }
        })
    };

    let result = {
        let src = src.to_path_buf();
        let target = target.to_path_buf();
        let counter = Arc::clone(&counter);
        let stop = notifier.stop.clone();
        tokio::task::spawn_blocking(move || stream_copy(&src, &target, counter, stop))
            .await
            .map_err(|e| OpsError::other(format!("copy worker failed: {e}")))?
    };

    ticker.abort();
    let leftover = counter
        .load(Ordering::Relaxed)
        .saturating_sub(reported.load(Ordering::Relaxed));
    notifier.delta(leftover).await;

    result
}

/// Blocking read/write loop through the counting reader.
///
/// `std::io::copy` retries `Interrupted` reads, which would defeat the
/// cancellation path, so the loop is spelled out.
fn stream_copy(
    src: &PathBuf,
    dest: &PathBuf,
    counter: Arc<AtomicU64>,
    stop: CancellationToken,
) -> Result<(), OpsError> {
    let input = fs::File::open(src).map_err(|e| OpsError::io(src, e))?;
    let output = fs::File::create(dest).map_err(|e| OpsError::io(dest, e))?;
    let mut reader = CounterReader::with_counter(input, counter, stop);
    let mut writer = BufWriter::new(output);
    let mut buf = vec![0u8; COPY_BUF_SIZE];
    loop {
        let n = reader.read(&mut buf).map_err(|e| OpsError::io(src, e))?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n]).map_err(|e| OpsError::io(dest, e))?;
    }
    writer.flush().map_err(|e| OpsError::io(dest, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::transfer_channel;
    use porter_core::EngineConfig;
    use tempfile::TempDir;

    fn notifier() -> (TransferNotifier, crate::notify::TransferReceivers) {
        transfer_channel(&EngineConfig::default(), CancellationToken::new())
    }

    #[tokio::test]
    async fn test_copy_file_contents_and_done_event() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.txt");
        let dest = dir.path().join("out/a.txt");
        fs::write(&src, b"hello porter").unwrap();

        let (tx, mut rx) = notifier();
        copy(&src, &dest, &tx, DuplicatePolicy::Overwrite).await.unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"hello porter");
        assert_eq!(rx.file_done.recv().await.unwrap(), src);
    }

    #[tokio::test]
    async fn test_copy_tree_recurses() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("tree");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("a.txt"), b"aa").unwrap();
        fs::write(src.join("sub/b.txt"), b"bb").unwrap();

        let dest = dir.path().join("copy");
        let (tx, _rx) = notifier();
        copy(&src, &dest, &tx, DuplicatePolicy::Overwrite).await.unwrap();

        assert_eq!(fs::read(dest.join("a.txt")).unwrap(), b"aa");
        assert_eq!(fs::read(dest.join("sub/b.txt")).unwrap(), b"bb");
    }

    #[tokio::test]
    async fn test_copy_rename_policy_appends_suffix() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.txt");
        let dest = dir.path().join("a.txt");
        fs::write(&src, b"fresh").unwrap();

        let (tx, _rx) = notifier();
        copy_file(&src, &dest, &tx, DuplicatePolicy::Rename).await.unwrap();
        assert_eq!(fs::read(dir.path().join("a_copy.txt")).unwrap(), b"fresh");

        copy_file(&src, &dest, &tx, DuplicatePolicy::Rename).await.unwrap();
        assert_eq!(fs::read(dir.path().join("a_copy_copy.txt")).unwrap(), b"fresh");
    }

    #[tokio::test]
    async fn test_copy_skip_policy_leaves_destination() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.txt");
        let dest = dir.path().join("out/a.txt");
        fs::write(&src, b"new").unwrap();
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        fs::write(&dest, b"old").unwrap();

        let (tx, _rx) = notifier();
        copy_file(&src, &dest, &tx, DuplicatePolicy::Skip).await.unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_cancelled_copy_returns_interrupt() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("big.bin");
        fs::write(&src, vec![1u8; 256 * 1024]).unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let (tx, _rx) = transfer_channel(&EngineConfig::default(), token);

        // A pre-cancelled token makes copy a no-op at the file checkpoint.
        copy(&src, &dir.path().join("out.bin"), &tx, DuplicatePolicy::Overwrite)
            .await
            .unwrap();
        assert!(!dir.path().join("out.bin").exists());
    }
}
