//! Progress channel bundles connecting a work loop to its aggregator.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use porter_core::EngineConfig;

use crate::search::FoundFile;

/// Sending half of a copy/move progress pipeline.
///
/// The owning task clones its cancellation token into `stop`; primitives
/// check it at file boundaries and the byte-counting reader checks it on
/// every buffer read.
#[derive(Debug, Clone)]
pub struct TransferNotifier {
    pub current_file: mpsc::Sender<PathBuf>,
    pub byte_delta: mpsc::Sender<u64>,
    pub file_done: mpsc::Sender<PathBuf>,
    pub stop: CancellationToken,
    pub delta_tick: Duration,
}

/// Receiving half of a copy/move progress pipeline.
#[derive(Debug)]
pub struct TransferReceivers {
    pub current_file: mpsc::Receiver<PathBuf>,
    pub byte_delta: mpsc::Receiver<u64>,
    pub file_done: mpsc::Receiver<PathBuf>,
}

/// Create a connected transfer notifier/receiver pair.
pub fn transfer_channel(
    config: &EngineConfig,
    stop: CancellationToken,
) -> (TransferNotifier, TransferReceivers) {
    let (current_tx, current_rx) = mpsc::channel(config.channel_capacity);
    let (delta_tx, delta_rx) = mpsc::channel(config.channel_capacity);
    let (done_tx, done_rx) = mpsc::channel(config.channel_capacity);
    (
        TransferNotifier {
            current_file: current_tx,
            byte_delta: delta_tx,
            file_done: done_tx,
            stop,
            delta_tick: config.delta_tick,
        },
        TransferReceivers {
            current_file: current_rx,
            byte_delta: delta_rx,
            file_done: done_rx,
        },
    )
}

impl TransferNotifier {
    /// Whether a cooperative stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Report the file the work loop is about to process.
    pub(crate) async fn announce(&self, path: &Path) {
        let _ = self.current_file.send(path.to_path_buf()).await;
    }

    /// Report freshly transferred bytes.
    pub(crate) async fn delta(&self, bytes: u64) {
        if bytes > 0 {
            let _ = self.byte_delta.send(bytes).await;
        }
    }

    /// Report a fully transferred file.
    pub(crate) async fn done(&self, path: &Path) {
        let _ = self.file_done.send(path.to_path_buf()).await;
    }
}

/// Sending half of a delete progress pipeline.
#[derive(Debug, Clone)]
pub struct DeleteNotifier {
    pub deleting: mpsc::Sender<PathBuf>,
    pub deleted: mpsc::Sender<PathBuf>,
    pub stop: CancellationToken,
}

/// Receiving half of a delete progress pipeline.
#[derive(Debug)]
pub struct DeleteReceivers {
    pub deleting: mpsc::Receiver<PathBuf>,
    pub deleted: mpsc::Receiver<PathBuf>,
}

/// Create a connected delete notifier/receiver pair.
pub fn delete_channel(
    config: &EngineConfig,
    stop: CancellationToken,
) -> (DeleteNotifier, DeleteReceivers) {
    let (deleting_tx, deleting_rx) = mpsc::channel(config.channel_capacity);
    let (deleted_tx, deleted_rx) = mpsc::channel(config.channel_capacity);
    (
        DeleteNotifier {
            deleting: deleting_tx,
            deleted: deleted_tx,
            stop,
        },
        DeleteReceivers {
            deleting: deleting_rx,
            deleted: deleted_rx,
        },
    )
}

impl DeleteNotifier {
    pub(crate) async fn deleting(&self, path: &Path) {
        let _ = self.deleting.send(path.to_path_buf()).await;
    }

    pub(crate) async fn deleted(&self, path: &Path) {
        let _ = self.deleted.send(path.to_path_buf()).await;
    }
}

/// Sending half of a search pipeline. Hits are pushed as they are found
/// so the caller can forward them live.
#[derive(Debug, Clone)]
pub struct SearchNotifier {
    pub hit: mpsc::Sender<FoundFile>,
    pub stop: CancellationToken,
}

/// Receiving half of a search pipeline.
#[derive(Debug)]
pub struct SearchReceivers {
    pub hit: mpsc::Receiver<FoundFile>,
}

/// Create a connected search notifier/receiver pair.
pub fn search_channel(
    config: &EngineConfig,
    stop: CancellationToken,
) -> (SearchNotifier, SearchReceivers) {
    let (hit_tx, hit_rx) = mpsc::channel(config.channel_capacity);
    (
        SearchNotifier {
            hit: hit_tx,
            stop,
        },
        SearchReceivers { hit: hit_rx },
    )
}
