//! Copy and move tasks with live progress aggregation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use porter_core::{DuplicatePolicy, EngineConfig, TaskType};
use porter_ops::{SourceSummary, TransferReceivers, analyze_source, transfer_channel};

use crate::hooks::{DoneHook, ErrorHook, ItemHook};
use crate::info::TaskInfo;

/// One source/destination pair in a transfer batch.
///
/// The destination is the full target path, so a single batch can fan
/// out to distinct directories or land an entry under a new base name.
#[derive(Debug, Clone)]
pub struct TransferPair {
    pub src: PathBuf,
    pub dest: PathBuf,
}

/// Options shared by copy and move tasks.
#[derive(Clone, Default)]
pub struct TransferOptions {
    /// Source/destination pairs, processed in order.
    pub pairs: Vec<TransferPair>,
    /// Maps a real source path to the path shown in progress output.
    /// Sources without an entry are shown as-is.
    pub display_paths: HashMap<PathBuf, String>,
    pub policy: DuplicatePolicy,
    pub on_done: Option<DoneHook>,
    pub on_error: Option<ErrorHook>,
    pub on_item_complete: Option<ItemHook>,
}

/// Live progress of a copy or move task.
///
/// `total_length` and `file_count` are fixed once the analyze phase
/// completes; `progress` reaches exactly 1 only when every file has
/// been reported complete.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOutput {
    pub total_length: u64,
    pub file_count: usize,
    pub complete: usize,
    pub complete_length: u64,
    pub files: Vec<String>,
    pub current: String,
    pub progress: f64,
    /// Bytes transferred during the last speed-tick window.
    pub speed: u64,
}

/// A copy or move task; the direction comes from the embedded
/// [`TaskInfo`] kind.
pub struct TransferTask {
    pub(crate) info: TaskInfo,
    pub(crate) options: TransferOptions,
    pub(crate) output: Arc<Mutex<TransferOutput>>,
    pub(crate) config: EngineConfig,
}

impl TransferTask {
    pub(crate) fn new(kind: TaskType, options: TransferOptions, username: &str, config: EngineConfig) -> Self {
        Self {
            info: TaskInfo::new(kind, username),
            options,
            output: Arc::new(Mutex::new(TransferOutput::default())),
            config,
        }
    }

    pub(crate) fn info(&self) -> &TaskInfo {
        &self.info
    }

    /// Snapshot of the live progress.
    pub async fn output(&self) -> TransferOutput {
        self.output.lock().await.clone()
    }

    /// Execute the transfer end to end: analyze, stream, aggregate.
    pub(crate) async fn run(&self) {
        let id = self.info.id();

        let summary = match self.analyze().await {
            Ok(summary) => summary,
            Err(message) => {
                self.info.finish_error(&message).await;
                if let Some(hook) = &self.options.on_error {
                    hook(id, &message);
                }
                return;
            }
        };
        self.info.set_running().await;
        debug!(task = %id, files = summary.file_count, bytes = summary.total_size, "transfer analyzed");

        let stop = self.info.cancel_token();
        let (notifier, receivers) = transfer_channel(&self.config, stop.clone());
        let aggregator = self.spawn_aggregator(receivers, summary.file_count);

        let mut failure: Option<String> = None;
        for pair in &self.options.pairs {
            if stop.is_cancelled() {
                break;
            }
            let result = match self.info.kind() {
                TaskType::Move => {
                    porter_ops::move_path(&pair.src, &pair.dest, &notifier, self.options.policy)
                        .await
                }
                _ => porter_ops::copy(&pair.src, &pair.dest, &notifier, self.options.policy).await,
            };
            match result {
                Ok(()) => {
                    if let Some(hook) = &self.options.on_item_complete {
                        hook(id, &pair.src);
                    }
                }
                Err(e) if e.is_stop_sentinel() => break,
                Err(e) => {
                    failure = Some(e.to_string());
                    break;
                }
            }
        }

        // Closing the sending half lets the aggregator drain and exit.
        drop(notifier);
        let _ = aggregator.await;

        match failure {
            None => {
                self.info.finish_complete().await;
                if let Some(hook) = &self.options.on_done {
                    hook(id);
                }
            }
            Some(message) => {
                self.info.finish_error(&message).await;
                if let Some(hook) = &self.options.on_error {
                    hook(id, &message);
                }
            }
        }
    }

    /// Pre-flight pass fixing the totals progress is computed against.
    async fn analyze(&self) -> Result<SourceSummary, String> {
        let mut summary = SourceSummary::default();
        for pair in &self.options.pairs {
            let path = pair.src.clone();
            let result = tokio::task::spawn_blocking(move || analyze_source(&path))
                .await
                .map_err(|e| e.to_string())?;
            summary.absorb(result.map_err(|e| e.to_string())?);
        }

        let mut output = self.output.lock().await;
        output.total_length = summary.total_size;
        output.file_count = summary.file_count;
        if summary.file_count == 0 {
            // Nothing to stream; the batch completes at full progress.
            output.progress = 1.0;
        }
        output.files = self
            .options
            .pairs
            .iter()
            .map(|pair| display_path(&self.options.display_paths, &pair.src))
            .collect();
        Ok(summary)
    }

    /// Merge progress events into the shared output until every file is
    /// complete or the sending half closes.
    fn spawn_aggregator(&self, mut rx: TransferReceivers, file_count: usize) -> JoinHandle<()> {
        let output = Arc::clone(&self.output);
        let display = self.options.display_paths.clone();
        let speed_tick = self.config.speed_tick;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(speed_tick);
            let mut tick_bytes = 0u64;
            // Each channel is drained to exhaustion; a closed sibling
            // must not drop queued completion events.
            let mut current_open = true;
            let mut delta_open = true;
            let mut done_open = true;
            while current_open || delta_open || done_open {
                tokio::select! {
                    current = rx.current_file.recv(), if current_open => match current {
                        Some(path) => {
                            output.lock().await.current = display_path(&display, &path);
                        }
                        None => current_open = false,
                    },
                    delta = rx.byte_delta.recv(), if delta_open => match delta {
                        Some(bytes) => {
                            tick_bytes += bytes;
                            let mut out = output.lock().await;
                            out.complete_length += bytes;
                            if out.total_length > 0 {
                                out.progress = out.complete_length as f64 / out.total_length as f64;
                            }
                        }
                        None => delta_open = false,
                    },
                    done = rx.file_done.recv(), if done_open => match done {
                        Some(_) => {
                            let mut out = output.lock().await;
                            out.complete += 1;
                            if file_count > 0 && out.complete >= file_count {
                                out.complete_length = out.total_length;
                                out.progress = 1.0;
                                return;
                            }
                        }
                        None => done_open = false,
                    },
                    _ = ticker.tick() => {
                        output.lock().await.speed = tick_bytes;
                        tick_bytes = 0;
                    }
                }
            }
        })
    }
}

/// Rewrite `path` through the display-path map: an exact entry wins,
/// a source-prefix entry rewrites the prefix, anything else passes
/// through unchanged.
pub(crate) fn display_path(map: &HashMap<PathBuf, String>, path: &Path) -> String {
    if let Some(display) = map.get(path) {
        return display.clone();
    }
    for (real, display) in map {
        if let Ok(rest) = path.strip_prefix(real) {
            return Path::new(display).join(rest).to_string_lossy().into_owned();
        }
    }
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_path_rewrites_source_prefix() {
        let mut map = HashMap::new();
        map.insert(PathBuf::from("/srv/storage/u1/docs"), "/docs".to_string());

        assert_eq!(
            display_path(&map, Path::new("/srv/storage/u1/docs")),
            "/docs"
        );
        assert_eq!(
            display_path(&map, Path::new("/srv/storage/u1/docs/a/b.txt")),
            "/docs/a/b.txt"
        );
        assert_eq!(
            display_path(&map, Path::new("/elsewhere/c.txt")),
            "/elsewhere/c.txt"
        );
    }
}
