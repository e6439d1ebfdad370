//! Delete tasks: per-file progress over a recursive removal.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use porter_core::{EngineConfig, TaskType};
use porter_ops::{DeleteReceivers, SourceSummary, analyze_source, delete_channel};

use crate::hooks::{DoneHook, ErrorHook, ItemHook};
use crate::info::TaskInfo;
use crate::transfer::display_path;

#[derive(Clone, Default)]
pub struct DeleteOptions {
    /// Files or directory trees to remove.
    pub sources: Vec<PathBuf>,
    /// Maps a real source path to the path shown in progress output.
    pub display_paths: HashMap<PathBuf, String>,
    pub on_done: Option<DoneHook>,
    pub on_error: Option<ErrorHook>,
    pub on_item_complete: Option<ItemHook>,
}

/// Live progress of a delete task. `file_count` is fixed by the analyze
/// phase; directories are not counted, only files.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutput {
    pub file_count: usize,
    pub complete: usize,
    pub deleting: String,
    pub progress: f64,
}

pub struct DeleteTask {
    pub(crate) info: TaskInfo,
    pub(crate) options: DeleteOptions,
    pub(crate) output: Arc<Mutex<DeleteOutput>>,
    pub(crate) config: EngineConfig,
}

impl DeleteTask {
    pub(crate) fn new(options: DeleteOptions, username: &str, config: EngineConfig) -> Self {
        Self {
            info: TaskInfo::new(TaskType::Delete, username),
            options,
            output: Arc::new(Mutex::new(DeleteOutput::default())),
            config,
        }
    }

    pub(crate) fn info(&self) -> &TaskInfo {
        &self.info
    }

    /// Snapshot of the live progress.
    pub async fn output(&self) -> DeleteOutput {
        self.output.lock().await.clone()
    }

    pub(crate) async fn run(&self) {
        let id = self.info.id();

        let mut summary = SourceSummary::default();
        for src in &self.options.sources {
            let path = src.clone();
            let result = tokio::task::spawn_blocking(move || analyze_source(&path)).await;
            match result.map_err(|e| e.to_string()).and_then(|r| r.map_err(|e| e.to_string())) {
                Ok(part) => summary.absorb(part),
                Err(message) => {
                    self.info.finish_error(&message).await;
                    if let Some(hook) = &self.options.on_error {
                        hook(id, &message);
                    }
                    return;
                }
            }
        }
        self.output.lock().await.file_count = summary.file_count;
        self.info.set_running().await;
        debug!(task = %id, files = summary.file_count, "delete analyzed");

        let stop = self.info.cancel_token();
        let (notifier, receivers) = delete_channel(&self.config, stop.clone());
        let aggregator = self.spawn_aggregator(receivers, summary.file_count);

        let mut failure: Option<String> = None;
        for src in &self.options.sources {
            if stop.is_cancelled() {
                break;
            }
            match porter_ops::delete(src, &notifier).await {
                Ok(()) => {
                    if let Some(hook) = &self.options.on_item_complete {
                        hook(id, src);
                    }
                }
                // The first interrupt abandons the rest of the batch.
                Err(e) if e.is_stop_sentinel() => break,
                Err(e) => {
                    failure = Some(e.to_string());
                    break;
                }
            }
        }

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

    fn spawn_aggregator(&self, mut rx: DeleteReceivers, file_count: usize) -> JoinHandle<()> {
        let output = Arc::clone(&self.output);
        let display = self.options.display_paths.clone();
        tokio::spawn(async move {
            // Drain both channels fully; a closed sibling must not drop
            // queued completion events.
            let mut deleting_open = true;
            let mut deleted_open = true;
            while deleting_open || deleted_open {
                tokio::select! {
                    deleting = rx.deleting.recv(), if deleting_open => match deleting {
                        Some(path) => {
                            output.lock().await.deleting = display_path(&display, &path);
                        }
                        None => deleting_open = false,
                    },
                    deleted = rx.deleted.recv(), if deleted_open => match deleted {
                        Some(_) => {
                            let mut out = output.lock().await;
                            out.complete += 1;
                            if file_count > 0 {
                                out.progress = out.complete as f64 / file_count as f64;
                            }
                            if out.complete >= file_count {
                                return;
                            }
                        }
                        None => deleted_open = false,
                    },
                }
            }
        })
    }
}
