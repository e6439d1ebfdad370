//! Archive and extract tasks wrapping a pluggable archive engine.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::error;

use porter_archive::{ArchiveEngine, CompressOption, ExtractOption};
use porter_core::TaskType;

use crate::hooks::{DoneHook, ErrorHook, ItemHook};
use crate::info::TaskInfo;

#[derive(Clone, Default)]
pub struct ArchiveOptions {
    /// Files or directory trees to pack.
    pub sources: Vec<PathBuf>,
    /// Path of the archive to create; the extension picks the format.
    pub output: PathBuf,
    pub password: Option<String>,
    pub on_done: Option<DoneHook>,
    pub on_error: Option<ErrorHook>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveOutput {
    pub archive: String,
    pub source_count: usize,
}

/// One (archive, destination, password) triple in an extract batch.
#[derive(Debug, Clone)]
pub struct ExtractItem {
    pub input: PathBuf,
    pub output: PathBuf,
    pub password: Option<String>,
}

#[derive(Clone, Default)]
pub struct ExtractOptions {
    pub items: Vec<ExtractItem>,
    pub on_done: Option<DoneHook>,
    pub on_item_complete: Option<ItemHook>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractOutput {
    /// Base names of the archives in the batch.
    pub archives: Vec<String>,
    pub total: usize,
    pub complete: usize,
    pub current: String,
}

/// Packs the full source list in one engine call; any failure is fatal.
pub struct ArchiveTask {
    pub(crate) info: TaskInfo,
    pub(crate) options: ArchiveOptions,
    pub(crate) output: Arc<Mutex<ArchiveOutput>>,
    pub(crate) engine: Arc<dyn ArchiveEngine>,
}

impl ArchiveTask {
    pub(crate) fn new(
        options: ArchiveOptions,
        username: &str,
        engine: Arc<dyn ArchiveEngine>,
    ) -> Self {
        let output = ArchiveOutput {
            archive: options.output.to_string_lossy().into_owned(),
            source_count: options.sources.len(),
        };
        Self {
            info: TaskInfo::new(TaskType::Archive, username),
            options,
            output: Arc::new(Mutex::new(output)),
            engine,
        }
    }

    pub(crate) fn info(&self) -> &TaskInfo {
        &self.info
    }

    pub async fn output(&self) -> ArchiveOutput {
        self.output.lock().await.clone()
    }

    pub(crate) async fn run(&self) {
        let id = self.info.id();
        let engine = Arc::clone(&self.engine);
        let sources = self.options.sources.clone();
        let target = self.options.output.clone();
        let option = CompressOption {
            password: self.options.password.clone(),
        };

        let result = tokio::task::spawn_blocking(move || {
            engine.compress(&sources, &target, &option)
        })
        .await;

        match result.map_err(|e| e.to_string()).and_then(|r| r.map_err(|e| e.to_string())) {
            Ok(()) => {
                self.info.finish_complete().await;
                if let Some(hook) = &self.options.on_done {
                    hook(id);
                }
            }
            Err(message) => {
                self.info.finish_error(&message).await;
                if let Some(hook) = &self.options.on_error {
                    hook(id, &message);
                }
            }
        }
    }
}

/// Extracts a batch of archives sequentially. A single item's failure
/// is logged and the batch continues; cancellation is honored at item
/// boundaries and counts as a normal completion.
pub struct ExtractTask {
    pub(crate) info: TaskInfo,
    pub(crate) options: ExtractOptions,
    pub(crate) output: Arc<Mutex<ExtractOutput>>,
    pub(crate) engine: Arc<dyn ArchiveEngine>,
}

impl ExtractTask {
    pub(crate) fn new(
        options: ExtractOptions,
        username: &str,
        engine: Arc<dyn ArchiveEngine>,
    ) -> Self {
        let output = ExtractOutput {
            archives: options
                .items
                .iter()
                .map(|item| {
                    item.input
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| item.input.to_string_lossy().into_owned())
                })
                .collect(),
            total: options.items.len(),
            ..ExtractOutput::default()
        };
        Self {
            info: TaskInfo::new(TaskType::Unarchive, username),
            options,
            output: Arc::new(Mutex::new(output)),
            engine,
        }
    }

    pub(crate) fn info(&self) -> &TaskInfo {
        &self.info
    }

    pub async fn output(&self) -> ExtractOutput {
        self.output.lock().await.clone()
    }

    pub(crate) async fn run(&self) {
        let id = self.info.id();
        let stop = self.info.cancel_token();

        for item in &self.options.items {
            if stop.is_cancelled() {
                break;
            }
            self.output.lock().await.current = item.input.to_string_lossy().into_owned();

            let engine = Arc::clone(&self.engine);
            let input = item.input.clone();
            let target = item.output.clone();
            let option = ExtractOption {
                password: item.password.clone(),
            };
            let result = tokio::task::spawn_blocking(move || {
                engine.extract(&input, &target, &option)
            })
            .await;

            if let Err(e) = result.map_err(|e| e.to_string()).and_then(|r| r.map_err(|e| e.to_string())) {
                error!(task = %id, archive = %item.input.display(), error = %e, "extract item failed");
            }

            self.output.lock().await.complete += 1;
            if let Some(hook) = &self.options.on_item_complete {
                hook(id, &item.input);
            }
        }

        self.info.finish_complete().await;
        if let Some(hook) = &self.options.on_done {
            hook(id);
        }
    }
}
