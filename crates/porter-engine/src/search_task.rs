//! Search tasks: live hit streaming over a recursive name match.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use porter_core::{EngineConfig, TaskType};
use porter_ops::{FoundFile, SearchReceivers, search_channel};

use crate::hooks::{DoneHook, ErrorHook, HitHook};
use crate::info::TaskInfo;

#[derive(Clone, Default)]
pub struct SearchOptions {
    /// Directory tree to walk.
    pub root: PathBuf,
    /// Case-sensitive substring matched against entry base names.
    pub key: String,
    /// Stop after this many hits; 0 means unlimited.
    pub limit: usize,
    pub on_done: Option<DoneHook>,
    pub on_error: Option<ErrorHook>,
    pub on_hit: Option<HitHook>,
}

/// Hits gathered so far; grows while the task runs.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutput {
    pub files: Vec<FoundFile>,
}

pub struct SearchTask {
    pub(crate) info: TaskInfo,
    pub(crate) options: SearchOptions,
    pub(crate) output: Arc<Mutex<SearchOutput>>,
    pub(crate) config: EngineConfig,
}

impl SearchTask {
    pub(crate) fn new(options: SearchOptions, username: &str, config: EngineConfig) -> Self {
        Self {
            info: TaskInfo::new(TaskType::Search, username),
            options,
            output: Arc::new(Mutex::new(SearchOutput::default())),
            config,
        }
    }

    pub(crate) fn info(&self) -> &TaskInfo {
        &self.info
    }

    /// Snapshot of the hits found so far.
    pub async fn output(&self) -> SearchOutput {
        self.output.lock().await.clone()
    }

    pub(crate) async fn run(&self) {
        let id = self.info.id();
        let stop = self.info.cancel_token();
        let (notifier, receivers) = search_channel(&self.config, stop);
        let aggregator = self.spawn_aggregator(receivers);

        // Hits reach the output through the aggregator; the returned
        // list is the same set and is dropped here.
        let result =
            porter_ops::search(&self.options.root, &self.options.key, &notifier, self.options.limit)
                .await;

        drop(notifier);
        let _ = aggregator.await;

        match result {
            Ok(_) => {
                self.info.finish_complete().await;
                if let Some(hook) = &self.options.on_done {
                    hook(id);
                }
            }
            Err(e) => {
                let message = e.to_string();
                self.info.finish_error(&message).await;
                if let Some(hook) = &self.options.on_error {
                    hook(id, &message);
                }
            }
        }
    }

    fn spawn_aggregator(&self, mut rx: SearchReceivers) -> JoinHandle<()> {
        let output = Arc::clone(&self.output);
        let on_hit = self.options.on_hit.clone();
        let id = self.info.id();
        tokio::spawn(async move {
            while let Some(hit) = rx.hit.recv().await {
                if let Some(hook) = &on_hit {
                    hook(id, &hit);
                }
                output.lock().await.files.push(hit);
            }
        })
    }
}
