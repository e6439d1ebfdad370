//! The process-wide task registry.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use porter_archive::{ArchiveEngine, DefaultEngine};
use porter_core::{EngineConfig, TaskType};

use crate::archive_task::{ArchiveOptions, ArchiveTask, ExtractOptions, ExtractTask};
use crate::delete_task::{DeleteOptions, DeleteTask};
use crate::query::TaskQueryBuilder;
use crate::search_task::{SearchOptions, SearchTask};
use crate::task::Task;
use crate::transfer::{TransferOptions, TransferTask};

/// Registry and factory for all tasks of a process.
///
/// The task list is append-only for the process lifetime; finished
/// tasks stay queryable. One instance is constructed at startup and
/// shared by reference with every request handler. Constructors
/// register the task without starting it; the caller spawns
/// [`Task::run`] separately.
pub struct TaskPool {
    tasks: RwLock<Vec<Arc<Task>>>,
    config: EngineConfig,
    engine: Arc<dyn ArchiveEngine>,
}

impl TaskPool {
    pub fn new(config: EngineConfig, engine: Arc<dyn ArchiveEngine>) -> Self {
        Self {
            tasks: RwLock::new(Vec::new()),
            config,
            engine,
        }
    }

    /// Pool backed by the built-in zip/tar engine.
    pub fn with_default_engine(config: EngineConfig) -> Self {
        Self::new(config, Arc::new(DefaultEngine))
    }

    pub async fn new_copy_task(&self, options: TransferOptions, username: &str) -> Arc<Task> {
        let task = Task::Copy(TransferTask::new(
            TaskType::Copy,
            options,
            username,
            self.config.clone(),
        ));
        self.register(task).await
    }

    pub async fn new_move_task(&self, options: TransferOptions, username: &str) -> Arc<Task> {
        let task = Task::Move(TransferTask::new(
            TaskType::Move,
            options,
            username,
            self.config.clone(),
        ));
        self.register(task).await
    }

    pub async fn new_delete_task(&self, options: DeleteOptions, username: &str) -> Arc<Task> {
        let task = Task::Delete(DeleteTask::new(options, username, self.config.clone()));
        self.register(task).await
    }

    pub async fn new_search_task(&self, options: SearchOptions, username: &str) -> Arc<Task> {
        let task = Task::Search(SearchTask::new(options, username, self.config.clone()));
        self.register(task).await
    }

    pub async fn new_archive_task(&self, options: ArchiveOptions, username: &str) -> Arc<Task> {
        let task = Task::Archive(ArchiveTask::new(options, username, Arc::clone(&self.engine)));
        self.register(task).await
    }

    pub async fn new_extract_task(&self, options: ExtractOptions, username: &str) -> Arc<Task> {
        let task = Task::Extract(ExtractTask::new(options, username, Arc::clone(&self.engine)));
        self.register(task).await
    }

    /// Look up a task by id. `None` means "not found"; the caller
    /// decides whether that is an error.
    pub async fn get_task(&self, id: Uuid) -> Option<Arc<Task>> {
        self.tasks
            .read()
            .await
            .iter()
            .find(|task| task.id() == id)
            .cloned()
    }

    /// Interrupt the task with the given id; a no-op if absent.
    pub async fn stop_task(&self, id: Uuid) {
        if let Some(task) = self.get_task(id).await {
            task.interrupt();
        }
    }

    /// Filter and sort the registered tasks.
    pub fn query(&self) -> TaskQueryBuilder<'_> {
        TaskQueryBuilder::new(self)
    }

    pub(crate) async fn snapshot(&self) -> Vec<Arc<Task>> {
        self.tasks.read().await.clone()
    }

    async fn register(&self, task: Task) -> Arc<Task> {
        let task = Arc::new(task);
        info!(task = %task.id(), kind = %task.kind(), user = task.username(), "task registered");
        self.tasks.write().await.push(Arc::clone(&task));
        task
    }
}
