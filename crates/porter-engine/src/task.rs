//! The polymorphic task: one closed variant per unit of work.

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use porter_core::{TaskStatus, TaskType};

use crate::archive_task::{ArchiveTask, ExtractTask};
use crate::delete_task::DeleteTask;
use crate::info::TaskInfo;
use crate::search_task::SearchTask;
use crate::transfer::TransferTask;

/// One schedulable unit of file-management work.
///
/// Constructed through [`crate::TaskPool`], which registers the handle
/// without starting it; the caller invokes [`Task::run`] exactly once,
/// usually inside `tokio::spawn`.
pub enum Task {
    Copy(TransferTask),
    Move(TransferTask),
    Delete(DeleteTask),
    Search(SearchTask),
    Archive(ArchiveTask),
    Extract(ExtractTask),
}

impl Task {
    fn info(&self) -> &TaskInfo {
        match self {
            Task::Copy(t) | Task::Move(t) => t.info(),
            Task::Delete(t) => t.info(),
            Task::Search(t) => t.info(),
            Task::Archive(t) => t.info(),
            Task::Extract(t) => t.info(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.info().id()
    }

    pub fn kind(&self) -> TaskType {
        self.info().kind()
    }

    pub fn username(&self) -> &str {
        self.info().username()
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.info().start_time()
    }

    pub async fn status(&self) -> TaskStatus {
        self.info().status().await
    }

    pub async fn stop_time(&self) -> Option<DateTime<Utc>> {
        self.info().stop_time().await
    }

    pub async fn error(&self) -> Option<String> {
        self.info().error().await
    }

    /// Request cooperative cancellation. Never blocks; repeated calls
    /// and calls against finished tasks are no-ops.
    pub fn interrupt(&self) {
        self.info().interrupt();
    }

    /// Execute the task to a terminal state. Must be called exactly
    /// once per task.
    pub async fn run(&self) {
        match self {
            Task::Copy(t) | Task::Move(t) => t.run().await,
            Task::Delete(t) => t.run().await,
            Task::Search(t) => t.run().await,
            Task::Archive(t) => t.run().await,
            Task::Extract(t) => t.run().await,
        }
    }

    /// Kind-specific progress snapshot, serialized for a presentation
    /// layer.
    pub async fn output_json(&self) -> Value {
        let result = match self {
            Task::Copy(t) | Task::Move(t) => serde_json::to_value(t.output().await),
            Task::Delete(t) => serde_json::to_value(t.output().await),
            Task::Search(t) => serde_json::to_value(t.output().await),
            Task::Archive(t) => serde_json::to_value(t.output().await),
            Task::Extract(t) => serde_json::to_value(t.output().await),
        };
        result.unwrap_or(Value::Null)
    }

    pub fn as_transfer(&self) -> Option<&TransferTask> {
        match self {
            Task::Copy(t) | Task::Move(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_delete(&self) -> Option<&DeleteTask> {
        match self {
            Task::Delete(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_search(&self) -> Option<&SearchTask> {
        match self {
            Task::Search(t) => Some(t),
            _ => None,
        }
    }
}
