//! Shared lifecycle fields embedded by every task kind.

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use porter_core::{TaskStatus, TaskType};

/// Identity, ownership and lifecycle state common to all task kinds.
///
/// Status only moves forward: `Analyze → Running → Complete | Error`.
/// The stop time is set exactly once, together with the transition into
/// a terminal state, and the error message at most once. Transitions
/// requested after a terminal state has been reached are ignored.
#[derive(Debug)]
pub struct TaskInfo {
    id: Uuid,
    kind: TaskType,
    username: String,
    start_time: DateTime<Utc>,
    cancel: CancellationToken,
    state: Mutex<LifecycleState>,
}

#[derive(Debug)]
struct LifecycleState {
    status: TaskStatus,
    stop_time: Option<DateTime<Utc>>,
    error: Option<String>,
}

impl TaskInfo {
    /// Allocate identity and start time for a new task.
    ///
    /// Copy/Move/Delete tasks start in `Analyze`; Search/Archive/
    /// Unarchive tasks have no sizing pass and start in `Running`.
    pub fn new(kind: TaskType, username: impl Into<String>) -> Self {
        let initial = match kind {
            TaskType::Copy | TaskType::Move | TaskType::Delete => TaskStatus::Analyze,
            TaskType::Search | TaskType::Archive | TaskType::Unarchive => TaskStatus::Running,
        };
        Self {
            id: Uuid::new_v4(),
            kind,
            username: username.into(),
            start_time: Utc::now(),
            cancel: CancellationToken::new(),
            state: Mutex::new(LifecycleState {
                status: initial,
                stop_time: None,
                error: None,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> TaskType {
        self.kind
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub async fn status(&self) -> TaskStatus {
        self.state.lock().await.status
    }

    /// `Some` iff the task has reached `Complete` or `Error`.
    pub async fn stop_time(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.stop_time
    }

    pub async fn error(&self) -> Option<String> {
        self.state.lock().await.error.clone()
    }

    /// Token handed to the work loop and its notifier channels.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request cooperative cancellation. Idempotent, never blocks, and
    /// a no-op for tasks that already stopped.
    pub fn interrupt(&self) {
        self.cancel.cancel();
    }

    /// Analyze → Running. Ignored from any other state.
    pub(crate) async fn set_running(&self) {
        let mut state = self.state.lock().await;
        if state.status == TaskStatus::Analyze {
            state.status = TaskStatus::Running;
        }
    }

    /// Transition into `Complete`, stamping the stop time.
    pub(crate) async fn finish_complete(&self) {
        let mut state = self.state.lock().await;
        if state.status.is_terminal() {
            return;
        }
        state.status = TaskStatus::Complete;
        state.stop_time = Some(Utc::now());
    }

    /// Transition into `Error`, stamping the stop time and message.
    pub(crate) async fn finish_error(&self, message: impl Into<String>) {
        let mut state = self.state.lock().await;
        if state.status.is_terminal() {
            return;
        }
        state.status = TaskStatus::Error;
        state.stop_time = Some(Utc::now());
        state.error = Some(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transfer_kinds_start_in_analyze() {
        let info = TaskInfo::new(TaskType::Copy, "alice");
        assert_eq!(info.status().await, TaskStatus::Analyze);
        assert!(info.stop_time().await.is_none());

        let info = TaskInfo::new(TaskType::Search, "alice");
        assert_eq!(info.status().await, TaskStatus::Running);
    }

    #[tokio::test]
    async fn terminal_state_is_sticky() {
        let info = TaskInfo::new(TaskType::Copy, "");
        info.set_running().await;
        info.finish_complete().await;
        let stop = info.stop_time().await;
        assert!(stop.is_some());

        info.finish_error("late failure").await;
        assert_eq!(info.status().await, TaskStatus::Complete);
        assert_eq!(info.stop_time().await, stop);
        assert!(info.error().await.is_none());
    }

    #[tokio::test]
    async fn interrupt_is_idempotent() {
        let info = TaskInfo::new(TaskType::Delete, "");
        info.interrupt();
        info.interrupt();
        assert!(info.cancel_token().is_cancelled());
    }
}
