//! Task pool, lifecycle state machine and query layer.
//!
//! A [`TaskPool`] registers tasks without starting them; the caller
//! invokes [`Task::run`] exactly once, usually inside `tokio::spawn`,
//! so task creation is decoupled from execution latency. Tasks move
//! through Analyze → Running → Complete | Error and never leave a
//! terminal state. Live progress is readable at any time through each
//! task's output snapshot.

mod archive_task;
mod delete_task;
mod hooks;
mod info;
mod pool;
mod query;
mod search_task;
mod task;
mod transfer;

pub use archive_task::{
    ArchiveOptions, ArchiveOutput, ArchiveTask, ExtractItem, ExtractOptions, ExtractOutput,
    ExtractTask,
};
pub use delete_task::{DeleteOptions, DeleteOutput, DeleteTask};
pub use hooks::{DoneHook, ErrorHook, HitHook, ItemHook};
pub use info::TaskInfo;
pub use pool::TaskPool;
pub use query::{OrderDirection, OrderKey, TaskQueryBuilder};
pub use search_task::{SearchOptions, SearchOutput, SearchTask};
pub use task::Task;
pub use transfer::{TransferOptions, TransferOutput, TransferPair, TransferTask};
