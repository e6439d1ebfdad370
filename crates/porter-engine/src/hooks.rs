//! Push-notification callbacks invoked at task lifecycle points.
//!
//! Hooks receive the task id plus the relevant payload rather than the
//! task handle itself, so a notification layer can forward the event
//! without touching task internals.

use std::path::Path;
use std::sync::Arc;

use uuid::Uuid;

use porter_ops::FoundFile;

/// Invoked once when a task reaches `Complete`.
pub type DoneHook = Arc<dyn Fn(Uuid) + Send + Sync>;

/// Invoked once when a task reaches `Error`, with the error message.
pub type ErrorHook = Arc<dyn Fn(Uuid, &str) + Send + Sync>;

/// Invoked after each fully processed item in a batch.
pub type ItemHook = Arc<dyn Fn(Uuid, &Path) + Send + Sync>;

/// Invoked for each search hit as it is found.
pub type HitHook = Arc<dyn Fn(Uuid, &FoundFile) + Send + Sync>;
