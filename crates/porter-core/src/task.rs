//! Task kind, status and duplicate-policy tags.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The kind of work a task performs. Immutable after creation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum TaskType {
    Copy,
    Move,
    Delete,
    Search,
    Archive,
    Unarchive,
}

/// Lifecycle state of a task.
///
/// Transitions are strictly forward: `Analyze` -> `Running` ->
/// `Complete` | `Error`. Search, archive and extract tasks skip the
/// analyze phase and start at `Running`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum TaskStatus {
    Analyze,
    Running,
    Complete,
    Error,
}

impl TaskStatus {
    /// Whether the task has reached a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

/// What to do when a copy/move destination already exists.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Replace the existing destination.
    Overwrite,
    /// Leave the destination alone and treat this item as done.
    Skip,
    /// Append a `_copy` suffix (before the extension) until the
    /// destination path is free.
    #[default]
    Rename,
}

impl DuplicatePolicy {
    /// Parse a policy tag, falling back to `Rename` for anything
    /// unrecognized. Matches the wire behavior of the HTTP layer, where
    /// an absent or unknown `duplicate` field means rename.
    pub fn parse_lenient(tag: &str) -> Self {
        tag.parse().unwrap_or(Self::Rename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_type_round_trip() {
        assert_eq!(TaskType::Copy.to_string(), "Copy");
        assert_eq!("Unarchive".parse::<TaskType>().unwrap(), TaskType::Unarchive);
        assert!("Shred".parse::<TaskType>().is_err());
    }

    #[test]
    fn test_status_terminal() {
        assert!(TaskStatus::Complete.is_terminal());
        assert!(TaskStatus::Error.is_terminal());
        assert!(!TaskStatus::Analyze.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
    }

    #[test]
    fn test_duplicate_policy_lenient() {
        assert_eq!(DuplicatePolicy::parse_lenient("overwrite"), DuplicatePolicy::Overwrite);
        assert_eq!(DuplicatePolicy::parse_lenient("skip"), DuplicatePolicy::Skip);
        assert_eq!(DuplicatePolicy::parse_lenient("rename"), DuplicatePolicy::Rename);
        assert_eq!(DuplicatePolicy::parse_lenient(""), DuplicatePolicy::Rename);
        assert_eq!(DuplicatePolicy::parse_lenient("whatever"), DuplicatePolicy::Rename);
    }
}
