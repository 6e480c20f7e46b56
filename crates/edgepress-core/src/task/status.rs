//! Lifecycle shared by conversion, benchmark and compression jobs.

use serde::{Deserialize, Serialize};

/// Status of a server-side job.
///
/// ```text
/// IN_QUEUE ──▶ IN_PROGRESS ──▶ FINISHED
///    │              ├────────▶ ERROR
///    └──────────────┴────────▶ USER_CANCEL
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    InQueue,
    InProgress,
    Finished,
    Error,
    UserCancel,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::InQueue,
        TaskStatus::InProgress,
        TaskStatus::Finished,
        TaskStatus::Error,
        TaskStatus::UserCancel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::InQueue => "IN_QUEUE",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Finished => "FINISHED",
            TaskStatus::Error => "ERROR",
            TaskStatus::UserCancel => "USER_CANCEL",
        }
    }

    /// No transition leaves a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Finished | TaskStatus::Error | TaskStatus::UserCancel
        )
    }

    /// Whether the server may legitimately report `next` after `self`.
    ///
    /// Staying put is always allowed. A queued job may jump straight to a
    /// terminal status because a poll can miss the IN_PROGRESS window.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        if *self == next {
            return true;
        }
        match self {
            TaskStatus::InQueue => true,
            TaskStatus::InProgress => next != TaskStatus::InQueue,
            TaskStatus::Finished | TaskStatus::Error | TaskStatus::UserCancel => false,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        let terminal: Vec<_> = TaskStatus::ALL
            .iter()
            .filter(|s| s.is_terminal())
            .copied()
            .collect();
        assert_eq!(
            terminal,
            vec![TaskStatus::Finished, TaskStatus::Error, TaskStatus::UserCancel]
        );
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_value(TaskStatus::UserCancel).unwrap(),
            "USER_CANCEL"
        );
        let parsed: TaskStatus = serde_json::from_value("IN_PROGRESS".into()).unwrap();
        assert_eq!(parsed, TaskStatus::InProgress);
        assert_eq!(TaskStatus::InQueue.to_string(), "IN_QUEUE");
    }

    #[test]
    fn test_no_transition_leaves_terminal_state() {
        for from in TaskStatus::ALL.iter().filter(|s| s.is_terminal()) {
            for to in TaskStatus::ALL {
                assert_eq!(from.can_transition_to(to), *from == to, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_progress_never_goes_back_to_queue() {
        assert!(TaskStatus::InQueue.can_transition_to(TaskStatus::InProgress));
        assert!(TaskStatus::InQueue.can_transition_to(TaskStatus::Finished));
        assert!(TaskStatus::InProgress.can_transition_to(TaskStatus::UserCancel));
        assert!(!TaskStatus::InProgress.can_transition_to(TaskStatus::InQueue));
    }
}
