//! Common view over the task records of every job kind.

use super::status::TaskStatus;
use serde::{Deserialize, Serialize};

/// Why a job ended in `ERROR`, as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

impl std::fmt::Display for TaskErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// A server-tracked job record the polling driver can follow.
///
/// Records are value objects: the client never edits `status`, it replaces
/// the whole record with the server's latest copy.
pub trait TaskRecord: Clone + Send + Sync {
    fn task_id(&self) -> &str;

    fn status(&self) -> TaskStatus;

    /// Failure detail when the job ended in `ERROR`.
    fn error_detail(&self) -> Option<&TaskErrorDetail>;

    fn is_finished(&self) -> bool {
        self.status() == TaskStatus::Finished
    }
}
