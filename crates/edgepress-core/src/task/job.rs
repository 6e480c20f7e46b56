//! Per-kind configuration of the generic polling driver.

use super::status::TaskStatus;
use crate::config::{endpoint, Endpoints};

/// Where a job kind is submitted and read back, and when it is done.
///
/// One `TaskClient` implementation serves every job kind; a `JobKind` is
/// the only thing that differs between them.
#[derive(Debug, Clone, Copy)]
pub struct JobKind {
    /// Name used in log lines ("conversion", "benchmark", ...).
    pub label: &'static str,
    /// POST endpoint creating the job.
    pub submit_path: &'static str,
    /// GET endpoint template with a `{task_id}` placeholder.
    pub fetch_path: &'static str,
    /// Statuses after which polling stops.
    pub is_terminal: fn(TaskStatus) -> bool,
}

fn lifecycle_terminal(status: TaskStatus) -> bool {
    status.is_terminal()
}

impl JobKind {
    pub const CONVERSION: JobKind = JobKind {
        label: "conversion",
        submit_path: Endpoints::CONVERSION_TASKS,
        fetch_path: Endpoints::CONVERSION_TASK,
        is_terminal: lifecycle_terminal,
    };

    pub const BENCHMARK: JobKind = JobKind {
        label: "benchmark",
        submit_path: Endpoints::BENCHMARK_TASKS,
        fetch_path: Endpoints::BENCHMARK_TASK,
        is_terminal: lifecycle_terminal,
    };

    pub const COMPRESSION: JobKind = JobKind {
        label: "compression",
        submit_path: Endpoints::COMPRESSION_TASKS,
        fetch_path: Endpoints::COMPRESSION_TASK,
        is_terminal: lifecycle_terminal,
    };

    /// A job kind hosted at custom endpoints with the standard lifecycle.
    pub fn custom(label: &'static str, submit_path: &'static str, fetch_path: &'static str) -> Self {
        Self {
            label,
            submit_path,
            fetch_path,
            is_terminal: lifecycle_terminal,
        }
    }

    /// Replace the terminal predicate.
    pub fn with_terminal(mut self, is_terminal: fn(TaskStatus) -> bool) -> Self {
        self.is_terminal = is_terminal;
        self
    }

    pub fn fetch_path_for(&self, task_id: &str) -> String {
        endpoint(self.fetch_path, "task_id", task_id)
    }
}
