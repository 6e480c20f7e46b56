//! Asynchronous server-side jobs.
//!
//! Conversion, benchmark and compression jobs share one lifecycle
//! (`TaskStatus`) and one driver (`TaskClient`), configured per kind with a
//! `JobKind`.

mod client;
mod job;
mod record;
mod status;

pub use client::{PollOptions, TaskClient};
pub use job::JobKind;
pub use record::{TaskErrorDetail, TaskRecord};
pub use status::TaskStatus;
