//! Generic submit / fetch / poll driver for server-side jobs.

use super::job::JobKind;
use super::record::TaskRecord;
use super::status::TaskStatus;
use crate::cancel::CancellationToken;
use crate::config::{ClientSettings, PollingConfig};
use crate::error::{EdgePressError, Result};
use crate::network::{decode, encode, Transport};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How `poll_until_terminal` waits.
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Fixed wait between two status reads.
    pub interval: Duration,
    /// Local polling budget. The server-side job is never cancelled when it runs out.
    pub timeout: Option<Duration>,
    /// Stops polling locally when cancelled.
    pub cancel: Option<CancellationToken>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: PollingConfig::DEFAULT_INTERVAL,
            timeout: None,
            cancel: None,
        }
    }
}

impl PollOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self {
            interval: settings.poll_interval,
            timeout: settings.poll_timeout,
            cancel: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Submits and follows jobs of one `JobKind`.
///
/// A job that fails on the server is returned as a record whose status is
/// `ERROR`; only client and transport problems are `Err`.
pub struct TaskClient<T> {
    transport: Arc<dyn Transport>,
    kind: JobKind,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for TaskClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            kind: self.kind,
            _record: PhantomData,
        }
    }
}

impl<T> TaskClient<T>
where
    T: TaskRecord + DeserializeOwned,
{
    pub fn new(transport: Arc<dyn Transport>, kind: JobKind) -> Self {
        Self {
            transport,
            kind,
            _record: PhantomData,
        }
    }

    pub fn kind(&self) -> &JobKind {
        &self.kind
    }

    pub fn is_terminal(&self, task: &T) -> bool {
        (self.kind.is_terminal)(task.status())
    }

    /// Create the job. The returned record is normally `IN_QUEUE`.
    pub async fn submit<R>(&self, request: &R) -> Result<T>
    where
        R: Serialize + Sync,
    {
        let body = encode(request)?;
        let response = self.transport.post(self.kind.submit_path, &body).await?;
        let task: T = decode(response)?;

        info!(
            "Submitted {} task {} ({})",
            self.kind.label,
            task.task_id(),
            task.status()
        );
        Ok(task)
    }

    /// Read the job's status once.
    ///
    /// A record that is already terminal is returned unchanged without a
    /// network call.
    pub async fn fetch(&self, task: &T) -> Result<T> {
        if self.is_terminal(task) {
            warn!(
                "{} task {} is already {}; not fetching again",
                self.kind.label,
                task.task_id(),
                task.status()
            );
            return Ok(task.clone());
        }

        let path = self.kind.fetch_path_for(task.task_id());
        let fresh: T = decode(self.transport.get(&path).await?)?;

        if !task.status().can_transition_to(fresh.status()) {
            warn!(
                "{} task {} went from {} to {}",
                self.kind.label,
                task.task_id(),
                task.status(),
                fresh.status()
            );
        }
        Ok(fresh)
    }

    /// Fetch repeatedly until the job reaches a terminal status.
    ///
    /// With a timeout set, a status read still in flight when the budget runs
    /// out is abandoned and `Timeout` is returned.
    pub async fn poll_until_terminal(&self, task: T, options: &PollOptions) -> Result<T> {
        let interval = options.interval.max(PollingConfig::MIN_INTERVAL);
        let started = Instant::now();
        let mut current = task;
        let mut last_status: Option<TaskStatus> = None;

        loop {
            if self.is_terminal(&current) {
                self.log_outcome(&current);
                return Ok(current);
            }

            if options.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
                info!(
                    "Stopped polling {} task {} at {}",
                    self.kind.label,
                    current.task_id(),
                    current.status()
                );
                return Err(EdgePressError::PollingCancelled {
                    last_status: current.status(),
                });
            }

            current = match options.timeout {
                Some(timeout) => {
                    let remaining = timeout.saturating_sub(started.elapsed());
                    match tokio::time::timeout(remaining, self.fetch(&current)).await {
                        Ok(fresh) => fresh?,
                        Err(_) => {
                            return Err(EdgePressError::Timeout {
                                last_status: current.status(),
                                elapsed: started.elapsed(),
                            })
                        }
                    }
                }
                None => self.fetch(&current).await?,
            };
            if last_status != Some(current.status()) {
                info!(
                    "{} task {} status: {}",
                    self.kind.label,
                    current.task_id(),
                    current.status()
                );
                last_status = Some(current.status());
            } else {
                debug!("{} task {} still {}", self.kind.label, current.task_id(), current.status());
            }

            if self.is_terminal(&current) {
                continue;
            }

            let wait = match options.timeout {
                Some(timeout) => {
                    let elapsed = started.elapsed();
                    if elapsed >= timeout {
                        return Err(EdgePressError::Timeout {
                            last_status: current.status(),
                            elapsed,
                        });
                    }
                    interval.min(timeout - elapsed)
                }
                None => interval,
            };
            tokio::time::sleep(wait).await;
        }
    }

    /// `submit` followed by `poll_until_terminal`.
    pub async fn submit_and_wait<R>(&self, request: &R, options: &PollOptions) -> Result<T>
    where
        R: Serialize + Sync,
    {
        let task = self.submit(request).await?;
        self.poll_until_terminal(task, options).await
    }

    fn log_outcome(&self, task: &T) {
        match (task.status(), task.error_detail()) {
            (TaskStatus::Error, Some(detail)) => warn!(
                "{} task {} failed on the server: {}",
                self.kind.label,
                task.task_id(),
                detail
            ),
            (status, _) => info!(
                "{} task {} ended with {}",
                self.kind.label,
                task.task_id(),
                status
            ),
        }
    }
}
