//! On-device latency benchmark jobs.

use super::devices::ensure_available;
use super::types::{BenchmarkRequest, BenchmarkTask, Model, TargetDevice};
use crate::config::{ClientSettings, Endpoints};
use crate::error::Result;
use crate::network::{decode, Transport};
use crate::task::{JobKind, PollOptions, TaskClient};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Uploads models and benchmarks them on target devices.
pub struct Benchmarker {
    transport: Arc<dyn Transport>,
    tasks: TaskClient<BenchmarkTask>,
    poll: PollOptions,
}

impl Benchmarker {
    pub fn new(transport: Arc<dyn Transport>, settings: &ClientSettings) -> Self {
        Self {
            tasks: TaskClient::new(transport.clone(), JobKind::BENCHMARK),
            transport,
            poll: PollOptions::from_settings(settings),
        }
    }

    pub fn with_poll_options(mut self, poll: PollOptions) -> Self {
        self.poll = poll;
        self
    }

    pub fn tasks(&self) -> &TaskClient<BenchmarkTask> {
        &self.tasks
    }

    /// Upload a (typically already converted) model file.
    pub async fn upload_model(&self, path: impl AsRef<Path>) -> Result<Model> {
        let path = path.as_ref();
        let model: Model = decode(
            self.transport
                .upload(Endpoints::LAUNCHER_MODEL_UPLOAD, path, &[])
                .await?,
        )?;
        info!("Uploaded {} as model {}", path.display(), model.model_id);
        Ok(model)
    }

    /// Submit a benchmark of `model` on `target_device`.
    pub async fn benchmark_model(
        &self,
        model: &Model,
        target_device: &TargetDevice,
        wait_until_done: bool,
    ) -> Result<BenchmarkTask> {
        ensure_available(target_device, &model.available_devices)?;

        let request = BenchmarkRequest {
            model_id: model.model_id.clone(),
            target_device: target_device.clone(),
        };

        let task = self.tasks.submit(&request).await?;
        if !wait_until_done {
            return Ok(task);
        }

        let task = self.tasks.poll_until_terminal(task, &self.poll).await?;
        if let Some(latency) = task.latency_ms {
            info!("Model {} latency on {}: {} ms", model.model_id, target_device, latency);
        }
        Ok(task)
    }

    /// Read the task's current status once.
    pub async fn get_benchmark_task(&self, task: &BenchmarkTask) -> Result<BenchmarkTask> {
        self.tasks.fetch(task).await
    }

    /// Wait for a previously submitted task.
    pub async fn wait(&self, task: BenchmarkTask) -> Result<BenchmarkTask> {
        self.tasks.poll_until_terminal(task, &self.poll).await
    }
}
