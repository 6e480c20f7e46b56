//! Model format conversion jobs.

use super::devices::ensure_available;
use super::types::{
    ConversionRequest, ConversionTask, DownloadLink, InputShape, Model, ModelFramework,
    TargetDevice,
};
use crate::config::{endpoint, ClientSettings, Endpoints};
use crate::error::{EdgePressError, Result};
use crate::network::{decode, Transport};
use crate::task::{JobKind, PollOptions, TaskClient, TaskRecord};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// What to convert a model into.
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    pub target_framework: ModelFramework,
    pub target_device: TargetDevice,
    /// Overrides the model's declared input shape.
    pub input_shape: Option<InputShape>,
    /// Block until the job is terminal instead of returning the queued record.
    pub wait_until_done: bool,
}

impl ConversionOptions {
    pub fn new(target_framework: ModelFramework, target_device: TargetDevice) -> Self {
        Self {
            target_framework,
            target_device,
            input_shape: None,
            wait_until_done: true,
        }
    }

    pub fn with_input_shape(mut self, shape: InputShape) -> Self {
        self.input_shape = Some(shape);
        self
    }

    pub fn wait_until_done(mut self, wait: bool) -> Self {
        self.wait_until_done = wait;
        self
    }
}

/// Uploads models and converts them for a target device.
pub struct Converter {
    transport: Arc<dyn Transport>,
    tasks: TaskClient<ConversionTask>,
    poll: PollOptions,
}

impl Converter {
    pub fn new(transport: Arc<dyn Transport>, settings: &ClientSettings) -> Self {
        Self {
            tasks: TaskClient::new(transport.clone(), JobKind::CONVERSION),
            transport,
            poll: PollOptions::from_settings(settings),
        }
    }

    pub fn with_poll_options(mut self, poll: PollOptions) -> Self {
        self.poll = poll;
        self
    }

    /// The underlying polling driver, for callers running their own loop.
    pub fn tasks(&self) -> &TaskClient<ConversionTask> {
        &self.tasks
    }

    /// Upload a model file; the server reports which devices it can target.
    pub async fn upload_model(&self, path: impl AsRef<Path>) -> Result<Model> {
        let path = path.as_ref();
        let model: Model = decode(
            self.transport
                .upload(Endpoints::LAUNCHER_MODEL_UPLOAD, path, &[])
                .await?,
        )?;
        info!(
            "Uploaded {} as model {} ({} target devices available)",
            path.display(),
            model.model_id,
            model.available_devices.len()
        );
        Ok(model)
    }

    /// Submit a conversion of `model`.
    pub async fn convert_model(
        &self,
        model: &Model,
        options: ConversionOptions,
    ) -> Result<ConversionTask> {
        ensure_available(&options.target_device, &model.available_devices)?;

        let input_shape = options
            .input_shape
            .or_else(|| model.input_shape().cloned());
        if let Some(shape) = &input_shape {
            if shape.dimension.iter().any(|d| *d == 0) || shape.batch == 0 {
                return Err(EdgePressError::validation(
                    "input_shape",
                    "batch and every dimension must be positive",
                ));
            }
        }

        let request = ConversionRequest {
            model_id: model.model_id.clone(),
            target_framework: options.target_framework,
            target_device: options.target_device,
            input_shape,
        };

        let task = self.tasks.submit(&request).await?;
        if options.wait_until_done {
            self.tasks.poll_until_terminal(task, &self.poll).await
        } else {
            Ok(task)
        }
    }

    /// Read the task's current status once.
    pub async fn get_conversion_task(&self, task: &ConversionTask) -> Result<ConversionTask> {
        self.tasks.fetch(task).await
    }

    /// Wait for a previously submitted task.
    pub async fn wait(&self, task: ConversionTask) -> Result<ConversionTask> {
        self.tasks.poll_until_terminal(task, &self.poll).await
    }

    /// Download the converted model of a FINISHED task to `dst`.
    pub async fn download_converted_model(
        &self,
        task: &ConversionTask,
        dst: impl AsRef<Path>,
    ) -> Result<u64> {
        if !task.is_finished() {
            return Err(EdgePressError::TaskNotFinished {
                task_id: task.task_id.clone(),
                status: task.status,
            });
        }

        let path = endpoint(Endpoints::CONVERSION_DOWNLOAD, "task_id", &task.task_id);
        let link: DownloadLink = decode(self.transport.get(&path).await?)?;
        self.transport.download(&link.download_url, dst.as_ref()).await
    }
}
