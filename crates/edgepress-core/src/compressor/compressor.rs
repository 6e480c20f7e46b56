//! Model compression sessions, recommendations and compression jobs.

use super::types::{
    upload_fields, AutoCompressionRequest, AvailableLayer, AvailableLayersResponse,
    CompressionInfo, CompressionMethod, CompressionRequest, CompressionTask,
    CreateCompressionRequest, RecommendationRequest, RecommendationResponse,
};
use super::validator::{
    validate_auto_compression, validate_compression, validate_method_pair, RatioRules,
};
use crate::config::{endpoint, ClientSettings, Endpoints};
use crate::error::{EdgePressError, Result};
use crate::launcher::{DownloadLink, InputShape, Model, ModelFramework};
use crate::network::{decode, encode, Transport};
use crate::task::{JobKind, PollOptions, TaskClient, TaskRecord};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Compresses uploaded models with structured pruning or filter decomposition.
pub struct Compressor {
    transport: Arc<dyn Transport>,
    tasks: TaskClient<CompressionTask>,
    poll: PollOptions,
    ratio_rules: RatioRules,
}

impl Compressor {
    pub fn new(transport: Arc<dyn Transport>, settings: &ClientSettings) -> Self {
        Self {
            tasks: TaskClient::new(transport.clone(), JobKind::COMPRESSION),
            transport,
            poll: PollOptions::from_settings(settings),
            ratio_rules: RatioRules::default(),
        }
    }

    pub fn with_poll_options(mut self, poll: PollOptions) -> Self {
        self.poll = poll;
        self
    }

    /// Replace the recommendation ratio table.
    pub fn with_ratio_rules(mut self, rules: RatioRules) -> Self {
        self.ratio_rules = rules;
        self
    }

    pub fn tasks(&self) -> &TaskClient<CompressionTask> {
        &self.tasks
    }

    /// Upload a model for compression.
    pub async fn upload_model(
        &self,
        path: impl AsRef<Path>,
        input_shapes: &[InputShape],
        framework: ModelFramework,
    ) -> Result<Model> {
        let path = path.as_ref();
        if input_shapes.is_empty() {
            return Err(EdgePressError::validation(
                "input_shapes",
                "at least one input shape is required",
            ));
        }

        let fields = upload_fields(input_shapes, framework)?;
        let model: Model = decode(
            self.transport
                .upload(Endpoints::COMPRESSOR_MODEL_UPLOAD, path, &fields)
                .await?,
        )?;
        info!("Uploaded {} as model {}", path.display(), model.model_id);
        Ok(model)
    }

    /// Layers of `model_id` that `method` can compress.
    pub async fn get_available_layers(
        &self,
        model_id: &str,
        method: CompressionMethod,
    ) -> Result<Vec<AvailableLayer>> {
        let path = format!(
            "{}?compression_method={}",
            endpoint(Endpoints::AVAILABLE_LAYERS, "model_id", model_id),
            urlencoding::encode(method.as_str())
        );
        let response: AvailableLayersResponse = decode(self.transport.get(&path).await?)?;
        debug!(
            "Model {} has {} layers compressible with {}",
            model_id,
            response.available_layers.len(),
            method
        );
        Ok(response.available_layers)
    }

    /// Open a compression session.
    pub async fn create_compression(
        &self,
        request: CreateCompressionRequest,
    ) -> Result<CompressionInfo> {
        if request.model_id.trim().is_empty() {
            return Err(EdgePressError::validation("model_id", "model id must not be empty"));
        }

        let info: CompressionInfo = decode(
            self.transport
                .post(Endpoints::COMPRESSIONS, &encode(&request)?)
                .await?,
        )?;
        info!(
            "Created {} compression {} for model {} (new model {})",
            info.compression_method, info.compression_id, request.model_id, info.new_model_id
        );
        Ok(info)
    }

    /// Ask the server for per-layer values for the session `info`.
    ///
    /// The recommendation method must match the session's compression method.
    pub async fn get_recommendation(
        &self,
        info: &CompressionInfo,
        request: RecommendationRequest,
    ) -> Result<RecommendationResponse> {
        if request.compression_id != info.compression_id {
            return Err(EdgePressError::validation(
                "compression_id",
                format!(
                    "request targets {} but the session is {}",
                    request.compression_id, info.compression_id
                ),
            ));
        }
        validate_method_pair(info.compression_method, request.recommendation_method)?;
        self.ratio_rules.validate_recommendation(&request)?;

        let path = endpoint(
            Endpoints::RECOMMENDATION,
            "compression_id",
            &request.compression_id,
        );
        let response: RecommendationResponse =
            decode(self.transport.post(&path, &encode(&request)?).await?)?;
        info!(
            "Received {} recommendation for {} layers",
            request.recommendation_method,
            response.recommended_layers.len()
        );
        Ok(response)
    }

    /// Select every recommended layer and copy its values.
    ///
    /// Returns how many layers were updated. Recommended names missing from
    /// `layers` are skipped.
    pub fn apply_recommendation(
        &self,
        layers: &mut [AvailableLayer],
        recommendation: &RecommendationResponse,
    ) -> usize {
        let mut applied = 0;
        for recommended in &recommendation.recommended_layers {
            match layers.iter_mut().find(|layer| layer.name == recommended.name) {
                Some(layer) => {
                    layer.selected = true;
                    layer.values = recommended.values.clone();
                    applied += 1;
                }
                None => warn!("Recommended layer {} is not compressible", recommended.name),
            }
        }
        applied
    }

    /// Submit a compression job.
    pub async fn compress_model(
        &self,
        request: CompressionRequest,
        wait_until_done: bool,
    ) -> Result<CompressionTask> {
        validate_compression(&request)?;

        let task = self.tasks.submit(&request).await?;
        if wait_until_done {
            self.tasks.poll_until_terminal(task, &self.poll).await
        } else {
            Ok(task)
        }
    }

    /// Read the task's current status once.
    pub async fn get_compression_task(&self, task: &CompressionTask) -> Result<CompressionTask> {
        self.tasks.fetch(task).await
    }

    /// Wait for a previously submitted task.
    pub async fn wait(&self, task: CompressionTask) -> Result<CompressionTask> {
        self.tasks.poll_until_terminal(task, &self.poll).await
    }

    /// Download the model produced by a FINISHED compression to `dst`.
    pub async fn download_compressed_model(
        &self,
        task: &CompressionTask,
        dst: impl AsRef<Path>,
    ) -> Result<u64> {
        if !task.is_finished() {
            return Err(EdgePressError::TaskNotFinished {
                task_id: task.task_id.clone(),
                status: task.status,
            });
        }

        let path = endpoint(
            Endpoints::COMPRESSED_MODEL_DOWNLOAD,
            "model_id",
            &task.new_model_id,
        );
        let link: DownloadLink = decode(self.transport.get(&path).await?)?;
        self.transport.download(&link.download_url, dst.as_ref()).await
    }

    /// Create a session, apply the server's recommendation, compress and
    /// download the result to `dst`.
    ///
    /// A job that ends in ERROR is returned as-is and nothing is downloaded.
    pub async fn auto_compress(
        &self,
        request: AutoCompressionRequest,
        method: CompressionMethod,
        dst: impl AsRef<Path>,
    ) -> Result<CompressionTask> {
        validate_auto_compression(&request)?;
        let Some(recommendation_method) = method.recommendation_method() else {
            return Err(EdgePressError::validation(
                "compression_method",
                format!("{} does not support recommendations", method),
            ));
        };

        let info = self
            .create_compression(CreateCompressionRequest {
                model_id: request.model_id.clone(),
                model_name: request.model_name.clone(),
                description: request.description.clone(),
                compression_method: method,
            })
            .await?;

        let recommendation = self
            .get_recommendation(
                &info,
                RecommendationRequest {
                    model_id: request.model_id.clone(),
                    compression_id: info.compression_id.clone(),
                    recommendation_method,
                    recommendation_ratio: request.recommendation_ratio,
                },
            )
            .await?;

        let mut layers = info.available_layers.clone();
        let applied = self.apply_recommendation(&mut layers, &recommendation);
        debug!("Applied recommendation to {} of {} layers", applied, layers.len());

        let task = self
            .compress_model(CompressionRequest::new(&info, layers), true)
            .await?;
        if task.is_finished() {
            let bytes = self.download_compressed_model(&task, dst).await?;
            info!("Compressed model {} saved ({} bytes)", task.new_model_id, bytes);
        }
        Ok(task)
    }
}
