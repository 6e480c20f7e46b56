//! EdgePress - client library for the EdgePress model optimization platform.
//!
//! The platform converts trained models between formats, benchmarks them on
//! real edge hardware and compresses them by structured pruning or filter
//! decomposition. Every one of those operations is an asynchronous job on the
//! server; this crate validates requests locally, submits them and follows
//! the resulting tasks until they finish.
//!
//! # Example
//!
//! ```rust,ignore
//! use edgepress::{ConversionOptions, DeviceName, EdgePressClient, ModelFramework};
//!
//! #[tokio::main]
//! async fn main() -> edgepress::Result<()> {
//!     let client = EdgePressClient::builder("https://api.edgepress.ai")
//!         .credentials("dev@example.com", "secret")
//!         .build()
//!         .await?;
//!
//!     let converter = client.converter();
//!     let model = converter.upload_model("./model.onnx").await?;
//!
//!     let device = edgepress::filter_by_name(&DeviceName::JetsonNano, &model.available_devices)
//!         .into_iter()
//!         .next()
//!         .expect("Jetson Nano is not offered for this model");
//!
//!     let task = converter
//!         .convert_model(&model, ConversionOptions::new(ModelFramework::TensorRt, device))
//!         .await?;
//!     converter.download_converted_model(&task, "./model.trt").await?;
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cancel;
pub mod compressor;
pub mod config;
pub mod error;
pub mod launcher;
pub mod network;
pub mod task;

mod api;

// Re-export commonly used types
pub use auth::{Session, StaticToken, TokenProvider, Tokens, UserInfo};
pub use cancel::CancellationToken;
pub use compressor::{
    AutoCompressionRequest, AvailableLayer, CompressionInfo, CompressionMethod,
    CompressionRequest, CompressionTask, Compressor, CreateCompressionRequest, ParamValue,
    RatioRange, RatioRules, RecommendationMethod, RecommendationRequest, RecommendationResponse,
};
pub use config::ClientSettings;
pub use error::{EdgePressError, Result};
pub use launcher::{
    filter_by_hardware_type, filter_by_name, filter_by_software_version, Benchmarker,
    BenchmarkTask, ConversionOptions, ConversionTask, Converter, DeviceName, InputShape, Model,
    ModelFramework, TargetDevice,
};
pub use network::{HttpTransport, RetryConfig, Transport};
pub use task::{JobKind, PollOptions, TaskClient, TaskErrorDetail, TaskRecord, TaskStatus};

// Re-export builder from api module
pub use api::EdgePressClientBuilder;

use std::sync::Arc;

/// Main entry point to the platform.
///
/// Holds one authenticated transport and the settings shared by the
/// facades it hands out. Facades are cheap to create and independent of
/// each other.
pub struct EdgePressClient {
    transport: Arc<dyn Transport>,
    settings: ClientSettings,
}

impl EdgePressClient {
    /// Create a builder for EdgePressClient.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let client = EdgePressClient::builder("https://api.edgepress.ai")
    ///     .credentials("dev@example.com", "secret")
    ///     .verify_ssl(true)
    ///     .build()
    ///     .await?;
    /// ```
    pub fn builder(base_url: impl Into<String>) -> EdgePressClientBuilder {
        EdgePressClientBuilder::new(base_url)
    }

    /// Build a client over any transport.
    pub fn with_transport(transport: Arc<dyn Transport>, settings: ClientSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    /// Format conversion of uploaded models.
    pub fn converter(&self) -> Converter {
        Converter::new(self.transport.clone(), &self.settings)
    }

    /// Latency benchmarks on target devices.
    pub fn benchmarker(&self) -> Benchmarker {
        Benchmarker::new(self.transport.clone(), &self.settings)
    }

    /// Structured pruning and filter decomposition.
    pub fn compressor(&self) -> Compressor {
        Compressor::new(self.transport.clone(), &self.settings)
    }
}
