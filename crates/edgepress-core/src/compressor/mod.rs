//! Compressor: structured pruning and filter decomposition.

#[allow(clippy::module_inception)]
mod compressor;
mod types;
pub mod validator;

pub use compressor::Compressor;
pub use types::{
    AutoCompressionRequest, AvailableLayer, CompressionInfo, CompressionMethod,
    CompressionRequest, CompressionTask, CreateCompressionRequest, ParamValue,
    RecommendationInfo, RecommendationMethod, RecommendationRequest, RecommendationResponse,
};
pub use validator::{
    validate_auto_compression, validate_compression, validate_method_pair, validate_recommendation,
    RatioRange, RatioRules,
};
