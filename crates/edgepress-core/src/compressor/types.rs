//! Compression requests, layer parameters and compression task records.

use crate::launcher::ModelFramework;
use crate::task::{TaskErrorDetail, TaskRecord, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Structured pruning and filter decomposition methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompressionMethod {
    /// Pruning by L2 norm.
    #[serde(rename = "PR_L2")]
    PrL2,
    /// Pruning by geometric median.
    #[serde(rename = "PR_GM")]
    PrGm,
    /// Pruning by nuclear norm.
    #[serde(rename = "PR_NN")]
    PrNn,
    /// Pruning explicit channel indices.
    #[serde(rename = "PR_ID")]
    PrId,
    /// Tucker decomposition.
    #[serde(rename = "FD_TK")]
    FdTk,
    /// CP decomposition.
    #[serde(rename = "FD_CP")]
    FdCp,
    /// Singular value decomposition.
    #[serde(rename = "FD_SVD")]
    FdSvd,
}

impl CompressionMethod {
    pub const ALL: [CompressionMethod; 7] = [
        CompressionMethod::PrL2,
        CompressionMethod::PrGm,
        CompressionMethod::PrNn,
        CompressionMethod::PrId,
        CompressionMethod::FdTk,
        CompressionMethod::FdCp,
        CompressionMethod::FdSvd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionMethod::PrL2 => "PR_L2",
            CompressionMethod::PrGm => "PR_GM",
            CompressionMethod::PrNn => "PR_NN",
            CompressionMethod::PrId => "PR_ID",
            CompressionMethod::FdTk => "FD_TK",
            CompressionMethod::FdCp => "FD_CP",
            CompressionMethod::FdSvd => "FD_SVD",
        }
    }

    pub fn is_pruning(&self) -> bool {
        matches!(
            self,
            CompressionMethod::PrL2
                | CompressionMethod::PrGm
                | CompressionMethod::PrNn
                | CompressionMethod::PrId
        )
    }

    /// Recommendation method the server offers for this compression method.
    pub fn recommendation_method(&self) -> Option<RecommendationMethod> {
        match self {
            CompressionMethod::PrL2 | CompressionMethod::PrGm | CompressionMethod::PrNn => {
                Some(RecommendationMethod::Slamp)
            }
            CompressionMethod::PrId => None,
            CompressionMethod::FdTk | CompressionMethod::FdCp | CompressionMethod::FdSvd => {
                Some(RecommendationMethod::Vbmf)
            }
        }
    }
}

impl std::fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CompressionMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        CompressionMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| format!("unknown compression method '{}'", s))
    }
}

/// Server-side layer-value recommendation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationMethod {
    Slamp,
    Vbmf,
}

impl RecommendationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationMethod::Slamp => "slamp",
            RecommendationMethod::Vbmf => "vbmf",
        }
    }

    /// Whether this recommendation can drive `method`.
    pub fn supports(&self, method: CompressionMethod) -> bool {
        method.recommendation_method() == Some(*self)
    }
}

impl std::fmt::Display for RecommendationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single compression parameter: a ratio, a rank or a channel index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
}

impl ParamValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            ParamValue::Int(v) => *v as f64,
            ParamValue::Float(v) => *v,
        }
    }

    /// Integer value, accepting floats with no fractional part.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            ParamValue::Float(_) => None,
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
        }
    }
}

/// A compressible layer and the parameters chosen for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableLayer {
    pub name: String,
    #[serde(default)]
    pub values: Vec<ParamValue>,
    /// Selected for compression.
    #[serde(default, rename = "use")]
    pub selected: bool,
    #[serde(default)]
    pub channels: Vec<u32>,
}

impl AvailableLayer {
    pub fn new(name: impl Into<String>, channels: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            selected: false,
            channels,
        }
    }

    /// Select the layer with the given parameters.
    pub fn select(mut self, values: Vec<ParamValue>) -> Self {
        self.values = values;
        self.selected = true;
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AvailableLayersResponse {
    #[serde(default)]
    pub available_layers: Vec<AvailableLayer>,
}

/// Body creating a compression session for an uploaded model.
#[derive(Debug, Clone, Serialize)]
pub struct CreateCompressionRequest {
    pub model_id: String,
    pub model_name: String,
    pub description: String,
    pub compression_method: CompressionMethod,
}

/// A compression session: where the result will live and what can be compressed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompressionInfo {
    pub compression_id: String,
    pub new_model_id: String,
    pub compression_method: CompressionMethod,
    #[serde(default)]
    pub available_layers: Vec<AvailableLayer>,
}

/// Ask the server to propose layer values.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationRequest {
    pub model_id: String,
    pub compression_id: String,
    pub recommendation_method: RecommendationMethod,
    pub recommendation_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecommendationInfo {
    pub name: String,
    pub values: Vec<ParamValue>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RecommendationResponse {
    #[serde(default)]
    pub recommended_layers: Vec<RecommendationInfo>,
}

/// Submit a compression with explicit layer parameters.
#[derive(Debug, Clone, Serialize)]
pub struct CompressionRequest {
    pub compression_id: String,
    pub compression_method: CompressionMethod,
    pub layers: Vec<AvailableLayer>,
    pub options: BTreeMap<String, String>,
    pub compressed_model_id: String,
}

impl CompressionRequest {
    pub fn default_options() -> BTreeMap<String, String> {
        BTreeMap::from([("policy".to_string(), "average".to_string())])
    }

    /// Compress into the session's new model with the given layers.
    pub fn new(info: &CompressionInfo, layers: Vec<AvailableLayer>) -> Self {
        Self {
            compression_id: info.compression_id.clone(),
            compression_method: info.compression_method,
            layers,
            options: Self::default_options(),
            compressed_model_id: info.new_model_id.clone(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn selected_layers(&self) -> impl Iterator<Item = &AvailableLayer> {
        self.layers.iter().filter(|layer| layer.selected)
    }
}

/// One-shot compression driven by a recommendation ratio.
#[derive(Debug, Clone)]
pub struct AutoCompressionRequest {
    pub model_id: String,
    pub model_name: String,
    pub description: String,
    pub recommendation_ratio: f64,
}

impl AutoCompressionRequest {
    pub fn new(model_id: impl Into<String>, model_name: impl Into<String>, ratio: f64) -> Self {
        Self {
            model_id: model_id.into(),
            model_name: model_name.into(),
            description: String::new(),
            recommendation_ratio: ratio,
        }
    }
}

/// A compression job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionTask {
    #[serde(alias = "compression_task_id")]
    pub task_id: String,
    pub compression_id: String,
    /// Model produced by the compression, downloadable once FINISHED.
    pub new_model_id: String,
    pub compression_method: CompressionMethod,
    pub status: TaskStatus,
    #[serde(default)]
    pub error: Option<TaskErrorDetail>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TaskRecord for CompressionTask {
    fn task_id(&self) -> &str {
        &self.task_id
    }

    fn status(&self) -> TaskStatus {
        self.status
    }

    fn error_detail(&self) -> Option<&TaskErrorDetail> {
        self.error.as_ref()
    }
}

/// Multipart fields describing a model uploaded for compression.
pub(crate) fn upload_fields(
    input_shapes: &[crate::launcher::InputShape],
    framework: ModelFramework,
) -> crate::error::Result<Vec<(String, String)>> {
    Ok(vec![
        ("framework".to_string(), framework.as_str().to_string()),
        ("input_shapes".to_string(), serde_json::to_string(input_shapes)?),
    ])
}
