//! Models, target devices and launcher task records.

use crate::task::{TaskErrorDetail, TaskRecord, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Model formats the platform can convert to and from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFramework {
    #[serde(rename = "tensorflow_keras")]
    TensorflowKeras,
    #[serde(rename = "tensorflow_lite")]
    TensorflowLite,
    #[serde(rename = "onnx")]
    Onnx,
    #[serde(rename = "openvino")]
    OpenVino,
    #[serde(rename = "tensorrt")]
    TensorRt,
    #[serde(rename = "drpai")]
    DrpAi,
    #[serde(rename = "pytorch")]
    PyTorch,
}

impl ModelFramework {
    pub const ALL: [ModelFramework; 7] = [
        ModelFramework::TensorflowKeras,
        ModelFramework::TensorflowLite,
        ModelFramework::Onnx,
        ModelFramework::OpenVino,
        ModelFramework::TensorRt,
        ModelFramework::DrpAi,
        ModelFramework::PyTorch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFramework::TensorflowKeras => "tensorflow_keras",
            ModelFramework::TensorflowLite => "tensorflow_lite",
            ModelFramework::Onnx => "onnx",
            ModelFramework::OpenVino => "openvino",
            ModelFramework::TensorRt => "tensorrt",
            ModelFramework::DrpAi => "drpai",
            ModelFramework::PyTorch => "pytorch",
        }
    }
}

impl std::fmt::Display for ModelFramework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModelFramework {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        ModelFramework::ALL
            .into_iter()
            .find(|f| f.as_str() == normalized)
            .ok_or_else(|| format!("unknown model framework '{}'", s))
    }
}

/// Hardware the platform can run jobs on.
///
/// Names the client does not know yet are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceName {
    RaspberryPi4B,
    RaspberryPi3BPlus,
    RaspberryPiZeroW,
    RaspberryPiZero2W,
    JetsonNano,
    JetsonTx2,
    JetsonXavier,
    JetsonNx,
    JetsonAgxOrin,
    AwsT4,
    IntelXeonW2233,
    AlifEnsembleE7DevKitGen2,
    RenesasRa8d1,
    Other(String),
}

impl DeviceName {
    const KNOWN: [(DeviceName, &'static str); 13] = [
        (DeviceName::RaspberryPi4B, "RaspberryPi4B"),
        (DeviceName::RaspberryPi3BPlus, "RaspberryPi3BPlus"),
        (DeviceName::RaspberryPiZeroW, "RaspberryPiZeroW"),
        (DeviceName::RaspberryPiZero2W, "RaspberryPiZero2W"),
        (DeviceName::JetsonNano, "Jetson-Nano"),
        (DeviceName::JetsonTx2, "Jetson-Tx2"),
        (DeviceName::JetsonXavier, "Jetson-Xavier"),
        (DeviceName::JetsonNx, "Jetson-Nx"),
        (DeviceName::JetsonAgxOrin, "Jetson-AGX-Orin"),
        (DeviceName::AwsT4, "AWS-T4"),
        (DeviceName::IntelXeonW2233, "Intel-Xeon"),
        (DeviceName::AlifEnsembleE7DevKitGen2, "Ensemble-E7-DevKit-Gen2"),
        (DeviceName::RenesasRa8d1, "Renesas-RA8D1"),
    ];

    /// Name as the server spells it.
    pub fn as_str(&self) -> &str {
        match self {
            DeviceName::Other(name) => name,
            known => DeviceName::KNOWN
                .iter()
                .find(|(device, _)| device == known)
                .map(|(_, name)| *name)
                .unwrap_or_default(),
        }
    }

    /// Parse leniently: case-insensitive, ignoring `-`, `_` and spaces.
    pub fn parse(name: &str) -> Self {
        let key = normalize(name);
        DeviceName::KNOWN
            .iter()
            .find(|(_, wire)| normalize(wire) == key)
            .map(|(device, _)| device.clone())
            .unwrap_or_else(|| DeviceName::Other(name.to_string()))
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

impl From<String> for DeviceName {
    fn from(name: String) -> Self {
        DeviceName::parse(&name)
    }
}

impl From<DeviceName> for String {
    fn from(name: DeviceName) -> Self {
        name.as_str().to_string()
    }
}

impl std::fmt::Display for DeviceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete hardware/software configuration jobs can target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDevice {
    pub device_name: DeviceName,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Runtime/driver version, e.g. `"4.6"`.
    #[serde(default)]
    pub software_version: Option<String>,
    /// What `software_version` versions, e.g. `"JetPack"`.
    #[serde(default)]
    pub software_version_type: Option<String>,
    #[serde(default)]
    pub hardware_type: Option<String>,
}

impl TargetDevice {
    pub fn new(device_name: DeviceName) -> Self {
        Self {
            device_name,
            display_name: None,
            software_version: None,
            software_version_type: None,
            hardware_type: None,
        }
    }

    pub fn with_software_version(mut self, version_type: &str, version: &str) -> Self {
        self.software_version_type = Some(version_type.to_string());
        self.software_version = Some(version.to_string());
        self
    }

    /// Same device, runtime and hardware variant; display names are ignored.
    pub fn same_target(&self, other: &TargetDevice) -> bool {
        self.device_name == other.device_name
            && self.software_version == other.software_version
            && self.hardware_type == other.hardware_type
    }
}

impl std::fmt::Display for TargetDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name.as_deref().unwrap_or(self.device_name.as_str()))?;
        if let Some(version) = &self.software_version {
            match &self.software_version_type {
                Some(kind) => write!(f, " ({} {})", kind, version)?,
                None => write!(f, " ({})", version)?,
            }
        }
        if let Some(hw) = &self.hardware_type {
            write!(f, " [{}]", hw)?;
        }
        Ok(())
    }
}

/// Declared input of a model: batch, channels and spatial dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputShape {
    pub batch: u32,
    pub channel: u32,
    pub dimension: Vec<u32>,
}

/// An uploaded model artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub model_id: String,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub framework: Option<ModelFramework>,
    #[serde(default)]
    pub input_shapes: Vec<InputShape>,
    /// Devices the server supports for this model/format combination.
    #[serde(default)]
    pub available_devices: Vec<TargetDevice>,
}

impl Model {
    /// Primary input shape.
    pub fn input_shape(&self) -> Option<&InputShape> {
        self.input_shapes.first()
    }
}

/// Body of a conversion submission.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionRequest {
    pub model_id: String,
    pub target_framework: ModelFramework,
    pub target_device: TargetDevice,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_shape: Option<InputShape>,
}

/// Body of a benchmark submission.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkRequest {
    pub model_id: String,
    pub target_device: TargetDevice,
}

/// A format conversion job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionTask {
    #[serde(alias = "convert_task_id")]
    pub task_id: String,
    pub model_id: String,
    pub status: TaskStatus,
    pub target_framework: ModelFramework,
    pub target_device: TargetDevice,
    #[serde(default)]
    pub input_shape: Option<InputShape>,
    /// Id of the converted model, once FINISHED.
    #[serde(default)]
    pub converted_model_id: Option<String>,
    #[serde(default)]
    pub error: Option<TaskErrorDetail>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TaskRecord for ConversionTask {
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

/// A latency benchmark job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkTask {
    #[serde(alias = "benchmark_task_id")]
    pub task_id: String,
    pub model_id: String,
    pub status: TaskStatus,
    pub target_device: TargetDevice,
    /// Mean inference latency in milliseconds.
    #[serde(default, alias = "latency")]
    pub latency_ms: Option<f64>,
    #[serde(default)]
    pub memory_footprint_gpu_mb: Option<f64>,
    #[serde(default)]
    pub memory_footprint_cpu_mb: Option<f64>,
    /// Average power draw in milliwatts, on devices that report it.
    #[serde(default)]
    pub power_consumption_mw: Option<f64>,
    #[serde(default)]
    pub error: Option<TaskErrorDetail>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TaskRecord for BenchmarkTask {
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

/// Presigned location of a downloadable artifact.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadLink {
    #[serde(alias = "url")]
    pub download_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_device_name_wire_format() {
        let device: TargetDevice = serde_json::from_value(json!({
            "device_name": "Jetson-Nano",
            "software_version": "4.6",
            "software_version_type": "JetPack"
        }))
        .unwrap();
        assert_eq!(device.device_name, DeviceName::JetsonNano);
        assert_eq!(serde_json::to_value(&device.device_name).unwrap(), "Jetson-Nano");
        assert_eq!(device.to_string(), "Jetson-Nano (JetPack 4.6)");
    }

    #[test]
    fn test_unknown_device_name_survives_round_trip() {
        let name: DeviceName = serde_json::from_value(json!("Coral-DevBoard")).unwrap();
        assert_eq!(name, DeviceName::Other("Coral-DevBoard".into()));
        assert_eq!(serde_json::to_value(&name).unwrap(), "Coral-DevBoard");
    }

    #[test]
    fn test_device_name_parse_is_lenient() {
        assert_eq!(DeviceName::parse("jetson_agx_orin"), DeviceName::JetsonAgxOrin);
        assert_eq!(DeviceName::parse("raspberrypi4b"), DeviceName::RaspberryPi4B);
    }

    #[test]
    fn test_framework_from_str() {
        assert_eq!("tensorflow-lite".parse::<ModelFramework>(), Ok(ModelFramework::TensorflowLite));
        assert_eq!("OpenVINO".parse::<ModelFramework>(), Ok(ModelFramework::OpenVino));
        assert!("caffe".parse::<ModelFramework>().is_err());
    }

    #[test]
    fn test_benchmark_task_accepts_latency_alias() {
        let task: BenchmarkTask = serde_json::from_value(json!({
            "benchmark_task_id": "b-1",
            "model_id": "m-1",
            "status": "FINISHED",
            "target_device": { "device_name": "RaspberryPi4B" },
            "latency": 12.5
        }))
        .unwrap();
        assert_eq!(task.task_id(), "b-1");
        assert_eq!(task.latency_ms, Some(12.5));
        assert!(task.is_finished());
    }

    #[test]
    fn test_conversion_task_error_detail() {
        let task: ConversionTask = serde_json::from_value(json!({
            "task_id": "c-1",
            "model_id": "m-1",
            "status": "ERROR",
            "target_framework": "tensorflow_lite",
            "target_device": { "device_name": "RaspberryPi4B" },
            "error": { "code": "UNSUPPORTED_OP", "message": "Op Einsum is not supported" }
        }))
        .unwrap();
        assert_eq!(task.status(), TaskStatus::Error);
        assert_eq!(
            task.error_detail().unwrap().to_string(),
            "[UNSUPPORTED_OP] Op Einsum is not supported"
        );
    }
}
