//! Launcher: format conversion and device benchmarking.

mod benchmarker;
mod converter;
pub mod devices;
mod types;

pub use benchmarker::Benchmarker;
pub use converter::{ConversionOptions, Converter};
pub use devices::{filter_by_hardware_type, filter_by_name, filter_by_software_version};
pub use types::{
    BenchmarkRequest, BenchmarkTask, ConversionRequest, ConversionTask, DeviceName, DownloadLink,
    InputShape, Model, ModelFramework, TargetDevice,
};
