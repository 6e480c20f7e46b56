//! Subcommand implementations.

use anyhow::{anyhow, bail, Context, Result};
use edgepress::launcher::devices::distinct_device_names;
use edgepress::{
    filter_by_name, filter_by_software_version, AutoCompressionRequest, CompressionMethod,
    ConversionOptions, DeviceName, EdgePressClient, InputShape, Model, ModelFramework,
    PollOptions, TargetDevice, TaskRecord,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct ConvertArgs {
    pub model: PathBuf,
    pub framework: String,
    pub device: String,
    pub software_version: Option<String>,
    pub input_shape: Option<String>,
    pub output: PathBuf,
}

pub struct CompressArgs {
    pub model: PathBuf,
    pub framework: String,
    pub input_shape: String,
    pub method: String,
    pub ratio: f64,
    pub name: Option<String>,
    pub output: PathBuf,
}

pub async fn convert(client: &EdgePressClient, poll: PollOptions, args: ConvertArgs) -> Result<()> {
    let framework: ModelFramework = args.framework.parse().map_err(|e: String| anyhow!(e))?;
    let converter = client.converter().with_poll_options(poll);

    let model = converter.upload_model(&args.model).await?;
    let device = select_device(&model, &args.device, args.software_version.as_deref())?;

    let mut options = ConversionOptions::new(framework, device);
    if let Some(shape) = &args.input_shape {
        options = options.with_input_shape(parse_input_shape(shape)?);
    }

    let task = converter.convert_model(&model, options).await?;
    print_json(&task)?;

    if !task.is_finished() {
        bail!("Conversion task {} ended with {}", task.task_id, task.status);
    }
    let bytes = converter
        .download_converted_model(&task, &args.output)
        .await?;
    info!("Saved {} ({} bytes)", args.output.display(), bytes);
    Ok(())
}

pub async fn benchmark(
    client: &EdgePressClient,
    poll: PollOptions,
    model_path: &Path,
    device: &str,
    software_version: Option<&str>,
) -> Result<()> {
    let benchmarker = client.benchmarker().with_poll_options(poll);

    let model = benchmarker.upload_model(model_path).await?;
    let device = select_device(&model, device, software_version)?;

    let task = benchmarker.benchmark_model(&model, &device, true).await?;
    print_json(&task)?;

    if !task.is_finished() {
        bail!("Benchmark task {} ended with {}", task.task_id, task.status);
    }
    Ok(())
}

pub async fn compress(client: &EdgePressClient, poll: PollOptions, args: CompressArgs) -> Result<()> {
    let framework: ModelFramework = args.framework.parse().map_err(|e: String| anyhow!(e))?;
    let method: CompressionMethod = args.method.parse().map_err(|e: String| anyhow!(e))?;
    let input_shape = parse_input_shape(&args.input_shape)?;
    let compressor = client.compressor().with_poll_options(poll);

    let model = compressor
        .upload_model(&args.model, &[input_shape], framework)
        .await?;

    let name = args.name.unwrap_or_else(|| {
        let stem = args
            .model
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());
        format!("{}_{}", stem, method.as_str().to_lowercase())
    });
    let request = AutoCompressionRequest::new(model.model_id.clone(), name, args.ratio);

    let task = compressor
        .auto_compress(request, method, &args.output)
        .await?;
    print_json(&task)?;

    if !task.is_finished() {
        bail!("Compression task {} ended with {}", task.task_id, task.status);
    }
    info!("Saved {}", args.output.display());
    Ok(())
}

pub async fn devices(client: &EdgePressClient, model_path: &Path) -> Result<()> {
    let model = client.converter().upload_model(model_path).await?;
    if model.available_devices.is_empty() {
        warn!("The server did not report any target devices for this model");
        return Ok(());
    }

    for name in distinct_device_names(&model.available_devices) {
        let variants: Vec<String> = filter_by_name(&name, &model.available_devices)
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("{}: {}", name, variants.join(", "));
    }
    Ok(())
}

pub async fn whoami(client: &EdgePressClient) -> Result<()> {
    let user = client.user_info().await?;
    print_json(&user)
}

/// Pick the device the user named among the ones offered for `model`.
fn select_device(model: &Model, name: &str, software_version: Option<&str>) -> Result<TargetDevice> {
    let device_name = DeviceName::parse(name);

    if model.available_devices.is_empty() {
        let mut device = TargetDevice::new(device_name);
        device.software_version = software_version.map(str::to_string);
        return Ok(device);
    }

    let mut candidates = filter_by_name(&device_name, &model.available_devices);
    if let Some(version) = software_version {
        candidates = filter_by_software_version(version, &candidates);
    }

    match candidates.into_iter().next() {
        Some(device) => Ok(device),
        None => {
            let offered: Vec<String> = distinct_device_names(&model.available_devices)
                .iter()
                .map(ToString::to_string)
                .collect();
            bail!(
                "Device {} is not available for this model (available: {})",
                name,
                offered.join(", ")
            )
        }
    }
}

/// Parse `batch,channel,dim[,dim...]`.
fn parse_input_shape(raw: &str) -> Result<InputShape> {
    let parts = raw
        .split(',')
        .map(|p| p.trim().parse::<u32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid input shape '{}'", raw))?;

    match parts.as_slice() {
        [batch, channel, dimension @ ..] if !dimension.is_empty() => Ok(InputShape {
            batch: *batch,
            channel: *channel,
            dimension: dimension.to_vec(),
        }),
        _ => bail!("Input shape '{}' needs batch, channel and at least one dimension", raw),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
