//! EdgePress CLI - convert, benchmark and compress models from a terminal.
//!
//! Every subcommand logs in, uploads the given model and follows the
//! resulting job until it finishes. Ctrl-C stops waiting locally; jobs keep
//! running on the server.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use edgepress::config::{AuthConfig, NetworkConfig};
use edgepress::{CancellationToken, EdgePressClient, PollOptions};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "edgepress")]
#[command(about = "Convert, benchmark and compress models on the EdgePress platform")]
struct Args {
    /// API base URL
    #[arg(long, env = NetworkConfig::API_URL_ENV_VAR, default_value = NetworkConfig::DEFAULT_API_URL)]
    api_url: String,

    /// Account email
    #[arg(long, env = AuthConfig::EMAIL_ENV_VAR)]
    email: String,

    /// Account password
    #[arg(long, env = AuthConfig::PASSWORD_ENV_VAR, hide_env_values = true)]
    password: String,

    /// Accept invalid TLS certificates
    #[arg(long)]
    insecure: bool,

    /// Seconds between two status reads
    #[arg(long, default_value = "1")]
    poll_interval: u64,

    /// Give up waiting after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a model for a target device and download the result
    Convert {
        /// Model file to upload
        #[arg(long)]
        model: PathBuf,
        /// Target framework (onnx, tensorflow_lite, tensorrt, openvino, ...)
        #[arg(long)]
        framework: String,
        /// Target device name (e.g. Jetson-Nano, RaspberryPi4B)
        #[arg(long)]
        device: String,
        /// Device software version (e.g. 4.6 for JetPack 4.6)
        #[arg(long)]
        software_version: Option<String>,
        /// Input shape as batch,channel,dim[,dim...]
        #[arg(long)]
        input_shape: Option<String>,
        /// Where to save the converted model
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Benchmark a model on a target device
    Benchmark {
        #[arg(long)]
        model: PathBuf,
        #[arg(long)]
        device: String,
        #[arg(long)]
        software_version: Option<String>,
    },
    /// Compress a model using the server's recommendation
    Compress {
        #[arg(long)]
        model: PathBuf,
        /// Framework of the uploaded model
        #[arg(long)]
        framework: String,
        /// Input shape as batch,channel,dim[,dim...]
        #[arg(long)]
        input_shape: String,
        /// Compression method (PR_L2, PR_GM, PR_NN, FD_TK, FD_CP, FD_SVD)
        #[arg(long, default_value = "PR_L2")]
        method: String,
        /// Recommendation ratio, 0 < ratio <= 1
        #[arg(long, default_value = "0.5")]
        ratio: f64,
        /// Name of the compressed model
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// List the devices a model can target
    Devices {
        #[arg(long)]
        model: PathBuf,
    },
    /// Show the logged-in account
    Whoami,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Connecting to {}", args.api_url);

    let client = EdgePressClient::builder(&args.api_url)
        .credentials(&args.email, &args.password)
        .verify_ssl(!args.insecure)
        .poll_interval(Duration::from_secs(args.poll_interval))
        .poll_timeout(args.timeout.map(Duration::from_secs))
        .build()
        .await?;

    // Ctrl-C stops polling; the server-side job is left running.
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current status read");
            on_signal.cancel();
        }
    });
    let poll = PollOptions::from_settings(client.settings()).with_cancellation(cancel);

    match args.command {
        Command::Convert {
            model,
            framework,
            device,
            software_version,
            input_shape,
            output,
        } => {
            commands::convert(
                &client,
                poll,
                commands::ConvertArgs {
                    model,
                    framework,
                    device,
                    software_version,
                    input_shape,
                    output,
                },
            )
            .await
        }
        Command::Benchmark {
            model,
            device,
            software_version,
        } => commands::benchmark(&client, poll, &model, &device, software_version.as_deref()).await,
        Command::Compress {
            model,
            framework,
            input_shape,
            method,
            ratio,
            name,
            output,
        } => {
            commands::compress(
                &client,
                poll,
                commands::CompressArgs {
                    model,
                    framework,
                    input_shape,
                    method,
                    ratio,
                    name,
                    output,
                },
            )
            .await
        }
        Command::Devices { model } => commands::devices(&client, &model).await,
        Command::Whoami => commands::whoami(&client).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_compress_defaults() {
        let args = Args::try_parse_from([
            "edgepress",
            "--email",
            "dev@example.com",
            "--password",
            "secret",
            "compress",
            "--model",
            "model.onnx",
            "--framework",
            "onnx",
            "--input-shape",
            "1,3,224,224",
            "-o",
            "out.onnx",
        ])
        .unwrap();

        match args.command {
            Command::Compress { method, ratio, .. } => {
                assert_eq!(method, "PR_L2");
                assert_eq!(ratio, 0.5);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(args.poll_interval, 1);
    }
}
