//! Centralized configuration for the EdgePress client.
//!
//! Constants for network operations, polling and authentication, plus the
//! runtime `ClientSettings` a client instance is built with.

use crate::network::RetryConfig;
use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const USER_AGENT: &'static str = concat!("edgepress-rs/", env!("CARGO_PKG_VERSION"));
}

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const DEFAULT_API_URL: &'static str = "https://api.edgepress.ai";
    pub const API_URL_ENV_VAR: &'static str = "EDGEPRESS_API_URL";
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    pub const UPLOAD_REQUEST_TIMEOUT: Duration = Duration::from_secs(600);
    pub const DOWNLOAD_TEMP_SUFFIX: &'static str = ".part";
}

/// Task polling configuration.
pub struct PollingConfig;

impl PollingConfig {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
    /// Floor applied to caller-supplied intervals.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(100);
}

/// Authentication configuration.
pub struct AuthConfig;

impl AuthConfig {
    pub const EMAIL_ENV_VAR: &'static str = "EDGEPRESS_EMAIL";
    pub const PASSWORD_ENV_VAR: &'static str = "EDGEPRESS_PASSWORD";
    /// Access tokens are refreshed proactively once they are this old.
    pub const ACCESS_TOKEN_MAX_AGE: Duration = Duration::from_secs(50 * 60);
}

/// REST endpoints on the platform API, relative to the base URL.
pub struct Endpoints;

impl Endpoints {
    pub const LOGIN: &'static str = "/api/v1/auth/login";
    pub const REFRESH: &'static str = "/api/v1/auth/refresh";
    pub const USER: &'static str = "/api/v1/user";

    pub const LAUNCHER_MODEL_UPLOAD: &'static str = "/api/v1/launcher/models";
    pub const CONVERSION_TASKS: &'static str = "/api/v1/launcher/conversion-tasks";
    pub const CONVERSION_TASK: &'static str = "/api/v1/launcher/conversion-tasks/{task_id}";
    pub const CONVERSION_DOWNLOAD: &'static str =
        "/api/v1/launcher/conversion-tasks/{task_id}/download";
    pub const BENCHMARK_TASKS: &'static str = "/api/v1/launcher/benchmark-tasks";
    pub const BENCHMARK_TASK: &'static str = "/api/v1/launcher/benchmark-tasks/{task_id}";

    pub const COMPRESSOR_MODEL_UPLOAD: &'static str = "/api/v1/compressor/models";
    pub const AVAILABLE_LAYERS: &'static str =
        "/api/v1/compressor/models/{model_id}/available-layers";
    pub const COMPRESSIONS: &'static str = "/api/v1/compressor/compressions";
    pub const RECOMMENDATION: &'static str =
        "/api/v1/compressor/compressions/{compression_id}/recommendation";
    pub const COMPRESSION_TASKS: &'static str = "/api/v1/compressor/compression-tasks";
    pub const COMPRESSION_TASK: &'static str = "/api/v1/compressor/compression-tasks/{task_id}";
    pub const COMPRESSED_MODEL_DOWNLOAD: &'static str =
        "/api/v1/compressor/models/{model_id}/download";
}

/// Runtime settings shared by every facade built from one client.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Wait between two status reads.
    pub poll_interval: Duration,
    /// Local polling budget; `None` polls until the task is terminal.
    pub poll_timeout: Option<Duration>,
    /// Retry policy for GET requests. Defaults to a single attempt.
    pub retry: RetryConfig,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            poll_interval: PollingConfig::DEFAULT_INTERVAL,
            poll_timeout: None,
            retry: RetryConfig::none(),
        }
    }
}

/// Substitute a `{name}` placeholder in an endpoint template.
pub fn endpoint(template: &str, name: &str, value: &str) -> String {
    template.replace(&format!("{{{}}}", name), &urlencoding::encode(value))
}
