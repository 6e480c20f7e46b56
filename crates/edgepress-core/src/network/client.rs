//! reqwest-backed `Transport`.
//!
//! Provides a wrapper around reqwest with:
//! - Base-URL resolution for API paths and pass-through for presigned URLs
//! - Bearer authentication from a `TokenProvider`
//! - One token refresh and replay on 401
//! - Server error payloads translated into `Submission` / `Fetch` errors
//! - Separate, longer timeout for uploads and downloads

use crate::auth::TokenProvider;
use crate::config::{AppConfig, NetworkConfig};
use crate::error::{EdgePressError, Result};
use crate::network::download::stream_to_file;
use crate::network::retry::{retry_async, RetryConfig};
use crate::network::transport::Transport;
use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Which error family a failed call maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallKind {
    Submit,
    Fetch,
}

/// HTTP transport for the platform API.
pub struct HttpTransport {
    client: Client,
    transfer_client: Client,
    base_url: Url,
    tokens: Option<Arc<dyn TokenProvider>>,
    retry: RetryConfig,
}

impl HttpTransport {
    /// Create an unauthenticated transport with certificate verification on.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_options(base_url, true)
    }

    /// Create an unauthenticated transport.
    ///
    /// `verify_ssl = false` accepts invalid certificates (self-hosted
    /// deployments with private CAs).
    pub fn with_options(base_url: &str, verify_ssl: bool) -> Result<Self> {
        let mut parsed = Url::parse(base_url).map_err(|e| EdgePressError::Config {
            message: format!("Invalid API URL '{}': {}", base_url, e),
        })?;
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }

        if !verify_ssl {
            warn!("TLS certificate verification disabled for {}", parsed);
        }

        Ok(Self {
            client: build_client(NetworkConfig::REQUEST_TIMEOUT, verify_ssl)?,
            transfer_client: build_client(NetworkConfig::UPLOAD_REQUEST_TIMEOUT, verify_ssl)?,
            base_url: parsed,
            tokens: None,
            retry: RetryConfig::none(),
        })
    }

    /// Attach credentials to every request sent to the API origin.
    pub fn with_token_provider(mut self, tokens: Arc<dyn TokenProvider>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Retry policy for `get` and `post`. Uploads are never replayed.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn resolve(&self, path: &str) -> Result<Url> {
        let resolved = if path.starts_with("http://") || path.starts_with("https://") {
            Url::parse(path)
        } else {
            self.base_url.join(path.trim_start_matches('/'))
        };
        resolved.map_err(|e| EdgePressError::Config {
            message: format!("Invalid request path '{}': {}", path, e),
        })
    }

    fn is_api_origin(&self, url: &Url) -> bool {
        url.origin() == self.base_url.origin()
    }

    /// Send a request built by `build`, handling auth and error translation.
    async fn execute<F>(&self, kind: CallKind, url: &Url, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let provider = self.tokens.as_ref().filter(|_| self.is_api_origin(url));
        let mut refreshed = false;

        loop {
            let mut request = build();
            if let Some(provider) = provider {
                request = request.bearer_auth(provider.access_token().await?);
            }

            let response = request
                .send()
                .await
                .map_err(|e| send_error(kind, url, e))?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                if let Some(provider) = provider {
                    if !refreshed {
                        debug!("401 from {}, refreshing access token", url.path());
                        provider.refresh().await?;
                        refreshed = true;
                        continue;
                    }
                }
            }

            if status.is_success() {
                return Ok(response);
            }

            let body = response.text().await.unwrap_or_default();
            return Err(status_error(kind, status, &body));
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<Value> {
        let url = self.resolve(path)?;
        let label = format!("GET {}", url.path());
        let this = self;
        let url = &url;

        retry_async(
            &self.retry,
            &label,
            move || async move {
                let response = this
                    .execute(CallKind::Fetch, url, || this.client.get(url.clone()))
                    .await?;
                read_json(response, CallKind::Fetch).await
            },
            EdgePressError::is_retryable,
        )
        .await
    }

    /// Sent once, whatever the retry policy.
    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.resolve(path)?;
        let response = self
            .execute(CallKind::Submit, &url, || self.client.post(url.clone()).json(body))
            .await?;
        read_json(response, CallKind::Submit).await
    }

    async fn upload(&self, path: &str, file: &Path, fields: &[(String, String)]) -> Result<Value> {
        if !file.is_file() {
            return Err(EdgePressError::FileNotFound(file.to_path_buf()));
        }
        let bytes = tokio::fs::read(file)
            .await
            .map_err(|e| EdgePressError::io_with_path(e, file))?;
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());
        let url = self.resolve(path)?;

        debug!("Uploading {} ({} bytes) to {}", file_name, bytes.len(), url.path());
        let response = self
            .execute(CallKind::Submit, &url, || {
                let part = multipart::Part::bytes(bytes.clone()).file_name(file_name.clone());
                let form = fields
                    .iter()
                    .fold(multipart::Form::new().part("file", part), |form, (k, v)| {
                        form.text(k.clone(), v.clone())
                    });
                self.transfer_client.post(url.clone()).multipart(form)
            })
            .await?;
        read_json(response, CallKind::Submit).await
    }

    async fn download(&self, url: &str, destination: &Path) -> Result<u64> {
        let url = self.resolve(url)?;
        let response = self
            .execute(CallKind::Fetch, &url, || self.transfer_client.get(url.clone()))
            .await?;
        stream_to_file(response, destination).await
    }
}

fn build_client(timeout: Duration, verify_ssl: bool) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(AppConfig::USER_AGENT)
        .danger_accept_invalid_certs(!verify_ssl)
        .build()
        .map_err(|e| EdgePressError::Network {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(e),
        })
}

async fn read_json(response: Response, kind: CallKind) -> Result<Value> {
    let status = response.status();
    let text = response.text().await.map_err(|e| match kind {
        CallKind::Fetch => EdgePressError::Fetch {
            message: format!("Failed to read response body: {}", e),
            status_code: Some(status.as_u16()),
        },
        CallKind::Submit => EdgePressError::Network {
            message: format!("Failed to read response body: {}", e),
            source: Some(e),
        },
    })?;

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

fn send_error(kind: CallKind, url: &Url, err: reqwest::Error) -> EdgePressError {
    match kind {
        CallKind::Fetch => EdgePressError::Fetch {
            message: format!("GET {} failed: {}", url.path(), err),
            status_code: None,
        },
        CallKind::Submit => EdgePressError::Network {
            message: format!("POST {} failed: {}", url.path(), err),
            source: Some(err),
        },
    }
}

fn status_error(kind: CallKind, status: StatusCode, body: &str) -> EdgePressError {
    let message = server_message(status, body);
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return EdgePressError::Auth { message };
    }
    match kind {
        CallKind::Submit => EdgePressError::Submission {
            message,
            status_code: Some(status.as_u16()),
        },
        CallKind::Fetch => EdgePressError::Fetch {
            message,
            status_code: Some(status.as_u16()),
        },
    }
}

/// Extract the human-readable message from a server error body.
///
/// Looks at `detail`, `message` and `error` (string or `{ "message": .. }`),
/// then falls back to the raw body and finally the status reason.
fn server_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        ["detail", "message", "error"]
            .iter()
            .find_map(|key| match value.get(key) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(Value::Object(inner)) => inner
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
    });

    from_json.unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        } else {
            trimmed.to_string()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_prefers_detail_field() {
        let body = r#"{"detail": "Quota exceeded", "message": "ignored"}"#;
        assert_eq!(server_message(StatusCode::BAD_REQUEST, body), "Quota exceeded");
    }

    #[test]
    fn test_server_message_reads_nested_error_object() {
        let body = r#"{"error": {"code": "DEVICE", "message": "Device not supported"}}"#;
        assert_eq!(
            server_message(StatusCode::BAD_REQUEST, body),
            "Device not supported"
        );
    }

    #[test]
    fn test_server_message_falls_back_to_body_then_reason() {
        assert_eq!(server_message(StatusCode::BAD_GATEWAY, "upstream down"), "upstream down");
        assert_eq!(server_message(StatusCode::NOT_FOUND, ""), "Not Found");
    }

    #[test]
    fn test_status_error_mapping() {
        let err = status_error(CallKind::Submit, StatusCode::BAD_REQUEST, r#"{"detail":"bad model"}"#);
        assert!(matches!(
            err,
            EdgePressError::Submission { ref message, status_code: Some(400) } if message == "bad model"
        ));

        let err = status_error(CallKind::Fetch, StatusCode::SERVICE_UNAVAILABLE, "");
        assert!(matches!(err, EdgePressError::Fetch { status_code: Some(503), .. }));
        assert!(err.is_retryable());

        let err = status_error(CallKind::Fetch, StatusCode::UNAUTHORIZED, "");
        assert!(matches!(err, EdgePressError::Auth { .. }));
    }

    #[test]
    fn test_resolve_keeps_base_path_prefix() {
        let transport = HttpTransport::new("https://api.example.com/platform").unwrap();
        let url = transport.resolve("/api/v1/user").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/platform/api/v1/user");
    }

    #[test]
    fn test_presigned_urls_pass_through_without_api_origin() {
        let transport = HttpTransport::new("https://api.example.com").unwrap();
        let url = transport
            .resolve("https://bucket.storage.example.net/model.tflite?sig=abc")
            .unwrap();
        assert_eq!(url.host_str(), Some("bucket.storage.example.net"));
        assert!(!transport.is_api_origin(&url));
        assert!(transport.is_api_origin(&transport.resolve("/api/v1/user").unwrap()));
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        assert!(matches!(
            HttpTransport::new("not a url"),
            Err(EdgePressError::Config { .. })
        ));
    }
}
