//! The `Transport` seam between facades and HTTP.

use crate::error::{EdgePressError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// JSON-over-HTTP operations the client needs from the platform.
///
/// Paths are relative to the API base URL. Implementations translate server
/// error payloads into `Submission` (for `post`/`upload`) or `Fetch` (for
/// `get`) errors, keeping the server-provided message.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Read a resource.
    async fn get(&self, path: &str) -> Result<Value>;

    /// Create a resource or trigger an action.
    async fn post(&self, path: &str, body: &Value) -> Result<Value>;

    /// Upload `file` as multipart form data alongside text `fields`.
    async fn upload(&self, path: &str, file: &Path, fields: &[(String, String)]) -> Result<Value>;

    /// Stream `url` (an API path or an absolute presigned URL) to `destination`.
    ///
    /// Returns the number of bytes written.
    async fn download(&self, url: &str, destination: &Path) -> Result<u64>;
}

/// Deserialize a server payload into a typed record.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| EdgePressError::Json {
        message: format!("Unexpected response shape: {}", e),
        source: Some(e),
    })
}

/// Serialize a typed request into a JSON body.
pub fn encode<T: Serialize>(request: &T) -> Result<Value> {
    Ok(serde_json::to_value(request)?)
}
