//! Streaming download of model artifacts.
//!
//! Bytes go to `<destination>.part` first and are renamed into place only
//! after the stream finishes, so a failed download never leaves a truncated
//! file at the final path.

use crate::config::NetworkConfig;
use crate::error::{EdgePressError, Result};
use futures::StreamExt;
use reqwest::Response;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Temp path used while `destination` is being written.
pub(crate) fn temp_path_for(destination: &Path) -> PathBuf {
    PathBuf::from(format!(
        "{}{}",
        destination.display(),
        NetworkConfig::DOWNLOAD_TEMP_SUFFIX
    ))
}

/// Write the body of `response` to `destination`.
///
/// Returns the number of bytes written.
pub async fn stream_to_file(response: Response, destination: &Path) -> Result<u64> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| EdgePressError::io_with_path(e, parent))?;
        }
    }

    let temp_path = temp_path_for(destination);
    let total = response.content_length();

    match write_stream(response, &temp_path).await {
        Ok(bytes) => {
            tokio::fs::rename(&temp_path, destination)
                .await
                .map_err(|e| {
                    let _ = std::fs::remove_file(&temp_path);
                    EdgePressError::Io {
                        message: format!("Failed to move download to final destination: {}", e),
                        path: Some(destination.to_path_buf()),
                        source: Some(e),
                    }
                })?;

            if let Some(expected) = total {
                if expected != bytes {
                    debug!("Content-Length was {} but {} bytes arrived", expected, bytes);
                }
            }
            info!("Downloaded {} bytes to {}", bytes, destination.display());
            Ok(bytes)
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&temp_path).await;
            Err(e)
        }
    }
}

async fn write_stream(response: Response, temp_path: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(temp_path)
        .await
        .map_err(|e| EdgePressError::io_with_path(e, temp_path))?;

    let mut written: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| EdgePressError::Network {
            message: format!("Download interrupted after {} bytes: {}", written, e),
            source: Some(e),
        })?;
        file.write_all(&chunk)
            .await
            .map_err(|e| EdgePressError::io_with_path(e, temp_path))?;
        written += chunk.len() as u64;
    }

    file.flush()
        .await
        .map_err(|e| EdgePressError::io_with_path(e, temp_path))?;
    Ok(written)
}
