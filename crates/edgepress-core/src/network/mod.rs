//! Transport layer for talking to the platform API.
//!
//! This module provides:
//! - The `Transport` trait every facade depends on
//! - `HttpTransport`, the reqwest implementation with bearer auth,
//!   server-error translation and one-shot token refresh
//! - Opt-in retry with exponential backoff and jitter
//! - Streaming downloads through a temp file

mod client;
mod download;
mod retry;
mod transport;

pub use client::HttpTransport;
pub use download::stream_to_file;
pub use retry::{retry_async, RetryConfig};
pub use transport::{decode, encode, Transport};
