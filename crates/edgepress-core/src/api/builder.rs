//! Builder for configuring EdgePressClient initialization.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{Session, StaticToken, TokenProvider};
use crate::config::{ClientSettings, PollingConfig};
use crate::error::{EdgePressError, Result};
use crate::network::{HttpTransport, RetryConfig};
use crate::EdgePressClient;

enum Credentials {
    Password { email: String, password: String },
    AccessToken(String),
}

/// Builder for configuring EdgePressClient initialization.
///
/// # Example
///
/// ```rust,ignore
/// use edgepress::EdgePressClient;
/// use std::time::Duration;
///
/// let client = EdgePressClient::builder("https://api.edgepress.ai")
///     .credentials("dev@example.com", "secret")
///     .poll_timeout(Some(Duration::from_secs(600)))
///     .build()
///     .await?;
/// ```
pub struct EdgePressClientBuilder {
    base_url: String,
    credentials: Option<Credentials>,
    verify_ssl: bool,
    settings: ClientSettings,
}

impl EdgePressClientBuilder {
    /// Create a new builder for the API at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            credentials: None,
            verify_ssl: true,
            settings: ClientSettings::default(),
        }
    }

    /// Log in with email and password during `build`.
    pub fn credentials(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::Password {
            email: email.into(),
            password: password.into(),
        });
        self
    }

    /// Use an access token obtained elsewhere. It is never refreshed.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::AccessToken(token.into()));
        self
    }

    /// Verify TLS certificates.
    ///
    /// Default: `true`
    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    /// Wait between two status reads while polling.
    ///
    /// Default: 1 second. Values below 100 ms are raised to 100 ms.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.settings.poll_interval = interval.max(PollingConfig::MIN_INTERVAL);
        self
    }

    /// Local polling budget.
    ///
    /// Default: `None` (poll until the task is terminal)
    pub fn poll_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.settings.poll_timeout = timeout;
        self
    }

    /// Retry policy for status reads (GET). Job submissions are sent once.
    ///
    /// Default: `RetryConfig::none()`
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.settings.retry = retry;
        self
    }

    /// Build the client, logging in if password credentials were given.
    pub async fn build(self) -> Result<EdgePressClient> {
        let credentials = self.credentials.ok_or_else(|| EdgePressError::Config {
            message: "No credentials configured; call credentials() or access_token()".into(),
        })?;

        let tokens: Arc<dyn TokenProvider> = match credentials {
            Credentials::Password { email, password } => {
                if email.trim().is_empty() || password.is_empty() {
                    return Err(EdgePressError::validation(
                        "credentials",
                        "email and password must not be empty",
                    ));
                }
                let auth_transport = Arc::new(
                    HttpTransport::with_options(&self.base_url, self.verify_ssl)?
                        .with_retry(self.settings.retry.clone()),
                );
                Arc::new(Session::login(auth_transport, &email, &password).await?)
            }
            Credentials::AccessToken(token) => Arc::new(StaticToken::new(token)),
        };

        let transport = HttpTransport::with_options(&self.base_url, self.verify_ssl)?
            .with_token_provider(tokens)
            .with_retry(self.settings.retry.clone());

        Ok(EdgePressClient::with_transport(
            Arc::new(transport),
            self.settings,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_without_credentials_is_a_config_error() {
        let result = EdgePressClientBuilder::new("https://api.example.com").build().await;
        assert!(matches!(result, Err(EdgePressError::Config { .. })));
    }

    #[tokio::test]
    async fn test_build_with_invalid_url_fails_before_login() {
        let result = EdgePressClientBuilder::new("not a url")
            .access_token("token")
            .build()
            .await;
        assert!(matches!(result, Err(EdgePressError::Config { .. })));
    }

    #[tokio::test]
    async fn test_build_with_access_token_applies_settings() {
        let client = EdgePressClientBuilder::new("https://api.example.com")
            .access_token("token")
            .poll_interval(Duration::from_millis(10))
            .poll_timeout(Some(Duration::from_secs(30)))
            .build()
            .await
            .unwrap();

        assert_eq!(client.settings().poll_interval, PollingConfig::MIN_INTERVAL);
        assert_eq!(client.settings().poll_timeout, Some(Duration::from_secs(30)));
        assert_eq!(client.settings().retry.max_attempts, 1);
    }

    #[tokio::test]
    async fn test_empty_password_is_rejected_locally() {
        let result = EdgePressClientBuilder::new("https://api.example.com")
            .credentials("dev@example.com", "")
            .build()
            .await;
        assert!(matches!(result, Err(EdgePressError::Validation { .. })));
    }
}
