//! Email/password session with access-token refresh.

use super::types::{LoginRequest, RefreshRequest, Tokens};
use super::TokenProvider;
use crate::config::{AuthConfig, Endpoints};
use crate::error::{EdgePressError, Result};
use crate::network::{decode, encode, Transport};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

struct TokenState {
    tokens: Tokens,
    issued_at: DateTime<Utc>,
}

/// A logged-in session.
///
/// Talks to the auth endpoints through an *unauthenticated* transport and
/// hands tokens to the authenticated one via `TokenProvider`.
pub struct Session {
    transport: Arc<dyn Transport>,
    state: RwLock<TokenState>,
}

impl Session {
    /// Log in with email and password.
    pub async fn login(transport: Arc<dyn Transport>, email: &str, password: &str) -> Result<Self> {
        let request = LoginRequest {
            username: email.to_string(),
            password: password.to_string(),
        };

        let response = transport
            .post(Endpoints::LOGIN, &encode(&request)?)
            .await
            .map_err(|e| auth_error("Login failed", e))?;
        let tokens: Tokens = decode(response)?;

        info!("Logged in as {}", email);
        Ok(Self::from_tokens(transport, tokens))
    }

    /// Resume a session from previously issued tokens.
    pub fn from_tokens(transport: Arc<dyn Transport>, tokens: Tokens) -> Self {
        Self {
            transport,
            state: RwLock::new(TokenState {
                tokens,
                issued_at: Utc::now(),
            }),
        }
    }

    /// Snapshot of the current token pair.
    pub async fn tokens(&self) -> Tokens {
        self.state.read().await.tokens.clone()
    }

    async fn is_stale(&self) -> bool {
        let issued_at = self.state.read().await.issued_at;
        let age = Utc::now().signed_duration_since(issued_at);
        age.to_std()
            .map(|age| age >= AuthConfig::ACCESS_TOKEN_MAX_AGE)
            .unwrap_or(false)
    }
}

#[async_trait]
impl TokenProvider for Session {
    async fn access_token(&self) -> Result<String> {
        if self.is_stale().await {
            debug!("Access token older than {:?}, refreshing", AuthConfig::ACCESS_TOKEN_MAX_AGE);
            self.refresh().await?;
        }
        Ok(self.state.read().await.tokens.access_token.clone())
    }

    async fn refresh(&self) -> Result<()> {
        let request = RefreshRequest {
            refresh_token: self.state.read().await.tokens.refresh_token.clone(),
        };

        let response = self
            .transport
            .post(Endpoints::REFRESH, &encode(&request)?)
            .await
            .map_err(|e| auth_error("Token refresh failed", e))?;
        let tokens: Tokens = decode(response)?;

        let mut state = self.state.write().await;
        state.tokens = tokens;
        state.issued_at = Utc::now();
        info!("Access token refreshed");
        Ok(())
    }
}

/// Server rejections of credentials surface as `Auth`; transport trouble stays as is.
fn auth_error(context: &str, err: EdgePressError) -> EdgePressError {
    match err {
        EdgePressError::Submission { message, .. } | EdgePressError::Auth { message } => {
            EdgePressError::Auth {
                message: format!("{}: {}", context, message),
            }
        }
        other => other,
    }
}
