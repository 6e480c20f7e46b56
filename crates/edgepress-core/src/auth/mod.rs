//! Authentication: access tokens and the session that keeps them fresh.
//!
//! The transport only needs a `TokenProvider`. `Session` is the
//! email/password implementation; `StaticToken` wraps a token obtained
//! elsewhere (CI secrets, tests).

mod session;
mod types;

pub use session::Session;
pub use types::{LoginRequest, RefreshRequest, Tokens, UserInfo};

use crate::error::{EdgePressError, Result};
use async_trait::async_trait;

/// Source of bearer tokens for API requests.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current access token, refreshed first if it is known to be stale.
    async fn access_token(&self) -> Result<String>;

    /// Force a refresh, e.g. after the server answered 401.
    async fn refresh(&self) -> Result<()>;
}

/// A fixed access token that cannot be refreshed.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken(***)")
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }

    async fn refresh(&self) -> Result<()> {
        Err(EdgePressError::Auth {
            message: "static access token was rejected and cannot be refreshed".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token_refresh_is_auth_error() {
        let token = StaticToken::new("abc");
        assert_eq!(token.access_token().await.unwrap(), "abc");
        assert!(matches!(
            token.refresh().await,
            Err(EdgePressError::Auth { .. })
        ));
        assert_eq!(format!("{:?}", token), "StaticToken(***)");
    }
}
