//! Wire types for the auth endpoints.

use serde::{Deserialize, Serialize};

/// Body of the login call.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Body of the refresh call.
#[derive(Clone, Serialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Access/refresh token pair issued by the platform.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for Tokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokens")
            .field("access_token", &"***")
            .field("refresh_token", &"***")
            .finish()
    }
}

/// Account details of the logged-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    /// Credits left for paid jobs (conversion, benchmark, compression).
    #[serde(default)]
    pub remaining_credit: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_output_redacts_secrets() {
        let tokens = Tokens {
            access_token: "secret-access".into(),
            refresh_token: "secret-refresh".into(),
        };
        let rendered = format!("{:?}", tokens);
        assert!(!rendered.contains("secret"));

        let login = LoginRequest {
            username: "dev@example.com".into(),
            password: "hunter2".into(),
        };
        let rendered = format!("{:?}", login);
        assert!(rendered.contains("dev@example.com"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_user_info_optional_fields_default() {
        let user: UserInfo = serde_json::from_value(serde_json::json!({
            "user_id": "u-1",
            "email": "dev@example.com"
        }))
        .unwrap();
        assert_eq!(user.remaining_credit, None);
        assert!(user.username.is_none());
    }
}
