//! Account information.

use crate::auth::UserInfo;
use crate::config::Endpoints;
use crate::error::Result;
use crate::network::decode;
use crate::EdgePressClient;
use tracing::debug;

impl EdgePressClient {
    /// Details of the logged-in user, including remaining credit.
    pub async fn user_info(&self) -> Result<UserInfo> {
        let user: UserInfo = decode(self.transport.get(Endpoints::USER).await?)?;
        debug!(
            "User {} has {} credits left",
            user.email,
            user.remaining_credit
                .map(|credit| credit.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );
        Ok(user)
    }
}
