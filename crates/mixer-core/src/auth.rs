use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::MixerError;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Callback the SDK invokes when its access token is near or past expiry.
///
/// Errors are returned to the SDK untouched so its own retry policy applies.
#[async_trait]
pub trait TokenRenewer: Send + Sync {
    async fn renew(&self, is_expired: bool) -> Result<String, MixerError>;
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: Option<String>,
}

/// Exchanges a refresh token for a new access token at `refresh_url`.
pub struct RefreshTokenRenewer {
    client: reqwest::Client,
    refresh_url: url::Url,
    refresh_token: String,
    access_token: RwLock<String>,
}

impl RefreshTokenRenewer {
    pub fn new(
        refresh_url: &str,
        access_token: String,
        refresh_token: String,
    ) -> Result<Self, MixerError> {
        let refresh_url = url::Url::parse(refresh_url)
            .map_err(|e| MixerError::InvalidUrl(format!("refresh url '{refresh_url}': {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| MixerError::Http(e.to_string()))?;
        Ok(Self {
            client,
            refresh_url,
            refresh_token,
            access_token: RwLock::new(access_token),
        })
    }

    /// The bearer used for the next refresh.
    pub fn current_access_token(&self) -> String {
        self.access_token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub async fn refresh(&self) -> Result<String, MixerError> {
        tracing::info!("refreshing access token at {}", self.refresh_url);

        let bearer = self.current_access_token();
        let resp = self
            .client
            .post(self.refresh_url.clone())
            .bearer_auth(bearer)
            .json(&RefreshRequest {
                refresh_token: &self.refresh_token,
            })
            .send()
            .await
            .map_err(|e| MixerError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(MixerError::TokenRefresh(format!(
                "refresh endpoint returned status {}",
                resp.status()
            )));
        }

        let data: RefreshResponse = resp
            .json()
            .await
            .map_err(|e| MixerError::TokenRefresh(format!("invalid refresh response: {e}")))?;

        let token = data
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| MixerError::TokenRefresh("response has no access_token".into()))?;

        *self.access_token.write().unwrap_or_else(|e| e.into_inner()) = token.clone();
        tracing::info!("access token refreshed");
        Ok(token)
    }
}

#[async_trait]
impl TokenRenewer for RefreshTokenRenewer {
    async fn renew(&self, _is_expired: bool) -> Result<String, MixerError> {
        self.refresh().await.inspect_err(|e| {
            tracing::warn!("token renewal failed: {e}");
        })
    }
}

/// Hands the same client access token back until the SDK says it expired.
pub struct StaticTokenRenewer {
    token: String,
}

impl StaticTokenRenewer {
    pub fn new(token: String) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenRenewer for StaticTokenRenewer {
    async fn renew(&self, is_expired: bool) -> Result<String, MixerError> {
        if is_expired {
            Err(MixerError::TokenRefresh(
                "the client access token has expired".into(),
            ))
        } else {
            Ok(self.token.clone())
        }
    }
}
