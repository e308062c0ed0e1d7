use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::MixerError;

/// Values injected by the mixer into the layout page.
///
/// Keys are camelCase to match the field ids the mixer fills in.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MixerSettings {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub refresh_url: String,
    #[serde(default)]
    pub cat_token: Option<String>,
    #[serde(default)]
    pub conference_id: String,
    #[serde(default)]
    pub third_party_id: Option<String>,
    #[serde(default)]
    pub layout_type: String,
    #[serde(default)]
    pub replay_offset: u64,
}

impl MixerSettings {
    pub fn from_json(json: &str) -> Result<Self, MixerError> {
        serde_json::from_str(json)
            .map_err(|e| MixerError::InvalidSettings(format!("malformed settings: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self, MixerError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            MixerError::InvalidSettings(format!("cannot read {}: {e}", path.display()))
        })?;
        let settings = Self::from_json(&contents)?;
        tracing::debug!(
            "loaded mixer settings from {} (layout={})",
            path.display(),
            settings.layout_type
        );
        Ok(settings)
    }

    /// Check that everything a join or replay needs is present.
    pub fn validate(&self) -> Result<(), MixerError> {
        if self.access_token.trim().is_empty() {
            return Err(MixerError::InvalidSettings("accessToken is empty".into()));
        }
        if self.conference_id.trim().is_empty() {
            return Err(MixerError::InvalidSettings("conferenceId is empty".into()));
        }
        url::Url::parse(&self.refresh_url)
            .map_err(|e| MixerError::InvalidUrl(format!("refreshUrl '{}': {e}", self.refresh_url)))?;
        Ok(())
    }

    /// The conference access token, or `None` when the field was left blank.
    pub fn conference_access_token(&self) -> Option<String> {
        self.cat_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }

    /// Live stream layouts display a "live" indicator.
    pub fn is_live_layout(&self) -> bool {
        matches!(self.layout_type.as_str(), "stream" | "hls")
    }
}
