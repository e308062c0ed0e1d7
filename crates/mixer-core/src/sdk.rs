//! The conferencing SDK as seen by the mixer.
//!
//! Session negotiation, media transport and mixing all live behind
//! [`ConferenceSdk`]. Host shells provide the binding.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::auth::TokenRenewer;
use crate::errors::SdkError;
use crate::events::{ListenerId, SdkEventListener};

/// Participant identity used to open a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MixerIdentity {
    pub name: String,
    pub external_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub third_party_id: Option<String>,
}

impl MixerIdentity {
    pub fn mixer(layout_type: &str, third_party_id: Option<String>) -> Self {
        Self {
            name: "Mixer".to_string(),
            external_id: format!("Mixer_{layout_type}"),
            third_party_id,
        }
    }

    /// Identity used when previewing a layout outside the mixer.
    pub fn test_layout() -> Self {
        Self {
            name: "Test".to_string(),
            external_id: "Test".to_string(),
            third_party_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MediaConstraints {
    pub video: bool,
    pub audio: bool,
}

impl MediaConstraints {
    pub fn none() -> Self {
        Self { video: false, audio: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MixingOptions {
    pub enabled: bool,
}

impl MixingOptions {
    pub fn enabled() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conference_access_token: Option<String>,
    pub constraints: MediaConstraints,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mixing: Option<MixingOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_params: Option<serde_json::Map<String, serde_json::Value>>,
}

impl JoinOptions {
    /// Listen-only join with mixing enabled.
    pub fn mixer(conference_access_token: Option<String>) -> Self {
        Self {
            conference_access_token,
            constraints: MediaConstraints::none(),
            mixing: Some(MixingOptions::enabled()),
            user_params: Some(serde_json::Map::new()),
        }
    }

    pub fn test_layout() -> Self {
        Self {
            conference_access_token: None,
            constraints: MediaConstraints::none(),
            mixing: None,
            user_params: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conference_access_token: Option<String>,
    pub offset: u64,
}

/// A conference fetched from the SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConferenceHandle {
    pub id: String,
}

#[async_trait]
pub trait ConferenceSdk: Send + Sync {
    /// Register the access token and the callback the SDK calls when it
    /// needs a fresh one.
    fn initialize_token(
        &self,
        access_token: String,
        renewer: Arc<dyn TokenRenewer>,
    ) -> Result<(), SdkError>;

    async fn open_session(&self, identity: MixerIdentity) -> Result<(), SdkError>;

    async fn fetch_conference(&self, conference_id: &str) -> Result<ConferenceHandle, SdkError>;

    async fn join(
        &self,
        conference: &ConferenceHandle,
        options: JoinOptions,
    ) -> Result<(), SdkError>;

    async fn replay(
        &self,
        conference: &ConferenceHandle,
        options: ReplayOptions,
        mixing: MixingOptions,
    ) -> Result<(), SdkError>;

    fn add_listener(&self, listener: Arc<dyn SdkEventListener>) -> ListenerId;

    fn remove_listener(&self, id: ListenerId);
}

/// Live registration of an SDK listener. Unsubscribes on drop.
pub struct Subscription {
    sdk: Arc<dyn ConferenceSdk>,
    id: Option<ListenerId>,
}

impl Subscription {
    pub fn new(sdk: Arc<dyn ConferenceSdk>, listener: Arc<dyn SdkEventListener>) -> Self {
        let id = sdk.add_listener(listener);
        Self { sdk, id: Some(id) }
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some()
    }

    pub fn unsubscribe(&mut self) {
        if let Some(id) = self.id.take() {
            self.sdk.remove_listener(id);
            tracing::debug!("sdk listener removed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
