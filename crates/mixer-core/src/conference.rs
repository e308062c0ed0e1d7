use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::auth::{RefreshTokenRenewer, StaticTokenRenewer, TokenRenewer};
use crate::errors::{MixerError, PipelineStage, SdkError};
use crate::events::{ConferenceState, EventEmitter, MixerEvent, MixerEventListener};
use crate::sdk::{
    ConferenceHandle, ConferenceSdk, JoinOptions, MixerIdentity, MixingOptions, ReplayOptions,
};
use crate::settings::MixerSettings;

/// Last step of a pipeline.
#[derive(Debug, Clone)]
enum Finish {
    Join(JoinOptions),
    Replay(ReplayOptions),
}

/// Everything a pipeline needs, read from settings once it holds the guard.
struct Plan {
    access_token: String,
    renewer: Arc<dyn TokenRenewer>,
    identity: MixerIdentity,
    conference_id: String,
    finish: Finish,
}

/// Held for the duration of a pipeline; clears the in-flight flag on drop.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, MixerError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| MixerError::PipelineBusy)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives the settings → token → session open → conference fetch →
/// join/replay pipeline.
///
/// Only one pipeline runs at a time; a second call while one is in flight
/// fails with [`MixerError::PipelineBusy`] without touching the SDK.
pub struct ConferenceController {
    sdk: Arc<dyn ConferenceSdk>,
    emitter: EventEmitter<dyn MixerEventListener>,
    state: Arc<Mutex<ConferenceState>>,
    in_flight: AtomicBool,
}

impl ConferenceController {
    pub fn new(sdk: Arc<dyn ConferenceSdk>, emitter: EventEmitter<dyn MixerEventListener>) -> Self {
        Self {
            sdk,
            emitter,
            state: Arc::new(Mutex::new(ConferenceState::Idle)),
            in_flight: AtomicBool::new(false),
        }
    }

    pub async fn state(&self) -> ConferenceState {
        self.state.lock().await.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Join the configured conference live, as the mixer.
    pub async fn join(&self, settings: &MixerSettings) -> Result<ConferenceHandle, MixerError> {
        self.run(|| {
            Self::settings_plan(
                settings,
                Finish::Join(JoinOptions::mixer(settings.conference_access_token())),
            )
        })
        .await
    }

    /// Replay a recorded conference from the configured offset.
    pub async fn replay(&self, settings: &MixerSettings) -> Result<ConferenceHandle, MixerError> {
        self.run(|| {
            Self::settings_plan(
                settings,
                Finish::Replay(ReplayOptions {
                    conference_access_token: settings.conference_access_token(),
                    offset: settings.replay_offset,
                }),
            )
        })
        .await
    }

    /// Join with a client access token as the "Test" participant, for
    /// previewing a layout outside the mixer.
    pub async fn join_test_layout(
        &self,
        client_access_token: &str,
        conference_id: &str,
    ) -> Result<ConferenceHandle, MixerError> {
        self.run(|| {
            if client_access_token.trim().is_empty() {
                return Err(MixerError::InvalidSettings("client access token is empty".into()));
            }
            if conference_id.trim().is_empty() {
                return Err(MixerError::InvalidSettings("conference id is empty".into()));
            }
            Ok(Plan {
                access_token: client_access_token.to_string(),
                renewer: Arc::new(StaticTokenRenewer::new(client_access_token.to_string())),
                identity: MixerIdentity::test_layout(),
                conference_id: conference_id.to_string(),
                finish: Finish::Join(JoinOptions::test_layout()),
            })
        })
        .await
    }

    fn settings_plan(settings: &MixerSettings, finish: Finish) -> Result<Plan, MixerError> {
        settings.validate()?;
        let renewer = RefreshTokenRenewer::new(
            &settings.refresh_url,
            settings.access_token.clone(),
            settings.refresh_token.clone(),
        )?;
        Ok(Plan {
            access_token: settings.access_token.clone(),
            renewer: Arc::new(renewer),
            identity: MixerIdentity::mixer(&settings.layout_type, settings.third_party_id.clone()),
            conference_id: settings.conference_id.clone(),
            finish,
        })
    }

    async fn run<F>(&self, plan: F) -> Result<ConferenceHandle, MixerError>
    where
        F: FnOnce() -> Result<Plan, MixerError>,
    {
        let _guard = InFlight::acquire(&self.in_flight).inspect_err(|_| {
            tracing::warn!("ignoring join/replay request: pipeline busy");
        })?;

        let attempt = Uuid::new_v4();
        self.set_state(ConferenceState::Connecting).await;

        let result = match plan() {
            Ok(plan) => {
                let replaying = matches!(plan.finish, Finish::Replay(_));
                tracing::info!(
                    %attempt,
                    "starting {} of conference {} as {}",
                    if replaying { "replay" } else { "join" },
                    plan.conference_id,
                    plan.identity.external_id
                );
                self.stages(plan).await.map(|conference| (conference, replaying))
            }
            Err(e) => Err((PipelineStage::Settings, e)),
        };

        match result {
            Ok((conference, replaying)) => {
                let state = if replaying {
                    ConferenceState::Replaying
                } else {
                    ConferenceState::Joined
                };
                tracing::info!(%attempt, "conference {} {:?}", conference.id, state);
                self.set_state(state).await;
                Ok(conference)
            }
            Err((stage, err)) => {
                tracing::error!(%attempt, %stage, "conference pipeline failed: {err}");
                self.set_state(ConferenceState::Failed {
                    stage,
                    reason: err.to_string(),
                })
                .await;
                Err(err)
            }
        }
    }

    async fn stages(&self, plan: Plan) -> Result<ConferenceHandle, (PipelineStage, MixerError)> {
        let Plan {
            access_token,
            renewer,
            identity,
            conference_id,
            finish,
        } = plan;

        // Every pipeline registers the token and renewer of its own flow.
        self.sdk
            .initialize_token(access_token, renewer)
            .map_err(|e| (PipelineStage::TokenRegistration, MixerError::Token(e.to_string())))?;
        tracing::debug!("token provider registered");

        self.sdk
            .open_session(identity)
            .await
            .map_err(|e| (PipelineStage::SessionOpen, MixerError::Session(e.to_string())))?;

        let conference = self
            .sdk
            .fetch_conference(&conference_id)
            .await
            .map_err(|e| {
                let err = match e {
                    SdkError::NotFound(_) => MixerError::ConferenceNotFound(conference_id.clone()),
                    other => MixerError::ConferenceFetch(other.to_string()),
                };
                (PipelineStage::ConferenceFetch, err)
            })?;

        match finish {
            Finish::Join(options) => self
                .sdk
                .join(&conference, options)
                .await
                .map_err(|e| (PipelineStage::Join, MixerError::Join(e.to_string())))?,
            Finish::Replay(options) => self
                .sdk
                .replay(&conference, options, MixingOptions::enabled())
                .await
                .map_err(|e| (PipelineStage::Replay, MixerError::Replay(e.to_string())))?,
        }

        Ok(conference)
    }

    async fn set_state(&self, state: ConferenceState) {
        *self.state.lock().await = state.clone();
        self.emitter.emit(MixerEvent::ConferenceStateChanged(state));
    }
}
