use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use uuid::Uuid;

use crate::events::{
    EventEmitter, MixerEvent, MixerEventListener, Participant, SdkEvent, SdkEventListener,
    VideoPresentation,
};

/// How long the participant name banner stays on a new tile.
pub const NAME_BANNER_TTL: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameBanner {
    id: Uuid,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantNode {
    pub participant_id: String,
    pub name: String,
    /// Stream currently attached to the tile's video element.
    pub stream_id: Option<String>,
    pub banner: Option<NameBanner>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenShareNode {
    pub stream_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoPlayerNode {
    pub url: String,
    pub position: Duration,
    pub state: PlaybackState,
}

/// Markers the mixer watches to know when to start and stop capturing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConferenceMarker {
    Started,
    Ended,
}

/// Everything the layout page displays.
///
/// Holds at most one node per participant id and at most one screen share
/// and video player node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    participants: Vec<ParticipantNode>,
    screen_share: Option<ScreenShareNode>,
    player: Option<VideoPlayerNode>,
    marker: Option<ConferenceMarker>,
    live_indicator: bool,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the node for `participant` unless it exists.
    /// Returns the banner id when a node was created.
    pub fn ensure_participant(&mut self, participant: &Participant) -> Option<Uuid> {
        if self.participant(&participant.id).is_some() {
            return None;
        }
        let banner_id = Uuid::new_v4();
        self.participants.push(ParticipantNode {
            participant_id: participant.id.clone(),
            name: participant.name.clone(),
            stream_id: None,
            banner: Some(NameBanner {
                id: banner_id,
                text: participant.name.clone(),
            }),
        });
        Some(banner_id)
    }

    pub fn attach_stream(&mut self, participant_id: &str, stream_id: &str) -> bool {
        match self.participant_mut(participant_id) {
            Some(node) => {
                node.stream_id = Some(stream_id.to_string());
                true
            }
            None => false,
        }
    }

    pub fn remove_participant(&mut self, participant_id: &str) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| p.participant_id != participant_id);
        self.participants.len() != before
    }

    /// Remove a specific banner. A banner that is already gone, or that
    /// belongs to an earlier node for the same participant, is left alone.
    pub fn remove_banner(&mut self, participant_id: &str, banner_id: Uuid) -> bool {
        match self.participant_mut(participant_id) {
            Some(node) if node.banner.as_ref().is_some_and(|b| b.id == banner_id) => {
                node.banner = None;
                true
            }
            _ => false,
        }
    }

    pub fn participant(&self, participant_id: &str) -> Option<&ParticipantNode> {
        self.participants
            .iter()
            .find(|p| p.participant_id == participant_id)
    }

    fn participant_mut(&mut self, participant_id: &str) -> Option<&mut ParticipantNode> {
        self.participants
            .iter_mut()
            .find(|p| p.participant_id == participant_id)
    }

    pub fn participants(&self) -> &[ParticipantNode] {
        &self.participants
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn attach_screen_share(&mut self, stream_id: &str) {
        self.screen_share = Some(ScreenShareNode {
            stream_id: stream_id.to_string(),
        });
    }

    pub fn remove_screen_share(&mut self) -> bool {
        self.screen_share.take().is_some()
    }

    pub fn screen_share(&self) -> Option<&ScreenShareNode> {
        self.screen_share.as_ref()
    }

    /// Replaces any existing player.
    pub fn start_player(&mut self, url: &str, position: Duration) {
        self.player = Some(VideoPlayerNode {
            url: url.to_string(),
            position,
            state: PlaybackState::Playing,
        });
    }

    pub fn seek_player(&mut self, position: Duration) -> bool {
        match self.player.as_mut() {
            Some(player) => {
                player.position = position;
                true
            }
            None => false,
        }
    }

    pub fn set_playback(&mut self, state: PlaybackState) -> bool {
        match self.player.as_mut() {
            Some(player) => {
                player.state = state;
                true
            }
            None => false,
        }
    }

    pub fn remove_player(&mut self) -> bool {
        self.player.take().is_some()
    }

    pub fn player(&self) -> Option<&VideoPlayerNode> {
        self.player.as_ref()
    }

    pub fn mark_started(&mut self) {
        self.marker = Some(ConferenceMarker::Started);
    }

    /// Returns false if the conference was already marked as ended.
    pub fn mark_ended(&mut self) -> bool {
        let changed = self.marker != Some(ConferenceMarker::Ended);
        self.marker = Some(ConferenceMarker::Ended);
        changed
    }

    pub fn marker(&self) -> Option<ConferenceMarker> {
        self.marker
    }

    pub fn show_live_indicator(&mut self) {
        self.live_indicator = true;
    }

    pub fn has_live_indicator(&self) -> bool {
        self.live_indicator
    }
}

/// Reacts to SDK events by updating the [`ViewState`] and publishing each
/// change as a [`MixerEvent`].
pub struct ConferenceView {
    state: Arc<Mutex<ViewState>>,
    emitter: EventEmitter<dyn MixerEventListener>,
    banner_ttl: Duration,
}

impl ConferenceView {
    pub fn new(emitter: EventEmitter<dyn MixerEventListener>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ViewState::new())),
            emitter,
            banner_ttl: NAME_BANNER_TTL,
        }
    }

    pub fn snapshot(&self) -> ViewState {
        self.lock().clone()
    }

    pub fn mark_started(&self) {
        self.lock().mark_started();
    }

    pub fn show_live_indicator(&self) {
        self.lock().show_live_indicator();
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn handle(&self, event: SdkEvent) {
        let mut out = Vec::new();
        match event {
            SdkEvent::StreamAdded { participant, stream } => {
                tracing::info!("streamAdded from {} ({})", participant.name, participant.id);
                if stream.is_screen_share() {
                    self.lock().attach_screen_share(&stream.id);
                    out.push(MixerEvent::ScreenShareAttached { stream_id: stream.id });
                } else if stream.has_video() {
                    self.add_video_node(&participant, &stream.id, &mut out);
                }
            }

            SdkEvent::StreamUpdated { participant, stream } => {
                tracing::info!("streamUpdated from {} ({})", participant.name, participant.id);
                if stream.is_screen_share() {
                    return;
                }
                if stream.has_video() {
                    self.add_video_node(&participant, &stream.id, &mut out);
                } else if self.lock().remove_participant(&participant.id) {
                    out.push(MixerEvent::ParticipantNodeRemoved(participant.id));
                }
            }

            SdkEvent::StreamRemoved { participant, stream } => {
                tracing::info!("streamRemoved from {} ({})", participant.name, participant.id);
                if stream.is_screen_share() {
                    if self.lock().remove_screen_share() {
                        out.push(MixerEvent::ScreenShareRemoved);
                    }
                } else if self.lock().remove_participant(&participant.id) {
                    out.push(MixerEvent::ParticipantNodeRemoved(participant.id));
                }
            }

            SdkEvent::PresentationStarted(VideoPresentation { url, timestamp_ms }) => {
                tracing::info!("videoPresentation started {url}");
                let position = Duration::from_millis(timestamp_ms);
                self.lock().start_player(&url, position);
                out.push(MixerEvent::PlayerStarted { url, position });
            }

            SdkEvent::PresentationPaused => {
                tracing::info!("videoPresentation paused");
                if self.lock().set_playback(PlaybackState::Paused) {
                    out.push(MixerEvent::PlayerPaused);
                } else {
                    tracing::debug!("pause ignored: no video player");
                }
            }

            SdkEvent::PresentationPlayed => {
                tracing::info!("videoPresentation played");
                if self.lock().set_playback(PlaybackState::Playing) {
                    out.push(MixerEvent::PlayerPlayed);
                } else {
                    tracing::debug!("play ignored: no video player");
                }
            }

            SdkEvent::PresentationSought(vp) => {
                tracing::info!("videoPresentation sought");
                let position = vp.position();
                if self.lock().seek_player(position) {
                    out.push(MixerEvent::PlayerSought(position));
                } else {
                    tracing::debug!("seek ignored: no video player");
                }
            }

            SdkEvent::PresentationStopped => {
                tracing::info!("videoPresentation stopped");
                if self.lock().remove_player() {
                    out.push(MixerEvent::PlayerRemoved);
                }
            }

            ended @ (SdkEvent::ConferenceLeft | SdkEvent::ConferenceEnded) => {
                tracing::info!("conference over: {ended:?}");
                if self.lock().mark_ended() {
                    out.push(MixerEvent::ConferenceEnded);
                }
            }
        }

        for event in out {
            self.emitter.emit(event);
        }
    }

    fn add_video_node(&self, participant: &Participant, stream_id: &str, out: &mut Vec<MixerEvent>) {
        let banner_id = {
            let mut state = self.lock();
            let banner_id = state.ensure_participant(participant);
            state.attach_stream(&participant.id, stream_id);
            banner_id
        };

        if let Some(banner_id) = banner_id {
            out.push(MixerEvent::ParticipantNodeAdded {
                participant_id: participant.id.clone(),
                name: participant.name.clone(),
            });
            self.schedule_banner_removal(participant.id.clone(), banner_id);
        }
        out.push(MixerEvent::StreamAttached {
            participant_id: participant.id.clone(),
            stream_id: stream_id.to_string(),
        });
    }

    // Not cancelled when the participant leaves early; removal of a missing
    // banner is a no-op.
    fn schedule_banner_removal(&self, participant_id: String, banner_id: Uuid) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("no runtime, name banner for {participant_id} kept");
            return;
        };

        let state = self.state.clone();
        let emitter = self.emitter.clone();
        let ttl = self.banner_ttl;
        runtime.spawn(async move {
            tokio::time::sleep(ttl).await;
            let removed = state
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove_banner(&participant_id, banner_id);
            if removed {
                tracing::debug!("name banner removed for {participant_id}");
                emitter.emit(MixerEvent::NameBannerRemoved { participant_id });
            }
        });
    }
}

impl SdkEventListener for ConferenceView {
    fn on_sdk_event(&self, event: SdkEvent) {
        self.handle(event);
    }
}
