use std::sync::{Arc, RwLock};
use std::time::Duration;

use uuid::Uuid;

use crate::errors::PipelineStage;

/// A conference participant as reported by the SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Camera,
    ScreenShare,
}

/// A media stream as reported by the SDK. Only the shape needed by the view
/// is carried; the media itself stays inside the SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaStream {
    pub id: String,
    pub kind: StreamKind,
    pub video_tracks: usize,
}

impl MediaStream {
    pub fn has_video(&self) -> bool {
        self.video_tracks > 0
    }

    pub fn is_screen_share(&self) -> bool {
        self.kind == StreamKind::ScreenShare
    }
}

/// Payload of a video presentation event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoPresentation {
    pub url: String,
    pub timestamp_ms: u64,
}

impl VideoPresentation {
    pub fn position(&self) -> Duration {
        Duration::from_millis(self.timestamp_ms)
    }
}

/// Events emitted by the conferencing SDK.
#[derive(Debug, Clone)]
pub enum SdkEvent {
    ConferenceLeft,
    ConferenceEnded,
    StreamAdded { participant: Participant, stream: MediaStream },
    StreamUpdated { participant: Participant, stream: MediaStream },
    StreamRemoved { participant: Participant, stream: MediaStream },
    PresentationStarted(VideoPresentation),
    PresentationPaused,
    PresentationPlayed,
    PresentationSought(VideoPresentation),
    PresentationStopped,
}

/// Lifecycle of the join/replay pipeline, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConferenceState {
    Idle,
    Connecting,
    Joined,
    Replaying,
    Failed { stage: PipelineStage, reason: String },
}

/// Events emitted by the core to rendering shells.
#[derive(Debug, Clone, PartialEq)]
pub enum MixerEvent {
    ConferenceStateChanged(ConferenceState),
    ParticipantNodeAdded { participant_id: String, name: String },
    StreamAttached { participant_id: String, stream_id: String },
    NameBannerRemoved { participant_id: String },
    ParticipantNodeRemoved(String), // participant id
    ScreenShareAttached { stream_id: String },
    ScreenShareRemoved,
    PlayerStarted { url: String, position: Duration },
    PlayerSought(Duration),
    PlayerPaused,
    PlayerPlayed,
    PlayerRemoved,
    ConferenceEnded,
}

/// Trait for receiving events from the core.
/// Implementations must be Send + Sync (called from tokio tasks).
pub trait MixerEventListener: Send + Sync {
    fn on_event(&self, event: MixerEvent);
}

/// Trait for receiving events from the SDK.
pub trait SdkEventListener: Send + Sync {
    fn on_sdk_event(&self, event: SdkEvent);
}

/// Identifies a registered listener so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Event emitter that dispatches to registered listeners.
///
/// Listeners are snapshotted before dispatch, so a listener may add or
/// remove listeners from inside its callback.
pub struct EventEmitter<L: ?Sized> {
    listeners: Arc<RwLock<Vec<(ListenerId, Arc<L>)>>>,
}

impl<L: ?Sized> Clone for EventEmitter<L> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
        }
    }
}

impl<L: ?Sized> Default for EventEmitter<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ?Sized> EventEmitter<L> {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn add_listener(&self, listener: Arc<L>) -> ListenerId {
        let id = ListenerId::new();
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, listener));
        id
    }

    /// Returns false when the id was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn snapshot(&self) -> Vec<Arc<L>> {
        self.listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, l)| l.clone())
            .collect()
    }
}

impl EventEmitter<dyn MixerEventListener> {
    pub fn emit(&self, event: MixerEvent) {
        for listener in self.snapshot() {
            listener.on_event(event.clone());
        }
    }
}

impl EventEmitter<dyn SdkEventListener> {
    pub fn emit(&self, event: SdkEvent) {
        for listener in self.snapshot() {
            listener.on_sdk_event(event.clone());
        }
    }
}
