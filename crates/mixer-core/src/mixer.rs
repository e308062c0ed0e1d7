use std::sync::Arc;

use crate::conference::ConferenceController;
use crate::errors::MixerError;
use crate::events::{ConferenceState, EventEmitter, ListenerId, MixerEventListener};
use crate::sdk::{ConferenceHandle, ConferenceSdk, Subscription};
use crate::settings::MixerSettings;
use crate::view::{ConferenceView, ViewState};

/// A layout page bound to one SDK instance.
///
/// `start` subscribes the view to SDK events and raises the "started"
/// marker; `shutdown` (or drop) removes the subscription again.
pub struct MixerApp {
    settings: MixerSettings,
    emitter: EventEmitter<dyn MixerEventListener>,
    view: Arc<ConferenceView>,
    controller: ConferenceController,
    subscription: Subscription,
}

impl MixerApp {
    pub fn start(sdk: Arc<dyn ConferenceSdk>, settings: MixerSettings) -> Self {
        let emitter: EventEmitter<dyn MixerEventListener> = EventEmitter::new();
        let view = Arc::new(ConferenceView::new(emitter.clone()));
        if settings.is_live_layout() {
            view.show_live_indicator();
        }
        view.mark_started();

        let subscription = Subscription::new(sdk.clone(), view.clone());
        let controller = ConferenceController::new(sdk, emitter.clone());
        tracing::info!("mixer layout '{}' ready", settings.layout_type);

        Self {
            settings,
            emitter,
            view,
            controller,
            subscription,
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn MixerEventListener>) -> ListenerId {
        self.emitter.add_listener(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.emitter.remove_listener(id)
    }

    pub fn settings(&self) -> &MixerSettings {
        &self.settings
    }

    pub async fn join(&self) -> Result<ConferenceHandle, MixerError> {
        self.controller.join(&self.settings).await
    }

    pub async fn replay(&self) -> Result<ConferenceHandle, MixerError> {
        self.controller.replay(&self.settings).await
    }

    pub async fn join_test_layout(
        &self,
        client_access_token: &str,
    ) -> Result<ConferenceHandle, MixerError> {
        self.controller
            .join_test_layout(client_access_token, &self.settings.conference_id)
            .await
    }

    pub async fn conference_state(&self) -> ConferenceState {
        self.controller.state().await
    }

    pub fn view_snapshot(&self) -> ViewState {
        self.view.snapshot()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_active()
    }

    /// Stop reacting to SDK events.
    pub fn shutdown(&mut self) {
        self.subscription.unsubscribe();
        tracing::info!("mixer layout shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{MediaStream, MixerEvent, Participant, SdkEvent, StreamKind};
    use crate::test_support::{FakeSdk, RecordingView, SdkCall};
    use crate::view::ConferenceMarker;

    fn settings(layout: &str) -> MixerSettings {
        MixerSettings {
            access_token: "T1".into(),
            refresh_token: "R1".into(),
            refresh_url: "https://auth.example.com/refresh".into(),
            conference_id: "C1".into(),
            layout_type: layout.into(),
            ..Default::default()
        }
    }

    fn camera_added(id: &str) -> SdkEvent {
        SdkEvent::StreamAdded {
            participant: Participant { id: id.into(), name: format!("Guest {id}") },
            stream: MediaStream { id: format!("s-{id}"), kind: StreamKind::Camera, video_tracks: 1 },
        }
    }

    #[test]
    fn start_marks_ready_and_subscribes() {
        let sdk = Arc::new(FakeSdk::new());
        let app = MixerApp::start(sdk.clone(), settings("record"));

        assert!(app.is_subscribed());
        assert_eq!(sdk.listener_count(), 1);
        let snap = app.view_snapshot();
        assert_eq!(snap.marker(), Some(ConferenceMarker::Started));
        assert!(!snap.has_live_indicator());
    }

    #[test]
    fn live_layouts_show_indicator() {
        let sdk = Arc::new(FakeSdk::new());
        assert!(MixerApp::start(sdk.clone(), settings("hls")).view_snapshot().has_live_indicator());
        assert!(MixerApp::start(sdk, settings("stream")).view_snapshot().has_live_indicator());
    }

    #[test]
    fn end_delivered_during_subscribe_is_kept() {
        let sdk = Arc::new(FakeSdk::new());
        sdk.deliver_on_subscribe(SdkEvent::ConferenceEnded);
        let app = MixerApp::start(sdk.clone(), settings("hls"));

        let snap = app.view_snapshot();
        assert_eq!(snap.marker(), Some(ConferenceMarker::Ended));
        assert!(snap.has_live_indicator());
    }

    #[test]
    fn sdk_events_reach_view_until_shutdown() {
        let sdk = Arc::new(FakeSdk::new());
        let mut app = MixerApp::start(sdk.clone(), settings("record"));
        let recorder = Arc::new(RecordingView::default());
        app.add_listener(recorder.clone());

        sdk.emit(camera_added("01"));
        sdk.emit(camera_added("02"));
        assert_eq!(app.view_snapshot().participant_count(), 2);

        app.shutdown();
        assert!(!app.is_subscribed());
        assert_eq!(sdk.listener_count(), 0);

        sdk.emit(camera_added("03"));
        sdk.emit(SdkEvent::ConferenceEnded);
        let snap = app.view_snapshot();
        assert_eq!(snap.participant_count(), 2);
        assert_eq!(snap.marker(), Some(ConferenceMarker::Started));
        assert!(!recorder.events().contains(&MixerEvent::ConferenceEnded));
    }

    #[test]
    fn dropping_app_releases_sdk_listener() {
        let sdk = Arc::new(FakeSdk::new());
        let other = Arc::new(RecordingView::default());
        sdk.add_listener(other.clone());
        {
            let _app = MixerApp::start(sdk.clone(), settings("record"));
            assert_eq!(sdk.listener_count(), 2);
        }
        assert_eq!(sdk.listener_count(), 1);

        sdk.emit(SdkEvent::ConferenceLeft);
        assert_eq!(other.sdk_event_count(), 1);
    }

    #[tokio::test]
    async fn join_then_conference_ends() {
        let sdk = Arc::new(FakeSdk::new());
        let app = MixerApp::start(sdk.clone(), settings("record"));
        let recorder = Arc::new(RecordingView::default());
        app.add_listener(recorder.clone());

        app.join().await.unwrap();
        assert_eq!(app.conference_state().await, ConferenceState::Joined);

        sdk.emit(SdkEvent::ConferenceLeft);
        assert_eq!(app.view_snapshot().marker(), Some(ConferenceMarker::Ended));
        assert_eq!(recorder.events().last(), Some(&MixerEvent::ConferenceEnded));
    }

    #[tokio::test]
    async fn test_layout_targets_configured_conference() {
        let sdk = Arc::new(FakeSdk::new());
        let app = MixerApp::start(sdk.clone(), settings("record"));

        app.join_test_layout("CLIENT").await.unwrap();
        assert!(sdk.calls().contains(&SdkCall::Fetch("C1".into())));
    }
}
