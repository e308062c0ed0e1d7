//! In-memory SDK and listener doubles for unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::auth::TokenRenewer;
use crate::errors::SdkError;
use crate::events::{
    EventEmitter, ListenerId, MixerEvent, MixerEventListener, SdkEvent, SdkEventListener,
};
use crate::sdk::{
    ConferenceHandle, ConferenceSdk, JoinOptions, MixerIdentity, MixingOptions, ReplayOptions,
};

#[derive(Debug, Clone, PartialEq)]
pub enum SdkCall {
    InitializeToken(String),
    OpenSession(MixerIdentity),
    Fetch(String),
    Join(String, JoinOptions),
    Replay(String, ReplayOptions, MixingOptions),
}

#[derive(Default)]
struct Failures {
    token: Option<SdkError>,
    session: Option<SdkError>,
    fetch: Option<SdkError>,
    join: Option<SdkError>,
    replay: Option<SdkError>,
}

/// Records every call and lets tests inject failures and SDK events.
pub struct FakeSdk {
    calls: Mutex<Vec<SdkCall>>,
    failures: Mutex<Failures>,
    session_gate: Mutex<Option<Arc<Notify>>>,
    renewer: Mutex<Option<Arc<dyn TokenRenewer>>>,
    on_subscribe: Mutex<Vec<SdkEvent>>,
    events: EventEmitter<dyn SdkEventListener>,
}

impl FakeSdk {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(Failures::default()),
            session_gate: Mutex::new(None),
            renewer: Mutex::new(None),
            on_subscribe: Mutex::new(Vec::new()),
            events: EventEmitter::new(),
        }
    }

    pub fn calls(&self) -> Vec<SdkCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn renewer(&self) -> Option<Arc<dyn TokenRenewer>> {
        self.renewer.lock().unwrap().clone()
    }

    pub fn fail_token(&self, err: SdkError) {
        self.failures.lock().unwrap().token = Some(err);
    }

    pub fn fail_session(&self, err: SdkError) {
        self.failures.lock().unwrap().session = Some(err);
    }

    pub fn fail_fetch(&self, err: SdkError) {
        self.failures.lock().unwrap().fetch = Some(err);
    }

    pub fn fail_join(&self, err: SdkError) {
        self.failures.lock().unwrap().join = Some(err);
    }

    pub fn fail_replay(&self, err: SdkError) {
        self.failures.lock().unwrap().replay = Some(err);
    }

    /// Make `open_session` wait until the returned notify fires.
    pub fn hold_session_open(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.session_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Hand `event` to the next listener as soon as it subscribes.
    pub fn deliver_on_subscribe(&self, event: SdkEvent) {
        self.on_subscribe.lock().unwrap().push(event);
    }

    pub fn emit(&self, event: SdkEvent) {
        self.events.emit(event);
    }

    pub fn listener_count(&self) -> usize {
        self.events.listener_count()
    }

    fn record(&self, call: SdkCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ConferenceSdk for FakeSdk {
    fn initialize_token(
        &self,
        access_token: String,
        renewer: Arc<dyn TokenRenewer>,
    ) -> Result<(), SdkError> {
        if let Some(err) = self.failures.lock().unwrap().token.clone() {
            return Err(err);
        }
        self.record(SdkCall::InitializeToken(access_token));
        *self.renewer.lock().unwrap() = Some(renewer);
        Ok(())
    }

    async fn open_session(&self, identity: MixerIdentity) -> Result<(), SdkError> {
        self.record(SdkCall::OpenSession(identity));
        let gate = self.session_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.failures.lock().unwrap().session.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn fetch_conference(&self, conference_id: &str) -> Result<ConferenceHandle, SdkError> {
        self.record(SdkCall::Fetch(conference_id.to_string()));
        match self.failures.lock().unwrap().fetch.clone() {
            Some(err) => Err(err),
            None => Ok(ConferenceHandle {
                id: conference_id.to_string(),
            }),
        }
    }

    async fn join(
        &self,
        conference: &ConferenceHandle,
        options: JoinOptions,
    ) -> Result<(), SdkError> {
        self.record(SdkCall::Join(conference.id.clone(), options));
        match self.failures.lock().unwrap().join.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn replay(
        &self,
        conference: &ConferenceHandle,
        options: ReplayOptions,
        mixing: MixingOptions,
    ) -> Result<(), SdkError> {
        self.record(SdkCall::Replay(conference.id.clone(), options, mixing));
        match self.failures.lock().unwrap().replay.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn add_listener(&self, listener: Arc<dyn SdkEventListener>) -> ListenerId {
        let id = self.events.add_listener(listener.clone());
        let pending = std::mem::take(&mut *self.on_subscribe.lock().unwrap());
        for event in pending {
            listener.on_sdk_event(event);
        }
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.events.remove_listener(id);
    }
}

/// Captures everything it is handed.
#[derive(Default)]
pub struct RecordingView {
    events: Mutex<Vec<MixerEvent>>,
    sdk_events: Mutex<Vec<SdkEvent>>,
}

impl RecordingView {
    pub fn events(&self) -> Vec<MixerEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn sdk_event_count(&self) -> usize {
        self.sdk_events.lock().unwrap().len()
    }
}

impl MixerEventListener for RecordingView {
    fn on_event(&self, event: MixerEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl SdkEventListener for RecordingView {
    fn on_sdk_event(&self, event: SdkEvent) {
        self.sdk_events.lock().unwrap().push(event);
    }
}
