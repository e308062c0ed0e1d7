//! Mixer layout core.
//!
//! Token renewal, the join/replay pipelines and the view model a mixer
//! layout page renders. The conferencing SDK itself sits behind
//! [`ConferenceSdk`]; native shells supply the binding.

pub mod auth;
pub mod conference;
pub mod errors;
pub mod events;
pub mod logging;
pub mod mixer;
pub mod sdk;
pub mod settings;
pub mod view;

#[cfg(test)]
mod test_support;

pub use auth::{RefreshTokenRenewer, StaticTokenRenewer, TokenRenewer};
pub use conference::ConferenceController;
pub use errors::{MixerError, PipelineStage, SdkError};
pub use events::{
    ConferenceState, EventEmitter, ListenerId, MediaStream, MixerEvent, MixerEventListener,
    Participant, SdkEvent, SdkEventListener, StreamKind, VideoPresentation,
};
pub use logging::init_logging;
pub use mixer::MixerApp;
pub use sdk::{
    ConferenceHandle, ConferenceSdk, JoinOptions, MediaConstraints, MixerIdentity, MixingOptions,
    ReplayOptions, Subscription,
};
pub use settings::MixerSettings;
pub use view::{ConferenceMarker, ConferenceView, PlaybackState, ViewState};
