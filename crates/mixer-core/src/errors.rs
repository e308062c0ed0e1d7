use thiserror::Error;

/// Stage of a join/replay pipeline, used to report where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Settings,
    TokenRegistration,
    SessionOpen,
    ConferenceFetch,
    Join,
    Replay,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Settings => "settings",
            Self::TokenRegistration => "token registration",
            Self::SessionOpen => "session open",
            Self::ConferenceFetch => "conference fetch",
            Self::Join => "join",
            Self::Replay => "replay",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Error)]
pub enum MixerError {
    #[error("http error: {0}")]
    Http(String),
    #[error("token refresh failed: {0}")]
    TokenRefresh(String),
    #[error("token registration failed: {0}")]
    Token(String),
    #[error("session open failed: {0}")]
    Session(String),
    #[error("conference not found: {0}")]
    ConferenceNotFound(String),
    #[error("conference fetch failed: {0}")]
    ConferenceFetch(String),
    #[error("join failed: {0}")]
    Join(String),
    #[error("replay failed: {0}")]
    Replay(String),
    #[error("a join or replay is already in progress")]
    PipelineBusy,
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

/// Failure reported by a `ConferenceSdk` implementation.
#[derive(Debug, Clone, Error)]
pub enum SdkError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("transport: {0}")]
    Transport(String),
}
