use std::fmt;

use thiserror::Error;

/// Stage of the sign-in flow a failure originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RequestCode,
    PollForToken,
    FetchProfiles,
    SelectProfile,
    OpenSession,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestCode => write!(f, "device code request"),
            Self::PollForToken => write!(f, "waiting for token"),
            Self::FetchProfiles => write!(f, "profile lookup"),
            Self::SelectProfile => write!(f, "profile selection"),
            Self::OpenSession => write!(f, "game session creation"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status code: {0}")]
    UnexpectedStatus(u16),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("device code expired")]
    DeviceCodeExpired,

    #[error("authorization denied by user")]
    AccessDenied,

    #[error("no profiles found")]
    NoProfiles,

    #[error("no profile matching {0}")]
    NoMatchingProfile(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("no stored game session")]
    NoStoredSession,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// A sign-in failure, tagged with the stage that aborted the flow
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct SignInError {
    pub stage: Stage,
    #[source]
    pub source: Error,
}

impl SignInError {
    pub fn new(stage: Stage, source: Error) -> Self {
        Self { stage, source }
    }

    /// Whether the user gave up or the code ran out, as opposed to a server fault
    pub fn is_user_recoverable(&self) -> bool {
        matches!(
            self.source,
            Error::DeviceCodeExpired | Error::AccessDenied | Error::Cancelled
        )
    }
}
