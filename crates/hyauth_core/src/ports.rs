use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::entities::{
    AccessCredential, DeviceAuthorization, DeviceCode, GameSession, Profile, ProfileSet,
    SessionRecord,
};
use crate::error::Error;

// ============================================================================
// Device Authorization
// ============================================================================

/// Why the token endpoint asked us to keep waiting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingReason {
    /// User has not approved yet
    AuthorizationPending,
    /// Server wants a longer poll interval
    SlowDown,
    /// Any other structured 400 error code
    Other(String),
}

/// Outcome of a single token request
#[derive(Debug, Clone)]
pub enum PollAttempt {
    Granted(AccessCredential),
    Pending(PendingReason),
}

/// OAuth device authorization grant against the account server
#[async_trait]
pub trait DeviceAuthorizer: Send + Sync {
    /// Request a fresh device/user code pair. Single attempt.
    async fn request_code(&self) -> Result<DeviceAuthorization, Error>;

    /// Exchange the device code once.
    ///
    /// Recoverable 400 responses come back as `PollAttempt::Pending`; anything
    /// terminal is an error.
    async fn exchange_device_code(&self, device_code: &DeviceCode) -> Result<PollAttempt, Error>;

    /// Poll until granted, failed, expired or cancelled
    async fn poll_for_token(
        &self,
        authorization: &DeviceAuthorization,
        cancel: &CancellationToken,
    ) -> Result<AccessCredential, Error> {
        crate::device_flow::poll_for_token(self, authorization, cancel).await
    }
}

/// Shows the verification URL to the user
pub trait VerificationPrompt: Send + Sync {
    fn present(&self, authorization: &DeviceAuthorization);
}

// ============================================================================
// Profiles & Sessions
// ============================================================================

#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Profiles owned by the account behind `credential`. An empty list is not an error here.
    async fn fetch_profiles(&self, credential: &AccessCredential) -> Result<ProfileSet, Error>;
}

/// Picks which profile to play as
pub trait ProfileSelector: Send + Sync {
    fn select<'a>(&self, profiles: &'a [Profile]) -> Result<&'a Profile, Error>;
}

#[async_trait]
pub trait GameSessionService: Send + Sync {
    /// Open a session for exactly one profile
    async fn open(
        &self,
        credential: &AccessCredential,
        profile: &Profile,
    ) -> Result<GameSession, Error>;

    /// Extend the session on the server. The local value is never touched.
    async fn refresh(&self, session: &GameSession) -> Result<(), Error>;

    /// End the session. The token must not be reused afterwards.
    async fn terminate(&self, session: &GameSession) -> Result<(), Error>;
}

/// Persistence for the most recent session record
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save(&self, record: &SessionRecord) -> Result<(), Error>;

    async fn load(&self) -> Result<Option<SessionRecord>, Error>;

    async fn clear(&self) -> Result<(), Error>;
}
