//! In-memory port implementations for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::time::Instant;

use crate::entities::{
    AccessCredential, AccessToken, DeviceAuthorization, DeviceCode, GameSession, IdentityToken,
    OwnerId, Profile, ProfileSet, ProfileUuid, SessionRecord, SessionToken, UserCode,
};
use crate::error::Error;
use crate::ports::{
    DeviceAuthorizer, GameSessionService, PendingReason, PollAttempt, ProfileDirectory,
    SessionStore, VerificationPrompt,
};

pub(crate) fn authorization(interval: u64, expires_in: u64) -> DeviceAuthorization {
    DeviceAuthorization::new(
        DeviceCode::new("device-code-1"),
        UserCode::new("ABCD-EFGH"),
        "https://accounts.test/device".to_string(),
        Some("https://accounts.test/device?user_code=ABCD-EFGH".to_string()),
        expires_in,
        interval,
        Instant::now(),
    )
    .unwrap()
}

pub(crate) fn pending() -> Result<PollAttempt, Error> {
    Ok(PollAttempt::Pending(PendingReason::AuthorizationPending))
}

pub(crate) fn granted(token: &str) -> Result<PollAttempt, Error> {
    Ok(PollAttempt::Granted(AccessCredential::new(AccessToken::new(
        token,
    ))))
}

pub(crate) fn game_session(token: &str) -> GameSession {
    GameSession {
        session_token: SessionToken::new(token),
        identity_token: IdentityToken::new(format!("{token}-identity")),
        expires_at: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
    }
}

pub(crate) fn session_record(token: &str) -> SessionRecord {
    SessionRecord {
        owner: OwnerId::new("owner-1"),
        profile: Profile::new("profile-1", "steve"),
        session: game_session(token),
    }
}

/// Replays token endpoint responses; once the script runs out every attempt is pending.
pub(crate) struct ScriptedAuthorizer {
    code: Mutex<Option<Result<DeviceAuthorization, Error>>>,
    script: Mutex<VecDeque<Result<PollAttempt, Error>>>,
    exchanges: Mutex<Vec<Instant>>,
    latency: Option<Duration>,
}

impl ScriptedAuthorizer {
    pub(crate) fn new(script: Vec<Result<PollAttempt, Error>>) -> Self {
        Self {
            code: Mutex::new(None),
            script: Mutex::new(script.into()),
            exchanges: Mutex::new(Vec::new()),
            latency: None,
        }
    }

    pub(crate) fn with_code(self, code: Result<DeviceAuthorization, Error>) -> Self {
        *self.code.lock().unwrap() = Some(code);
        self
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub(crate) fn exchange_times(&self) -> Vec<Instant> {
        self.exchanges.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeviceAuthorizer for ScriptedAuthorizer {
    async fn request_code(&self) -> Result<DeviceAuthorization, Error> {
        self.code
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(authorization(5, 30)))
    }

    async fn exchange_device_code(&self, device_code: &DeviceCode) -> Result<PollAttempt, Error> {
        assert_eq!(device_code.expose(), "device-code-1");
        self.exchanges.lock().unwrap().push(Instant::now());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(pending)
    }
}

pub(crate) struct StaticProfiles {
    result: Mutex<Option<Result<ProfileSet, Error>>>,
    pub(crate) seen_tokens: Mutex<Vec<String>>,
}

impl StaticProfiles {
    pub(crate) fn new(owner: &str, profiles: Vec<Profile>) -> Self {
        Self::with_result(Ok(ProfileSet {
            owner: OwnerId::new(owner),
            profiles,
        }))
    }

    pub(crate) fn with_result(result: Result<ProfileSet, Error>) -> Self {
        Self {
            result: Mutex::new(Some(result)),
            seen_tokens: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ProfileDirectory for StaticProfiles {
    async fn fetch_profiles(&self, credential: &AccessCredential) -> Result<ProfileSet, Error> {
        self.seen_tokens
            .lock()
            .unwrap()
            .push(credential.access_token.expose().to_string());
        self.result
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(Error::Other("profiles fetched twice".to_string())))
    }
}

#[derive(Default)]
pub(crate) struct RecordingSessions {
    open_error: Mutex<Option<Error>>,
    refresh_results: Mutex<VecDeque<Result<(), Error>>>,
    terminate_results: Mutex<VecDeque<Result<(), Error>>>,
    pub(crate) opened: Mutex<Vec<(String, ProfileUuid)>>,
    pub(crate) refreshed: AtomicUsize,
    pub(crate) terminated: AtomicUsize,
}

impl RecordingSessions {
    pub(crate) fn failing_open(error: Error) -> Self {
        let sessions = Self::default();
        *sessions.open_error.lock().unwrap() = Some(error);
        sessions
    }

    pub(crate) fn with_refresh_result(self, result: Result<(), Error>) -> Self {
        self.refresh_results.lock().unwrap().push_back(result);
        self
    }

    pub(crate) fn with_terminate_result(self, result: Result<(), Error>) -> Self {
        self.terminate_results.lock().unwrap().push_back(result);
        self
    }

    pub(crate) fn open_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }
}

#[async_trait]
impl GameSessionService for RecordingSessions {
    async fn open(
        &self,
        credential: &AccessCredential,
        profile: &Profile,
    ) -> Result<GameSession, Error> {
        self.opened.lock().unwrap().push((
            credential.access_token.expose().to_string(),
            profile.uuid.clone(),
        ));
        if let Some(error) = self.open_error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(game_session("session-1"))
    }

    async fn refresh(&self, _session: &GameSession) -> Result<(), Error> {
        self.refreshed.fetch_add(1, Ordering::SeqCst);
        let next = self.refresh_results.lock().unwrap().pop_front();
        next.unwrap_or(Ok(()))
    }

    async fn terminate(&self, _session: &GameSession) -> Result<(), Error> {
        self.terminated.fetch_add(1, Ordering::SeqCst);
        let next = self.terminate_results.lock().unwrap().pop_front();
        next.unwrap_or(Ok(()))
    }
}

#[derive(Default)]
pub(crate) struct RecordingPrompt {
    pub(crate) shown: Mutex<Vec<String>>,
}

impl VerificationPrompt for RecordingPrompt {
    fn present(&self, authorization: &DeviceAuthorization) {
        self.shown
            .lock()
            .unwrap()
            .push(authorization.prompt_uri().to_string());
    }
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    pub(crate) record: Mutex<Option<SessionRecord>>,
    pub(crate) cleared: AtomicUsize,
}

impl MemoryStore {
    pub(crate) fn holding(record: SessionRecord) -> Self {
        let store = Self::default();
        *store.record.lock().unwrap() = Some(record);
        store
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn save(&self, record: &SessionRecord) -> Result<(), Error> {
        *self.record.lock().unwrap() = Some(record.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<SessionRecord>, Error> {
        Ok(self.record.lock().unwrap().clone())
    }

    async fn clear(&self) -> Result<(), Error> {
        self.cleared.fetch_add(1, Ordering::SeqCst);
        *self.record.lock().unwrap() = None;
        Ok(())
    }
}
