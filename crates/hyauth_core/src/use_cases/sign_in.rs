use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::entities::{Profile, ProfileSet, SessionRecord};
use crate::error::{Error, SignInError, Stage};
use crate::ports::{
    DeviceAuthorizer, GameSessionService, ProfileDirectory, ProfileSelector, VerificationPrompt,
};

/// Plays as the first profile the server lists
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstProfile;

impl ProfileSelector for FirstProfile {
    fn select<'a>(&self, profiles: &'a [Profile]) -> Result<&'a Profile, Error> {
        profiles.first().ok_or(Error::NoProfiles)
    }
}

/// Plays as the profile with the given username (case-insensitive)
#[derive(Debug, Clone)]
pub struct ProfileByUsername(pub String);

impl ProfileSelector for ProfileByUsername {
    fn select<'a>(&self, profiles: &'a [Profile]) -> Result<&'a Profile, Error> {
        profiles
            .iter()
            .find(|p| p.username.eq_ignore_ascii_case(&self.0))
            .ok_or_else(|| Error::NoMatchingProfile(self.0.clone()))
    }
}

/// Orchestrates the complete sign-in flow:
/// - Device code request and user prompt
/// - Token polling until approval or expiry
/// - Profile lookup and selection
/// - Game session creation
///
/// Fails fast: the first failing stage aborts the flow and is reported in the error.
pub struct SignInUseCase<D, P, S>
where
    D: DeviceAuthorizer,
    P: ProfileDirectory,
    S: GameSessionService,
{
    authorizer: Arc<D>,
    profiles: Arc<P>,
    sessions: Arc<S>,
    selector: Box<dyn ProfileSelector>,
}

impl<D, P, S> SignInUseCase<D, P, S>
where
    D: DeviceAuthorizer,
    P: ProfileDirectory,
    S: GameSessionService,
{
    pub fn new(authorizer: Arc<D>, profiles: Arc<P>, sessions: Arc<S>) -> Self {
        Self {
            authorizer,
            profiles,
            sessions,
            selector: Box::new(FirstProfile),
        }
    }

    pub fn with_selector(mut self, selector: impl ProfileSelector + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    /// Run the flow end to end and return the record to hand to the launcher.
    ///
    /// `cancel` aborts the wait for user approval.
    #[instrument(skip_all)]
    pub async fn execute(
        &self,
        prompt: &dyn VerificationPrompt,
        cancel: &CancellationToken,
    ) -> Result<SessionRecord, SignInError> {
        let authorization = self
            .authorizer
            .request_code()
            .await
            .map_err(|e| SignInError::new(Stage::RequestCode, e))?;

        info!(user_code = %authorization.user_code, "device code issued");
        prompt.present(&authorization);

        let credential = self
            .authorizer
            .poll_for_token(&authorization, cancel)
            .await
            .map_err(|e| SignInError::new(Stage::PollForToken, e))?;

        let ProfileSet { owner, profiles } = self
            .profiles
            .fetch_profiles(&credential)
            .await
            .map_err(|e| SignInError::new(Stage::FetchProfiles, e))?;

        if profiles.is_empty() {
            return Err(SignInError::new(Stage::SelectProfile, Error::NoProfiles));
        }

        let profile = self
            .selector
            .select(&profiles)
            .map_err(|e| SignInError::new(Stage::SelectProfile, e))?
            .clone();

        info!(owner = %owner, profile = %profile.username, "opening game session");

        let session = self
            .sessions
            .open(&credential, &profile)
            .await
            .map_err(|e| SignInError::new(Stage::OpenSession, e))?;

        Ok(SessionRecord {
            owner,
            profile,
            session,
        })
    }
}
