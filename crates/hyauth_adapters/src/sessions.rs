use async_trait::async_trait;
use hyauth_core::config::Endpoints;
use hyauth_core::entities::{AccessCredential, GameSession, Profile, ProfileUuid};
use hyauth_core::ports::GameSessionService;
use hyauth_core::Error;
use reqwest::{header, Client};
use serde::Serialize;
use tracing::{info, instrument};

use crate::network::{endpoint, ensure_ok, read_json, transport};

/// Game session service client
pub struct HttpGameSessionService {
    client: Client,
    session_url: String,
}

impl HttpGameSessionService {
    pub fn new(client: Client, endpoints: &Endpoints) -> Self {
        Self {
            client,
            session_url: endpoints.session_url.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct NewSessionRequest<'a> {
    uuid: &'a ProfileUuid,
}

#[async_trait]
impl GameSessionService for HttpGameSessionService {
    #[instrument(skip_all, fields(profile = %profile.uuid))]
    async fn open(
        &self,
        credential: &AccessCredential,
        profile: &Profile,
    ) -> Result<GameSession, Error> {
        let response = self
            .client
            .post(endpoint(&self.session_url, "/game-session/new"))
            .header(header::ACCEPT, "application/json")
            .bearer_auth(credential.access_token.expose())
            .json(&NewSessionRequest {
                uuid: &profile.uuid,
            })
            .send()
            .await
            .map_err(transport("session request failed"))?;

        ensure_ok(&response)?;
        let session: GameSession = read_json(response, "session response").await?;

        info!(expires_at = %session.expires_at, "game session opened");
        Ok(session)
    }

    #[instrument(skip_all)]
    async fn refresh(&self, session: &GameSession) -> Result<(), Error> {
        let response = self
            .client
            .post(endpoint(&self.session_url, "/game-session/refresh"))
            .bearer_auth(session.session_token.expose())
            .send()
            .await
            .map_err(transport("session refresh failed"))?;

        ensure_ok(&response)
    }

    #[instrument(skip_all)]
    async fn terminate(&self, session: &GameSession) -> Result<(), Error> {
        let response = self
            .client
            .delete(endpoint(&self.session_url, "/game-session"))
            .bearer_auth(session.session_token.expose())
            .send()
            .await
            .map_err(transport("session termination failed"))?;

        ensure_ok(&response)
    }
}
