use async_trait::async_trait;
use hyauth_core::config::Endpoints;
use hyauth_core::entities::{AccessCredential, OwnerId, Profile, ProfileSet};
use hyauth_core::ports::ProfileDirectory;
use hyauth_core::Error;
use reqwest::{header, Client};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::network::{endpoint, ensure_ok, read_json, transport};

/// Account data service client
pub struct HttpProfileDirectory {
    client: Client,
    account_url: String,
}

impl HttpProfileDirectory {
    pub fn new(client: Client, endpoints: &Endpoints) -> Self {
        Self {
            client,
            account_url: endpoints.account_url.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProfilesResponse {
    owner: OwnerId,
    // Accounts without profiles may send `null`
    #[serde(default)]
    profiles: Option<Vec<Profile>>,
}

#[async_trait]
impl ProfileDirectory for HttpProfileDirectory {
    #[instrument(skip_all)]
    async fn fetch_profiles(&self, credential: &AccessCredential) -> Result<ProfileSet, Error> {
        let response = self
            .client
            .get(endpoint(&self.account_url, "/my-account/get-profiles"))
            .header(header::ACCEPT, "application/json")
            .bearer_auth(credential.access_token.expose())
            .send()
            .await
            .map_err(transport("profile request failed"))?;

        ensure_ok(&response)?;
        let payload: ProfilesResponse = read_json(response, "profiles response").await?;
        let profiles = payload.profiles.unwrap_or_default();

        info!(owner = %payload.owner, count = profiles.len(), "profiles fetched");

        Ok(ProfileSet {
            owner: payload.owner,
            profiles,
        })
    }
}
