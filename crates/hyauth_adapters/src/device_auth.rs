//! OAuth device authorization grant client (RFC 8628).

use async_trait::async_trait;
use hyauth_core::config::{Endpoints, OauthSettings};
use hyauth_core::entities::{
    AccessCredential, DeviceAuthorization, DeviceCode, UserCode, DEFAULT_POLL_INTERVAL_SECS,
};
use hyauth_core::ports::{DeviceAuthorizer, PendingReason, PollAttempt};
use hyauth_core::Error;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use crate::network::{endpoint, ensure_ok, read_json, transport};

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Device-code client for the OAuth server
pub struct HttpDeviceAuthorizer {
    client: Client,
    auth_url: String,
    client_id: String,
    scope: String,
}

impl HttpDeviceAuthorizer {
    pub fn new(client: Client, endpoints: &Endpoints, oauth: &OauthSettings) -> Self {
        Self {
            client,
            auth_url: endpoints.auth_url.clone(),
            client_id: oauth.client_id.clone(),
            scope: oauth.scope.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: DeviceCode,
    user_code: UserCode,
    verification_uri: String,
    #[serde(default)]
    verification_uri_complete: Option<String>,
    expires_in: u64,
    #[serde(default = "default_interval")]
    interval: u64,
}

fn default_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

/// Body of a 400 from the token endpoint
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
}

#[async_trait]
impl DeviceAuthorizer for HttpDeviceAuthorizer {
    #[instrument(skip(self))]
    async fn request_code(&self) -> Result<DeviceAuthorization, Error> {
        let response = self
            .client
            .post(endpoint(&self.auth_url, "/device/auth"))
            .header(header::ACCEPT, "application/json")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await
            .map_err(transport("device code request failed"))?;

        ensure_ok(&response)?;
        let payload: DeviceCodeResponse = read_json(response, "device code response").await?;

        info!(
            expires_in = payload.expires_in,
            interval = payload.interval,
            "device code received"
        );

        DeviceAuthorization::new(
            payload.device_code,
            payload.user_code,
            payload.verification_uri,
            payload.verification_uri_complete,
            payload.expires_in,
            payload.interval,
            Instant::now(),
        )
    }

    #[instrument(skip_all)]
    async fn exchange_device_code(&self, device_code: &DeviceCode) -> Result<PollAttempt, Error> {
        let response = self
            .client
            .post(endpoint(&self.auth_url, "/token"))
            .header(header::ACCEPT, "application/json")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("grant_type", DEVICE_CODE_GRANT),
                ("device_code", device_code.expose()),
            ])
            .send()
            .await
            .map_err(transport("token request failed"))?;

        match response.status() {
            StatusCode::OK => {
                let credential: AccessCredential = read_json(response, "token response").await?;
                Ok(PollAttempt::Granted(credential))
            }
            StatusCode::BAD_REQUEST => {
                let body: TokenErrorResponse = read_json(response, "token error response").await?;
                debug!(error = %body.error, "token not ready");
                classify_token_error(&body.error)
            }
            status => Err(Error::UnexpectedStatus(status.as_u16())),
        }
    }
}

/// Map an RFC 8628 error code to "keep polling" or a terminal error
fn classify_token_error(code: &str) -> Result<PollAttempt, Error> {
    match code {
        "authorization_pending" => Ok(PollAttempt::Pending(PendingReason::AuthorizationPending)),
        "slow_down" => Ok(PollAttempt::Pending(PendingReason::SlowDown)),
        "access_denied" => Err(Error::AccessDenied),
        "expired_token" => Err(Error::DeviceCodeExpired),
        other => Ok(PollAttempt::Pending(PendingReason::Other(other.to_string()))),
    }
}
