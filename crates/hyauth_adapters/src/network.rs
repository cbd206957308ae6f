//! Shared HTTP client configuration and response handling.
//!
//! One `reqwest::Client` is built per process and cloned into every adapter;
//! it pools connections and is safe to use from concurrent tasks.

use std::time::Duration;

use hyauth_core::config::HttpSettings;
use hyauth_core::Error;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

/// Build the HTTP client shared by the auth, account and session adapters.
///
/// This client is configured with:
/// - Request and connect timeouts from settings
/// - The configured user agent
pub fn build_http_client(settings: &HttpSettings) -> Result<Client, Error> {
    Client::builder()
        .user_agent(&settings.user_agent)
        .timeout(Duration::from_secs(settings.timeout_secs))
        .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .build()
        .map_err(|e| Error::Transport(format!("failed to create HTTP client: {}", e)))
}

pub(crate) fn transport(context: &'static str) -> impl FnOnce(reqwest::Error) -> Error {
    move |e| Error::Transport(format!("{}: {}", context, e))
}

/// Every endpoint we talk to signals success with exactly 200
pub(crate) fn ensure_ok(response: &Response) -> Result<(), Error> {
    match response.status() {
        StatusCode::OK => Ok(()),
        status => Err(Error::UnexpectedStatus(status.as_u16())),
    }
}

/// Read the body, then decode it, so a dropped connection and a bad payload stay distinguishable
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: Response,
    context: &'static str,
) -> Result<T, Error> {
    let body = response.text().await.map_err(transport(context))?;
    serde_json::from_str(&body).map_err(|e| Error::MalformedResponse(format!("{}: {}", context, e)))
}

/// Join a base URL and an absolute path without doubling slashes
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
