use serde::{Deserialize, Serialize};

pub const DEFAULT_AUTH_URL: &str = "https://oauth.accounts.hytale.com/oauth2";
pub const DEFAULT_ACCOUNT_URL: &str = "https://account-data.hytale.com";
pub const DEFAULT_SESSION_URL: &str = "https://sessions.hytale.com";
pub const DEFAULT_CLIENT_ID: &str = "hytale-server";
pub const DEFAULT_SCOPE: &str = "openid offline auth:server";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub endpoints: Endpoints,
    pub oauth: OauthSettings,
    pub http: HttpSettings,
    pub log_level: String,
}

/// Base URLs of the three remote services
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub auth_url: String,
    pub account_url: String,
    pub session_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct OauthSettings {
    pub client_id: String,
    pub scope: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Endpoints {
    /// Point every service at one base URL (test servers, local proxies)
    pub fn single_host(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            auth_url: base.to_string(),
            account_url: base.to_string(),
            session_url: base.to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            oauth: OauthSettings::default(),
            http: HttpSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth_url: DEFAULT_AUTH_URL.to_string(),
            account_url: DEFAULT_ACCOUNT_URL.to_string(),
            session_url: DEFAULT_SESSION_URL.to_string(),
        }
    }
}

impl Default for OauthSettings {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: concat!("hyauth/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();

        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.endpoints.auth_url, DEFAULT_AUTH_URL);
        assert_eq!(settings.endpoints.account_url, DEFAULT_ACCOUNT_URL);
        assert_eq!(settings.endpoints.session_url, DEFAULT_SESSION_URL);
        assert_eq!(settings.oauth.client_id, "hytale-server");
        assert_eq!(settings.oauth.scope, "openid offline auth:server");
        assert_eq!(settings.http.timeout_secs, 30);
        assert_eq!(settings.http.connect_timeout_secs, 10);
    }

    #[rstest]
    #[case("http://127.0.0.1:8080", "http://127.0.0.1:8080")]
    #[case("http://127.0.0.1:8080/", "http://127.0.0.1:8080")]
    fn test_single_host(#[case] base: &str, #[case] expected: &str) {
        let endpoints = Endpoints::single_host(base);
        assert_eq!(endpoints.auth_url, expected);
        assert_eq!(endpoints.account_url, expected);
        assert_eq!(endpoints.session_url, expected);
    }

    #[test]
    fn test_default_user_agent() {
        let settings = HttpSettings::default();
        assert!(settings.user_agent.starts_with("hyauth/"));
    }
}
