use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::Error;

/// Declares a credential newtype whose value never shows up in `Debug` output.
macro_rules! secret {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Raw value, for placing on the wire or handing to the launcher
            pub fn expose(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(concat!(stringify!($name), "(<redacted>)"))
            }
        }
    };
}

/// Declares a non-secret identifier newtype.
macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

secret!(
    /// Account-level bearer token from the device grant
    AccessToken
);
secret!(RefreshToken);
secret!(
    /// Bearer token for one game session
    SessionToken
);
secret!(IdentityToken);
secret!(
    /// Device code exchanged at the token endpoint while the user approves
    DeviceCode
);

identifier!(
    /// UUID of the account owning the profiles
    OwnerId
);
identifier!(ProfileUuid);
identifier!(
    /// Short code the user types on the verification page
    UserCode
);

/// Interval assumed when the server omits one (RFC 8628 §3.2)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Result of a device code request. Immutable for the lifetime of one sign-in attempt.
#[derive(Debug, Clone)]
pub struct DeviceAuthorization {
    pub device_code: DeviceCode,
    pub user_code: UserCode,
    pub verification_uri: String,
    pub verification_uri_complete: Option<String>,
    /// Lifetime of the device code in seconds
    pub expires_in: u64,
    /// Minimum seconds between token requests
    pub poll_interval: u64,
    /// Issue time plus `expires_in`
    pub expires_at: Instant,
}

impl DeviceAuthorization {
    pub fn new(
        device_code: DeviceCode,
        user_code: UserCode,
        verification_uri: String,
        verification_uri_complete: Option<String>,
        expires_in: u64,
        poll_interval: u64,
        issued_at: Instant,
    ) -> Result<Self, Error> {
        // One spare second past the deadline is needed for the last poll tick
        let expires_at = issued_at
            .checked_add(Duration::from_secs(expires_in))
            .filter(|at| at.checked_add(Duration::from_secs(1)).is_some())
            .ok_or_else(|| {
                Error::MalformedResponse(format!("expires_in out of range: {}", expires_in))
            })?;

        Ok(Self {
            device_code,
            user_code,
            verification_uri,
            verification_uri_complete,
            expires_in,
            poll_interval,
            expires_at,
        })
    }

    /// URL to show the user; prefers the one with the user code embedded
    pub fn prompt_uri(&self) -> &str {
        self.verification_uri_complete
            .as_deref()
            .unwrap_or(&self.verification_uri)
    }

    /// Poll cadence. A zero interval is treated as one second.
    pub fn poll_period(&self) -> Duration {
        Duration::from_secs(self.poll_interval.max(1))
    }

    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

/// Token endpoint success payload
#[derive(Debug, Clone, Deserialize)]
pub struct AccessCredential {
    pub access_token: AccessToken,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<RefreshToken>,
    #[serde(default)]
    pub scope: String,
}

impl AccessCredential {
    pub fn new(access_token: AccessToken) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: 0,
            refresh_token: None,
            scope: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub uuid: ProfileUuid,
    pub username: String,
}

impl Profile {
    pub fn new(uuid: &str, username: &str) -> Self {
        Self {
            uuid: ProfileUuid::new(uuid),
            username: username.to_string(),
        }
    }
}

/// Profiles owned by one account, in server order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSet {
    pub owner: OwnerId,
    pub profiles: Vec<Profile>,
}

impl ProfileSet {
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    pub session_token: SessionToken,
    pub identity_token: IdentityToken,
    pub expires_at: DateTime<Utc>,
}

impl GameSession {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// True when the session ends within `margin` of `now`, i.e. a refresh is due
    pub fn expires_within(&self, now: DateTime<Utc>, margin: chrono::Duration) -> bool {
        self.expires_at - now <= margin
    }
}

/// Everything the game launcher needs after a successful sign-in.
///
/// The session token, identity token and owner id are forwarded as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub owner: OwnerId,
    pub profile: Profile,
    pub session: GameSession,
}

impl SessionRecord {
    pub fn session_token(&self) -> &SessionToken {
        &self.session.session_token
    }

    pub fn identity_token(&self) -> &IdentityToken {
        &self.session.identity_token
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }
}
