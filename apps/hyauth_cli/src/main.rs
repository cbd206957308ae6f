use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use hyauth_adapters::configuration::{self, config_directory};
use hyauth_adapters::telemetry;
use hyauth_adapters::{
    build_http_client, FileSessionStore, HttpDeviceAuthorizer, HttpGameSessionService,
    HttpProfileDirectory,
};
use hyauth_core::entities::{DeviceAuthorization, SessionRecord};
use hyauth_core::ports::VerificationPrompt;
use hyauth_core::use_cases::{GameSessionUseCase, ProfileByUsername, SignInUseCase};
use hyauth_core::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with a device code and open a game session
    Login {
        /// Play as this profile instead of the first one
        #[arg(short, long)]
        profile: Option<String>,

        /// Do not store the session for later refresh/terminate
        #[arg(long, default_value = "false")]
        no_save: bool,

        /// Print the session as a JSON object
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Refresh the stored game session
    Refresh,

    /// Terminate the stored game session
    Terminate,

    /// Show the stored game session
    Status,
}

/// Tells the user where to approve the sign-in
struct TerminalPrompt {
    json: bool,
}

impl VerificationPrompt for TerminalPrompt {
    fn present(&self, authorization: &DeviceAuthorization) {
        let message = format!(
            "To sign in, visit:\n\n    {}\n\nand confirm the code {}",
            authorization.prompt_uri(),
            authorization.user_code
        );
        // Keep stdout parseable in JSON mode
        if self.json {
            eprintln!("{}", message);
        } else {
            println!("{}", message);
        }
    }
}

fn render_login(record: &SessionRecord, json: bool) -> String {
    if json {
        serde_json::json!({
            "sessionToken": record.session_token().expose(),
            "identityToken": record.identity_token().expose(),
            "ownerId": record.owner().as_str(),
        })
        .to_string()
    } else {
        format!(
            "Session token: {}\nIdentity token: {}\nOwner id: {}",
            record.session_token().expose(),
            record.identity_token().expose(),
            record.owner()
        )
    }
}

fn render_status(record: &SessionRecord, now: chrono::DateTime<chrono::Utc>) -> String {
    let state = if record.session.is_expired_at(now) {
        "expired"
    } else {
        "active"
    };
    format!(
        "Owner id: {}\nProfile: {} ({})\nExpires at: {} [{}]",
        record.owner(),
        record.profile.username,
        record.profile.uuid,
        record.session.expires_at,
        state
    )
}

/// Cancel `token` on the first Ctrl-C
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling sign-in");
            token.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `--help` and usage errors exit here, before any file is read or created
    let cli = Cli::parse();

    dotenvy::dotenv().ok();

    let settings = match configuration::get_configuration() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to load configuration: {}", e);
            return Err(anyhow::anyhow!("configuration loading failed"));
        }
    };

    let _guard = telemetry::init_subscriber("hyauth", &settings.log_level)?;

    let client = build_http_client(&settings.http)?;
    let sessions = Arc::new(HttpGameSessionService::new(
        client.clone(),
        &settings.endpoints,
    ));
    let store = Arc::new(FileSessionStore::new(config_directory()));
    let lifecycle = GameSessionUseCase::new(sessions.clone(), store);

    match cli.command {
        Commands::Login {
            profile,
            no_save,
            json,
        } => {
            let authorizer = Arc::new(HttpDeviceAuthorizer::new(
                client.clone(),
                &settings.endpoints,
                &settings.oauth,
            ));
            let profiles = Arc::new(HttpProfileDirectory::new(client, &settings.endpoints));

            let mut sign_in = SignInUseCase::new(authorizer, profiles, sessions);
            if let Some(name) = profile {
                sign_in = sign_in.with_selector(ProfileByUsername(name));
            }

            let cancel = CancellationToken::new();
            cancel_on_ctrl_c(cancel.clone());

            let record = match sign_in.execute(&TerminalPrompt { json }, &cancel).await {
                Ok(record) => record,
                Err(e) => {
                    error!(stage = %e.stage, error = %e.source, "sign-in failed");
                    if e.is_user_recoverable() {
                        eprintln!("{}. Run `hyauth login` to try again.", e);
                    }
                    return Err(e.into());
                }
            };

            if !no_save {
                lifecycle
                    .remember(&record)
                    .await
                    .context("failed to store the game session")?;
                info!("session stored");
            }

            println!("{}", render_login(&record, json));
        }
        Commands::Refresh => match lifecycle.refresh().await {
            Ok(record) => println!(
                "Session refreshed for {} ({})",
                record.profile.username,
                record.owner()
            ),
            Err(Error::NoStoredSession) => println!("No stored session. Run `hyauth login` first."),
            Err(e) => return Err(e).context("session refresh failed"),
        },
        Commands::Terminate => match lifecycle.terminate().await {
            Ok(record) => println!("Session terminated for {}", record.profile.username),
            Err(Error::NoStoredSession) => println!("No stored session."),
            Err(e) => return Err(e).context("session termination failed"),
        },
        Commands::Status => match lifecycle.current().await {
            Ok(record) => println!("{}", render_status(&record, chrono::Utc::now())),
            Err(Error::NoStoredSession) => println!("No stored session."),
            Err(e) => return Err(e).context("failed to read the stored session"),
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use clap::CommandFactory;
    use hyauth_core::entities::{GameSession, IdentityToken, OwnerId, Profile, SessionToken};

    fn record() -> SessionRecord {
        SessionRecord {
            owner: OwnerId::new("owner-1"),
            profile: Profile::new("p1", "Steve"),
            session: GameSession {
                session_token: SessionToken::new("session-abc"),
                identity_token: IdentityToken::new("identity-abc"),
                expires_at: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            },
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_help_is_handled_by_the_parser() {
        let err = Cli::try_parse_from(["hyauth", "--help"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);

        let err = Cli::try_parse_from(["hyauth", "bogus"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidSubcommand);
    }

    #[test]
    fn test_parse_login_flags() {
        let cli = Cli::parse_from(["hyauth", "login", "--profile", "steve", "--no-save", "--json"]);

        match cli.command {
            Commands::Login {
                profile,
                no_save,
                json,
            } => {
                assert_eq!(profile.as_deref(), Some("steve"));
                assert!(no_save);
                assert!(json);
            }
            _ => panic!("expected login"),
        }
    }

    #[test]
    fn test_render_login_text() {
        assert_eq!(
            render_login(&record(), false),
            "Session token: session-abc\nIdentity token: identity-abc\nOwner id: owner-1"
        );
    }

    #[test]
    fn test_render_login_json() {
        let value: serde_json::Value = serde_json::from_str(&render_login(&record(), true)).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "sessionToken": "session-abc",
                "identityToken": "identity-abc",
                "ownerId": "owner-1"
            })
        );
    }

    #[test]
    fn test_render_status_marks_expired() {
        let before = Utc.with_ymd_and_hms(2029, 1, 1, 0, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).unwrap();

        assert!(render_status(&record(), before).ends_with("[active]"));
        assert!(render_status(&record(), after).ends_with("[expired]"));
    }
}
