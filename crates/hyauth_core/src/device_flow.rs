//! Bounded polling loop for the device authorization grant.
//!
//! The loop races three things: the poll ticker (server interval), the
//! one-shot deadline (server `expires_in`) and the caller's cancellation
//! token. Whichever fires first decides the next state.

use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::entities::{AccessCredential, DeviceAuthorization};
use crate::error::Error;
use crate::ports::{DeviceAuthorizer, PendingReason, PollAttempt};

/// Added to the poll interval for every `slow_down` response (RFC 8628 §3.5)
pub const SLOW_DOWN_INCREMENT: Duration = Duration::from_secs(5);

#[derive(Debug)]
enum PollState {
    WaitingForTick,
    AwaitingResponse,
    Expired,
    Succeeded(AccessCredential),
    Failed(Error),
}

/// Poll the token endpoint until the user approves, the code expires, a
/// terminal error occurs or `cancel` fires.
///
/// The first request goes out one interval after the call. A tick landing
/// exactly on the deadline still polls; nothing is sent after it.
pub async fn poll_for_token<D>(
    authorizer: &D,
    authorization: &DeviceAuthorization,
    cancel: &CancellationToken,
) -> Result<AccessCredential, Error>
where
    D: DeviceAuthorizer + ?Sized,
{
    let mut period = authorization.poll_period();
    let mut ticker = poll_timer(period, authorization);
    let deadline = time::sleep_until(authorization.expires_at);
    tokio::pin!(deadline);

    let mut attempts: u32 = 0;
    let mut state = PollState::WaitingForTick;

    debug!(
        interval_secs = period.as_secs(),
        expires_in = authorization.expires_in,
        "waiting for device authorization"
    );

    loop {
        state = match state {
            PollState::WaitingForTick => tokio::select! {
                biased;
                _ = cancel.cancelled() => PollState::Failed(Error::Cancelled),
                _ = ticker.tick() => {
                    // A delayed tick can land after the deadline if the previous request was slow
                    if Instant::now() <= authorization.expires_at {
                        PollState::AwaitingResponse
                    } else {
                        PollState::Expired
                    }
                }
                _ = &mut deadline => PollState::Expired,
            },
            PollState::AwaitingResponse => {
                attempts += 1;
                debug!(attempt = attempts, "requesting token");

                // An answer that is ready by the deadline still counts
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(Error::Cancelled),
                    outcome = authorizer.exchange_device_code(&authorization.device_code) => outcome,
                    _ = &mut deadline => Err(Error::DeviceCodeExpired),
                };

                match outcome {
                    Ok(PollAttempt::Granted(credential)) => PollState::Succeeded(credential),
                    Ok(PollAttempt::Pending(PendingReason::SlowDown)) => {
                        period = period.saturating_add(SLOW_DOWN_INCREMENT);
                        warn!(
                            interval_secs = period.as_secs(),
                            "server asked to slow down"
                        );
                        ticker = poll_timer(period, authorization);
                        PollState::WaitingForTick
                    }
                    Ok(PollAttempt::Pending(PendingReason::Other(code))) => {
                        info!(code = %code, "token endpoint reported a recoverable error");
                        PollState::WaitingForTick
                    }
                    Ok(PollAttempt::Pending(PendingReason::AuthorizationPending)) => {
                        debug!("authorization pending");
                        PollState::WaitingForTick
                    }
                    Err(error) => PollState::Failed(error),
                }
            }
            PollState::Expired => {
                warn!(attempts, "device code expired before authorization");
                return Err(Error::DeviceCodeExpired);
            }
            PollState::Succeeded(credential) => {
                info!(attempts, "device authorization granted");
                return Ok(credential);
            }
            PollState::Failed(error) => {
                warn!(attempts, error = %error, "stopped polling for token");
                return Err(error);
            }
        };
    }
}

/// Ticker whose first tick is one `period` away. A period longer than the
/// remaining lifetime is cut to land just past the deadline, which then fires first.
fn poll_timer(period: Duration, authorization: &DeviceAuthorization) -> Interval {
    let now = Instant::now();
    let period =
        period.min(authorization.expires_at.saturating_duration_since(now) + Duration::from_secs(1));
    let mut interval = time::interval_at(now + period, period);
    // Never burst after a slow response
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
