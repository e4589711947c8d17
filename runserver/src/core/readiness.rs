//! Bounded readiness polling

use std::time::Duration;
use tokio::time::sleep;

use crate::error::{RunserverError, RunserverResult};
use crate::traits::PortProbe;

/// Upper bound on a single connection attempt
pub const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadinessPolicy {
    pub attempts: u32,
    pub sleep: Duration,
    pub connect_timeout: Duration,
}

impl ReadinessPolicy {
    /// Connect timeout follows the sleep interval but stays within one second
    pub fn new(attempts: u32, sleep: Duration) -> Self {
        let connect_timeout = sleep.clamp(Duration::from_millis(100), MAX_CONNECT_TIMEOUT);
        Self {
            attempts,
            sleep,
            connect_timeout,
        }
    }
}

/// Dial `address` until it answers or the attempts run out.
///
/// `alive` runs before every attempt and aborts the loop with its error, so a
/// server that died is reported at once instead of after every retry.
pub async fn wait_for_port<P, F>(
    probe: &P,
    address: &str,
    policy: ReadinessPolicy,
    mut alive: F,
) -> RunserverResult<u32>
where
    P: PortProbe + ?Sized,
    F: FnMut() -> RunserverResult<()>,
{
    for attempt in 1..=policy.attempts {
        alive()?;

        if probe.probe(address, policy.connect_timeout).await {
            tracing::debug!(address, attempt, "Port accepted connection");
            return Ok(attempt);
        }

        tracing::debug!(address, attempt, max_attempts = policy.attempts, "Port not reachable yet");
        if attempt < policy.attempts {
            sleep(policy.sleep).await;
        }
    }

    Err(RunserverError::NotReady {
        address: address.to_string(),
        attempts: policy.attempts,
    })
}
