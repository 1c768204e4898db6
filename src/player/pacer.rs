use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::audio::constants::BYTES_PER_SECOND;

/// Keeps PCM from being sent faster than it plays.
///
/// Tracks how much audio went out since `origin` and sleeps whenever the
/// sender gets more than `lead` ahead of the wall clock.
pub struct Pacer {
    enabled: bool,
    lead: Duration,
    origin: Instant,
    sent_bytes: u64,
}

impl Pacer {
    pub fn new(enabled: bool, lead: Duration) -> Self {
        Self {
            enabled,
            lead,
            origin: Instant::now(),
            sent_bytes: 0,
        }
    }

    /// Restart the clock, e.g. after a pause.
    pub fn reset(&mut self) {
        self.origin = Instant::now();
        self.sent_bytes = 0;
    }

    pub fn sent(&self) -> Duration {
        Duration::from_secs_f64(self.sent_bytes as f64 / BYTES_PER_SECOND as f64)
    }

    /// Account for `bytes` just sent and wait until the next send is due.
    /// Returns `false` if `cancel` fired while waiting.
    pub async fn throttle(&mut self, bytes: usize, cancel: &CancellationToken) -> bool {
        self.sent_bytes += bytes as u64;
        if !self.enabled {
            return true;
        }

        let due = self.origin + self.sent();
        let Some(wake) = due.checked_sub(self.lead) else {
            return true;
        };
        if wake <= Instant::now() {
            return true;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep_until(wake) => true,
        }
    }
}
