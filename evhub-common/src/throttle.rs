//! Minimum spacing between outbound requests

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Hands out permits no closer together than `min_interval`
///
/// Callers queue on the inner lock, so concurrent requests go out one
/// interval apart in arrival order.
#[derive(Debug)]
pub struct RequestThrottle {
    min_interval: Duration,
    next_allowed: Mutex<Option<Instant>>,
}

impl RequestThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_allowed: Mutex::new(None),
        }
    }

    /// Wait for the next permit; returns how long the caller slept
    pub async fn acquire(&self) -> Duration {
        let mut next_allowed = self.next_allowed.lock().await;

        let now = Instant::now();
        let waited = match *next_allowed {
            Some(at) if at > now => {
                tokio::time::sleep_until(at).await;
                at - now
            }
            _ => Duration::ZERO,
        };

        *next_allowed = Some(Instant::now() + self.min_interval);
        waited
    }
}
