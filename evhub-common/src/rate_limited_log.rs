//! Rate-limited warning log
//!
//! Repeated warnings with the same key are emitted at most once per
//! `min_interval`; suppressed repeats are counted and reported with the next
//! emitted warning for that key.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct KeyState {
    last_emitted: Instant,
    suppressed: u64,
}

/// Warning log that emits each key at most once per interval
#[derive(Debug)]
pub struct RateLimitedLog {
    min_interval: Duration,
    keys: Mutex<HashMap<String, KeyState>>,
}

impl RateLimitedLog {
    /// Create a log with the given minimum interval between repeats of a key
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            keys: Mutex::new(HashMap::new()),
        }
    }

    /// Record an occurrence of `key`
    ///
    /// Returns `Some(suppressed_since_last)` if the caller should emit now,
    /// `None` if the occurrence falls inside the interval.
    pub fn check(&self, key: &str) -> Option<u64> {
        let mut keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        match keys.get_mut(key) {
            Some(state) if now.duration_since(state.last_emitted) < self.min_interval => {
                state.suppressed += 1;
                None
            }
            Some(state) => {
                let suppressed = state.suppressed;
                state.last_emitted = now;
                state.suppressed = 0;
                Some(suppressed)
            }
            None => {
                keys.insert(
                    key.to_string(),
                    KeyState {
                        last_emitted: now,
                        suppressed: 0,
                    },
                );
                Some(0)
            }
        }
    }

    /// Emit a warning for `key` unless one was emitted within the interval
    ///
    /// Returns true if the warning was written.
    pub fn warn(&self, key: &str, message: impl std::fmt::Display) -> bool {
        match self.check(key) {
            Some(0) => {
                tracing::warn!(key = key, "{}", message);
                true
            }
            Some(suppressed) => {
                tracing::warn!(key = key, suppressed = suppressed, "{}", message);
                true
            }
            None => false,
        }
    }
}
