//! In-memory throttling for credential and OTP attempts.
//!
//! DESIGN
//! ======
//! Sliding-window counters backed by `HashMap<String, VecDeque<Instant>>`,
//! keyed by a caller-chosen string (`login:<email>`, `otp:<user id>`).
//! Each key may make `limit` attempts per `window`; a successful login or
//! verification resets its key.
//!
//! TRADE-OFFS
//! ==========
//! State is per process. Behind several replicas the effective limit is
//! `limit * replicas`.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::config::env_parse;

const DEFAULT_ATTEMPT_LIMIT: usize = 10;
const DEFAULT_ATTEMPT_WINDOW_SECS: u64 = 900;

#[derive(Debug, thiserror::Error)]
#[error("too many attempts, try again in {retry_after_secs}s")]
pub struct RateLimitError {
    pub retry_after_secs: u64,
}

#[derive(Clone)]
pub struct AttemptLimiter {
    attempts: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
    limit: usize,
    window: Duration,
}

impl AttemptLimiter {
    /// Limits from `AUTH_ATTEMPT_LIMIT` / `AUTH_ATTEMPT_WINDOW_SECS`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::with_limits(
            env_parse("AUTH_ATTEMPT_LIMIT", DEFAULT_ATTEMPT_LIMIT),
            Duration::from_secs(env_parse("AUTH_ATTEMPT_WINDOW_SECS", DEFAULT_ATTEMPT_WINDOW_SECS)),
        )
    }

    #[must_use]
    pub fn with_limits(limit: usize, window: Duration) -> Self {
        Self { attempts: Arc::new(Mutex::new(HashMap::new())), limit, window }
    }

    /// Record an attempt for `key`, or refuse it if the window is full.
    ///
    /// # Errors
    ///
    /// [`RateLimitError`] carrying the seconds until the oldest attempt ages out.
    pub fn check_and_record(&self, key: &str) -> Result<(), RateLimitError> {
        self.check_and_record_at(key, Instant::now())
    }

    fn check_and_record_at(&self, key: &str, now: Instant) -> Result<(), RateLimitError> {
        let mut attempts = self.attempts.lock().unwrap_or_else(PoisonError::into_inner);
        let deque = attempts.entry(key.to_owned()).or_default();
        prune_window(deque, now, self.window);

        if deque.len() >= self.limit {
            let retry_after = deque
                .front()
                .map_or(self.window, |&oldest| self.window.saturating_sub(now.duration_since(oldest)));
            return Err(RateLimitError { retry_after_secs: retry_after.as_secs().max(1) });
        }
        deque.push_back(now);
        Ok(())
    }

    /// Forget all attempts for `key`.
    pub fn reset(&self, key: &str) {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    /// Drop keys whose attempts have all aged out.
    pub fn prune(&self) {
        let now = Instant::now();
        let mut attempts = self.attempts.lock().unwrap_or_else(PoisonError::into_inner);
        attempts.retain(|_, deque| {
            prune_window(deque, now, self.window);
            !deque.is_empty()
        });
    }
}

impl Default for AttemptLimiter {
    fn default() -> Self {
        Self::from_env()
    }
}

fn prune_window(deque: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&front) = deque.front() {
        if now.duration_since(front) > window {
            deque.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
#[path = "rate_limit_test.rs"]
mod tests;
