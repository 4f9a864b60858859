use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// In-memory sliding-window limiter keyed by `"{bucket}:{ip_hash}"`.
pub struct RateLimiter {
    entries: Mutex<HashMap<String, Vec<Instant>>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        RateLimiter::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        RateLimiter {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Instant>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record an attempt and return true if it is still under
    /// `max_attempts` within `window`.
    pub fn check_and_record(&self, key: &str, max_attempts: u64, window: Duration) -> bool {
        let mut map = self.lock();
        let now = Instant::now();
        let attempts = map.entry(key.to_string()).or_default();
        attempts.retain(|t| now.duration_since(*t) < window);

        if (attempts.len() as u64) < max_attempts {
            attempts.push(now);
            true
        } else {
            false
        }
    }

    /// Forget a key, e.g. after a successful sign-in.
    pub fn reset(&self, key: &str) {
        self.lock().remove(key);
    }

    /// Drop entries older than `max_age`.
    pub fn cleanup(&self, max_age: Duration) {
        let now = Instant::now();
        self.lock().retain(|_, attempts| {
            attempts.retain(|t| now.duration_since(*t) < max_age);
            !attempts.is_empty()
        });
    }

    pub fn tracked_keys(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_max_attempts() {
        let rl = RateLimiter::new();
        let window = Duration::from_secs(60);
        for _ in 0..3 {
            assert!(rl.check_and_record("login:x", 3, window));
        }
        assert!(!rl.check_and_record("login:x", 3, window));
        assert!(rl.check_and_record("login:y", 3, window));
        rl.reset("login:x");
        assert!(rl.check_and_record("login:x", 3, window));
    }

    #[test]
    fn cleanup_drops_stale_keys() {
        let rl = RateLimiter::new();
        rl.check_and_record("login:x", 5, Duration::from_secs(60));
        rl.cleanup(Duration::ZERO);
        assert_eq!(rl.tracked_keys(), 0);
    }
}
