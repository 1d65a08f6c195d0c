//! Per-actor throttling of demo flag updates.
//!
//! A sliding window limits how often one key may act. Every rejected attempt
//! counts as a violation, and once a key has collected enough violations it is
//! banned outright for a while.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use thiserror::Error;

use crate::config::RateLimitConfig;

/// Why a request was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    /// Too many requests inside the window
    #[error("Rate limit exceeded: {0} requests allowed per {1:?}")]
    LimitExceeded(u32, Duration),

    /// The key is serving a temporary ban
    #[error("Client is temporarily banned due to excessive requests")]
    TemporaryBan,
}

struct RateLimitEntry {
    /// Timestamps of recent requests
    request_history: Vec<Instant>,
    /// Time when temporary ban expires (if any)
    ban_expiry: Option<Instant>,
    /// Number of rejected requests since the last ban
    violation_count: u32,
}

/// Limiter settings.
#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    /// Maximum requests per time window
    pub max_requests: u32,
    /// Time window for rate limiting
    pub time_window: Duration,
    /// How long to temporarily ban after multiple violations
    pub ban_duration: Duration,
    /// Number of violations before temporary ban
    pub violations_before_ban: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 10,
            time_window: Duration::from_secs(60),
            ban_duration: Duration::from_secs(300),
            violations_before_ban: 3,
        }
    }
}

impl From<&RateLimitConfig> for RateLimitSettings {
    fn from(cfg: &RateLimitConfig) -> Self {
        Self {
            max_requests: cfg.max_toggles,
            time_window: Duration::from_secs(cfg.window_seconds),
            ban_duration: Duration::from_secs(cfg.ban_seconds),
            violations_before_ban: cfg.violations_before_ban,
        }
    }
}

impl RateLimitEntry {
    fn new(max_requests: u32) -> Self {
        Self {
            request_history: Vec::with_capacity(max_requests as usize),
            ban_expiry: None,
            violation_count: 0,
        }
    }

    fn check(&mut self, now: Instant, settings: &RateLimitSettings) -> Result<(), RateLimitError> {
        if let Some(expiry) = self.ban_expiry {
            if now < expiry {
                return Err(RateLimitError::TemporaryBan);
            }
            self.ban_expiry = None;
            self.violation_count = 0;
        }

        let window = settings.time_window;
        self.request_history
            .retain(|&t| now.saturating_duration_since(t) < window);

        if self.request_history.len() >= settings.max_requests as usize {
            self.violation_count += 1;
            if self.violation_count >= settings.violations_before_ban {
                self.ban_expiry = Some(now + settings.ban_duration);
                log::warn!(
                    "rate limiter: banning key for {:?} after {} violations",
                    settings.ban_duration,
                    self.violation_count
                );
            }
            return Err(RateLimitError::LimitExceeded(settings.max_requests, window));
        }

        self.request_history.push(now);
        Ok(())
    }

    fn is_stale(&mut self, now: Instant, window: Duration) -> bool {
        if let Some(expiry) = self.ban_expiry {
            if now < expiry {
                return false;
            }
        }
        self.request_history
            .retain(|&t| now.saturating_duration_since(t) < window);
        self.request_history.is_empty()
    }
}

/// Sliding-window rate limiter keyed by client id.
///
/// Cloning shares the underlying state.
#[derive(Clone)]
pub struct RateLimiter {
    settings: Arc<RateLimitSettings>,
    limits: Arc<Mutex<HashMap<String, RateLimitEntry>>>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("settings", &self.settings)
            .field("tracked_keys", &self.limits.lock().len())
            .finish()
    }
}

impl RateLimiter {
    /// Creates a limiter with the given settings.
    pub fn new(settings: RateLimitSettings) -> Self {
        Self {
            settings: Arc::new(settings),
            limits: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &RateLimitSettings {
        &self.settings
    }

    /// Check if a request from `client_id` should be allowed right now.
    pub fn check(&self, client_id: &str) -> Result<(), RateLimitError> {
        self.check_at(client_id, Instant::now())
    }

    /// Same as [`check`](Self::check) with an explicit clock reading.
    pub fn check_at(&self, client_id: &str, now: Instant) -> Result<(), RateLimitError> {
        let mut limits = self.limits.lock();
        let entry = limits
            .entry(client_id.to_string())
            .or_insert_with(|| RateLimitEntry::new(self.settings.max_requests));
        entry.check(now, &self.settings)
    }

    /// Forget everything about `client_id`, lifting any ban.
    pub fn reset(&self, client_id: &str) {
        self.limits.lock().remove(client_id);
    }

    /// Drop entries with no recent requests and no active ban.
    pub fn cleanup_stale_entries_now(&self) {
        self.cleanup_stale_entries_at(Instant::now());
    }

    fn cleanup_stale_entries_at(&self, now: Instant) {
        let window = self.settings.time_window;
        self.limits.lock().retain(|_, entry| !entry.is_stale(now, window));
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.limits.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_limiter() -> RateLimiter {
        RateLimiter::new(RateLimitSettings {
            max_requests: 3,
            time_window: Duration::from_secs(10),
            ban_duration: Duration::from_secs(60),
            violations_before_ban: 2,
        })
    }

    #[test]
    fn test_limit_and_window_expiry() {
        let limiter = create_test_limiter();
        let t0 = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check_at("admin-1", t0).is_ok());
        }
        match limiter.check_at("admin-1", t0) {
            Err(RateLimitError::LimitExceeded(3, _)) => {}
            other => panic!("Expected LimitExceeded, got {:?}", other),
        }

        // Other keys are unaffected
        assert!(limiter.check_at("admin-2", t0).is_ok());

        // Window has slid past the first requests
        assert!(limiter.check_at("admin-1", t0 + Duration::from_secs(11)).is_ok());
    }

    #[test]
    fn test_ban_and_reset() {
        let limiter = create_test_limiter();
        let t0 = Instant::now();

        for _ in 0..3 {
            limiter.check_at("ban_test", t0).unwrap();
        }
        // Two violations trigger the ban
        assert!(limiter.check_at("ban_test", t0).is_err());
        assert!(limiter.check_at("ban_test", t0).is_err());

        // Still banned after the window slid
        let later = t0 + Duration::from_secs(20);
        assert_eq!(limiter.check_at("ban_test", later), Err(RateLimitError::TemporaryBan));

        limiter.reset("ban_test");
        assert!(limiter.check_at("ban_test", later).is_ok());
    }

    #[test]
    fn test_ban_expires() {
        let limiter = create_test_limiter();
        let t0 = Instant::now();
        for _ in 0..5 {
            let _ = limiter.check_at("k", t0);
        }
        assert_eq!(limiter.check_at("k", t0 + Duration::from_secs(30)), Err(RateLimitError::TemporaryBan));
        assert!(limiter.check_at("k", t0 + Duration::from_secs(61)).is_ok());
    }

    #[test]
    fn test_cleanup_stale_entries() {
        let limiter = create_test_limiter();
        let t0 = Instant::now();
        limiter.check_at("idle", t0).unwrap();
        assert_eq!(limiter.tracked_keys(), 1);

        limiter.cleanup_stale_entries_at(t0 + Duration::from_secs(5));
        assert_eq!(limiter.tracked_keys(), 1);

        limiter.cleanup_stale_entries_at(t0 + Duration::from_secs(11));
        assert_eq!(limiter.tracked_keys(), 0);
    }
}
