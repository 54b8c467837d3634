//! Fixed-window rate limiting for auth flows.
//!
//! Flow Overview:
//! 1) The first request for a key opens a window: `count = 1`,
//!    `reset_at = now + window`.
//! 2) Requests inside the window increment `count`; once it passes the limit
//!    the request is denied until `reset_at`.
//! 3) A request at or after `reset_at` opens a fresh window.
//! 4) `RateLimitSweeper` periodically drops expired windows so the map stays
//!    bounded by the number of recently active clients.
//!
//! Storage is behind `RateLimitStore`. The in-memory store is only correct for
//! a single instance; a multi-instance deployment needs a shared store that
//! offers the same atomic per-key update.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use tokio::{task::JoinHandle, time::interval};
use tracing::debug;

use super::utils::unix_now;

pub const LOGIN_LIMIT: u32 = 5;
pub const LOGIN_WINDOW: Duration = Duration::from_secs(15 * 60);
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_at: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: u64,
}

impl RateLimitDecision {
    /// Seconds until the window resets, never zero for a denied request.
    #[must_use]
    pub fn retry_after(&self, now: u64) -> u64 {
        self.reset_at.saturating_sub(now).max(1)
    }
}

/// Backing storage for rate-limit windows.
pub trait RateLimitStore: Send + Sync {
    /// Atomically replace the entry for `key` with `apply(current)` and return it.
    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<RateLimitEntry>) -> RateLimitEntry,
    ) -> RateLimitEntry;

    /// Drop every entry whose window ended at or before `now`.
    fn remove_expired(&self, now: u64) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

impl MemoryRateLimitStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimitStore for MemoryRateLimitStore {
    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<RateLimitEntry>) -> RateLimitEntry,
    ) -> RateLimitEntry {
        // A poisoned lock only means another request panicked mid-update; the
        // counters are still usable.
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let next = apply(entries.get(key).copied());
        entries.insert(key.to_string(), next);
        next
    }

    fn remove_expired(&self, now: u64) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| entry.reset_at > now);
        before - entries.len()
    }

    fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("entries", &self.store.len())
            .finish()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Arc::new(MemoryRateLimitStore::new()))
    }
}

impl RateLimiter {
    #[must_use]
    pub fn new(store: Arc<dyn RateLimitStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &dyn RateLimitStore {
        self.store.as_ref()
    }

    /// Count a request for `identifier` against `limit` per `window`.
    #[must_use]
    pub fn check(&self, identifier: &str, limit: u32, window: Duration) -> RateLimitDecision {
        self.check_at(identifier, limit, window, unix_now())
    }

    /// Same as `check` with an explicit clock, in unix seconds.
    #[must_use]
    pub fn check_at(
        &self,
        identifier: &str,
        limit: u32,
        window: Duration,
        now: u64,
    ) -> RateLimitDecision {
        let entry = self.store.update(identifier, &mut |current| match current {
            Some(entry) if now < entry.reset_at => RateLimitEntry {
                count: entry.count.saturating_add(1),
                reset_at: entry.reset_at,
            },
            _ => RateLimitEntry {
                count: 1,
                reset_at: now.saturating_add(window.as_secs()),
            },
        });

        if entry.count > limit {
            RateLimitDecision {
                allowed: false,
                limit,
                remaining: 0,
                reset_at: entry.reset_at,
            }
        } else {
            RateLimitDecision {
                allowed: true,
                limit,
                remaining: limit - entry.count,
                reset_at: entry.reset_at,
            }
        }
    }

    /// Remove expired windows; returns how many were dropped.
    pub fn sweep(&self, now: u64) -> usize {
        let removed = self.store.remove_expired(now);
        if removed > 0 {
            debug!("rate limit sweep removed {removed} expired entries");
        }
        removed
    }
}

/// Background task that sweeps expired windows on a fixed interval.
///
/// The task stops when `stop` is called or the sweeper is dropped.
#[derive(Debug)]
pub struct RateLimitSweeper {
    handle: Option<JoinHandle<()>>,
}

impl RateLimitSweeper {
    /// Spawn the sweep loop on the current tokio runtime.
    #[must_use]
    pub fn start(limiter: RateLimiter, every: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(every);
            // The first tick completes immediately; nothing can be expired yet.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                limiter.sweep(unix_now());
            }
        });

        Self {
            handle: Some(handle),
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for RateLimitSweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(900);
    const NOW: u64 = 1_700_000_000;

    #[test]
    fn fixed_window_counts_down_then_denies() {
        let limiter = RateLimiter::default();

        let remaining: Vec<u32> = (0..5)
            .map(|offset| {
                let decision = limiter.check_at("1.2.3.4", 5, WINDOW, NOW + offset);
                assert!(decision.allowed);
                assert_eq!(decision.reset_at, NOW + 900);
                decision.remaining
            })
            .collect();
        assert_eq!(remaining, vec![4, 3, 2, 1, 0]);

        let denied = limiter.check_at("1.2.3.4", 5, WINDOW, NOW + 10);
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert_eq!(denied.reset_at, NOW + 900);
        assert_eq!(denied.retry_after(NOW + 10), 890);
    }

    #[test]
    fn window_resets_once_reset_at_passes() {
        let limiter = RateLimiter::default();
        for _ in 0..6 {
            let _ = limiter.check_at("client", 5, WINDOW, NOW);
        }

        let decision = limiter.check_at("client", 5, WINDOW, NOW + 900);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);
        assert_eq!(decision.reset_at, NOW + 1800);
    }

    #[test]
    fn identifiers_are_independent() {
        let limiter = RateLimiter::default();
        for _ in 0..6 {
            let _ = limiter.check_at("a", 5, WINDOW, NOW);
        }
        assert!(!limiter.check_at("a", 5, WINDOW, NOW).allowed);
        assert!(limiter.check_at("b", 5, WINDOW, NOW).allowed);
    }

    #[test]
    fn sweep_drops_only_expired_windows() {
        let limiter = RateLimiter::default();
        let _ = limiter.check_at("old", 5, WINDOW, NOW);
        let _ = limiter.check_at("fresh", 5, WINDOW, NOW + 600);
        assert_eq!(limiter.store().len(), 2);

        assert_eq!(limiter.sweep(NOW + 899), 0);
        assert_eq!(limiter.sweep(NOW + 900), 1);
        assert_eq!(limiter.store().len(), 1);
        assert_eq!(limiter.sweep(NOW + 1500), 1);
        assert!(limiter.store().is_empty());
    }

    #[test]
    fn denied_requests_keep_counting_within_window() {
        let limiter = RateLimiter::default();
        for _ in 0..10 {
            let _ = limiter.check_at("noisy", 2, WINDOW, NOW);
        }
        // Still denied, and the window was not extended by the extra hits.
        let decision = limiter.check_at("noisy", 2, WINDOW, NOW + 1);
        assert!(!decision.allowed);
        assert_eq!(decision.reset_at, NOW + 900);
    }

    #[tokio::test]
    async fn sweeper_runs_until_stopped() {
        let limiter = RateLimiter::default();
        // Window already over by the time the sweeper ticks.
        let _ = limiter.check_at("gone", 5, Duration::from_secs(1), 1);
        assert_eq!(limiter.store().len(), 1);

        let mut sweeper = RateLimitSweeper::start(limiter.clone(), Duration::from_millis(10));
        assert!(sweeper.is_running());

        for _ in 0..100 {
            if limiter.store().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(limiter.store().is_empty());

        sweeper.stop();
        assert!(!sweeper.is_running());
    }
}
