// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter for the inquiry endpoints.
//!
//! Each client key owns at most one window. A window starts on the first
//! check after the key was unseen or expired, lasts `interval_ms`, and
//! admits `limit` checks. Its reset time never moves while it is live.
//!
//! The window map sits behind a single lock, and the lookup, limit test and
//! increment of one check all happen under one guard, so concurrent checks
//! for the same key cannot admit more than `limit` requests per window.

use crate::clock::{Clock, SystemClock};
use crate::config::RateLimitConfig;
use crate::metrics::Metrics;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Result of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitResult {
    /// Whether this check was admitted
    pub success: bool,
    /// The limit the check was made against
    pub limit: u32,
    /// Checks still available in the current window
    pub remaining: u32,
    /// When the current window ends, in epoch milliseconds
    pub reset: i64,
}

impl RateLimitResult {
    /// Time until the window resets, rounded up to whole seconds.
    pub fn retry_after(&self, now_millis: i64) -> Duration {
        let millis = self.reset.saturating_sub(now_millis).max(0) as u64;
        Duration::from_secs(millis.div_ceil(1000))
    }

    /// Window reset as epoch seconds, rounded up.
    pub fn reset_secs(&self) -> i64 {
        self.reset.div_euclid(1000) + i64::from(self.reset.rem_euclid(1000) != 0)
    }
}

/// Per-key window state.
#[derive(Debug, Clone, Copy)]
struct RateWindow {
    /// Checks admitted in this window
    count: u32,
    /// Epoch milliseconds at which the window expires
    reset_at: i64,
}

impl RateWindow {
    fn starting_at(now: i64, interval: i64) -> Self {
        Self {
            count: 0,
            reset_at: now.saturating_add(interval),
        }
    }

    fn is_expired(&self, now: i64) -> bool {
        self.reset_at <= now
    }
}

/// Thread-safe fixed-window rate limiter.
///
/// Cloning is cheap and every clone shares the same windows.
#[derive(Clone)]
pub struct RateLimiter {
    /// Configuration
    config: RateLimitConfig,
    /// Time source
    clock: Arc<dyn Clock>,
    /// Per-key windows
    windows: Arc<RwLock<HashMap<String, RateWindow>>>,
    metrics: Option<Metrics>,
}

impl RateLimiter {
    /// Create a new rate limiter reading the wall clock.
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a new rate limiter reading time from `clock`.
    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        let capacity = config.unique_token_per_interval;
        Self {
            config,
            clock,
            windows: Arc::new(RwLock::new(HashMap::with_capacity(capacity))),
            metrics: None,
        }
    }

    /// Record checks, sweeps and evictions into `metrics`.
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Current time according to the limiter's clock.
    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Time until the window behind `result` resets.
    pub fn retry_after(&self, result: &RateLimitResult) -> Duration {
        result.retry_after(self.now_millis())
    }

    fn interval_millis(&self) -> i64 {
        i64::try_from(self.config.interval().as_millis()).unwrap_or(i64::MAX)
    }

    /// Check and consume one unit of quota for `key`.
    ///
    /// The first `limit` checks in a window succeed; later ones fail without
    /// touching the count until the window resets. Callers pass a non-empty
    /// key and a positive limit; a limit of zero rejects every check.
    pub async fn check(&self, key: &str, limit: u32) -> RateLimitResult {
        let now = self.clock.now_millis();
        let interval = self.interval_millis();

        let mut windows = self.windows.write().await;

        if !windows.contains_key(key) {
            self.make_room(&mut windows, now);
        }

        let window = windows
            .entry(key.to_owned())
            .and_modify(|w| {
                if w.is_expired(now) {
                    *w = RateWindow::starting_at(now, interval);
                }
            })
            .or_insert_with(|| RateWindow::starting_at(now, interval));

        let current = window.count;
        let limited = current >= limit;
        if !limited {
            window.count += 1;
        }

        let result = RateLimitResult {
            success: !limited,
            limit,
            remaining: limit
                .saturating_sub(current)
                .saturating_sub(u32::from(!limited)),
            reset: window.reset_at,
        };
        let tracked = windows.len();
        drop(windows);

        debug!(
            key,
            limit,
            remaining = result.remaining,
            success = result.success,
            reset = result.reset,
            "Rate limit check"
        );

        if let Some(metrics) = &self.metrics {
            metrics.record_check(result.success);
            metrics.set_tracked_keys(tracked);
        }

        result
    }

    /// Keep the map under `max_tracked_keys` before a new key is inserted.
    ///
    /// Expired windows go first; if that is not enough, the windows closest
    /// to their reset are evicted.
    fn make_room(&self, windows: &mut HashMap<String, RateWindow>, now: i64) {
        let Some(max) = self.config.max_tracked_keys else {
            return;
        };
        if windows.len() < max {
            return;
        }

        let before = windows.len();
        windows.retain(|_, w| !w.is_expired(now));

        while windows.len() >= max {
            let oldest = windows
                .iter()
                .min_by_key(|(_, w)| w.reset_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => {
                    windows.remove(&key);
                }
                None => break,
            }
        }

        let evicted = before - windows.len();
        debug!(evicted, max, "Evicted rate windows to admit a new key");
        if let Some(metrics) = &self.metrics {
            metrics.record_eviction(evicted);
        }
    }

    /// Remove every expired window. Returns the number removed.
    ///
    /// Live windows are left untouched. Called periodically by the sweeper.
    pub async fn sweep(&self) -> usize {
        let now = self.clock.now_millis();

        let mut windows = self.windows.write().await;
        let before = windows.len();
        windows.retain(|_, w| !w.is_expired(now));
        let removed = before - windows.len();
        let tracked = windows.len();
        drop(windows);

        if let Some(metrics) = &self.metrics {
            metrics.record_sweep(removed);
            metrics.set_tracked_keys(tracked);
        }

        removed
    }

    /// Number of windows currently held.
    pub async fn tracked_keys(&self) -> usize {
        self.windows.read().await.len()
    }
}
