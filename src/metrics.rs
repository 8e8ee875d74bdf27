// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics for the rate limiter.
//!
//! Metrics live in their own [`Registry`] owned by a [`Metrics`] value that
//! is handed to the limiter, rather than in the process-global registry.

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("Metrics output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Counters and gauges recorded by the limiter.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    checks: IntCounterVec,
    swept: IntCounter,
    evicted: IntCounter,
    tracked_keys: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let checks = IntCounterVec::new(
            Opts::new("rate_limit_checks_total", "Rate limit checks by outcome"),
            &["outcome"],
        )?;
        let swept = IntCounter::new(
            "rate_limit_swept_total",
            "Expired windows removed by the periodic sweep",
        )?;
        let evicted = IntCounter::new(
            "rate_limit_evicted_total",
            "Windows evicted to stay under the tracked key bound",
        )?;
        let tracked_keys = IntGauge::new(
            "rate_limit_tracked_keys",
            "Client windows currently tracked",
        )?;

        registry.register(Box::new(checks.clone()))?;
        registry.register(Box::new(swept.clone()))?;
        registry.register(Box::new(evicted.clone()))?;
        registry.register(Box::new(tracked_keys.clone()))?;

        Ok(Self {
            registry,
            checks,
            swept,
            evicted,
            tracked_keys,
        })
    }

    pub fn record_check(&self, allowed: bool) {
        let outcome = if allowed { "allowed" } else { "limited" };
        self.checks.with_label_values(&[outcome]).inc();
    }

    pub fn record_sweep(&self, removed: usize) {
        self.swept.inc_by(removed as u64);
    }

    pub fn record_eviction(&self, evicted: usize) {
        self.evicted.inc_by(evicted as u64);
    }

    pub fn set_tracked_keys(&self, tracked: usize) {
        self.tracked_keys.set(tracked as i64);
    }

    /// Render every metric in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
