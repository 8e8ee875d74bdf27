// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Flood patterns for abuse testing.

/// Flood pattern configuration.
#[derive(Debug, Clone)]
pub struct FloodConfig {
    /// Total number of submissions to send
    pub total_requests: usize,
    /// Simulated milliseconds between submissions
    pub spacing_ms: i64,
    /// Number of unique client IPs to rotate through
    pub unique_ips: usize,
    /// Fraction of submissions that fail validation (0.0-1.0)
    pub junk_ratio: f64,
}

impl Default for FloodConfig {
    fn default() -> Self {
        Self {
            total_requests: 100,
            spacing_ms: 100,
            unique_ips: 1,
            junk_ratio: 0.0,
        }
    }
}

/// Predefined flood patterns.
impl FloodConfig {
    /// Single IP flood - one client hammering the contact form.
    pub fn single_ip_flood() -> Self {
        Self {
            total_requests: 200,
            spacing_ms: 10,
            unique_ips: 1,
            ..Default::default()
        }
    }

    /// Distributed flood - many clients, a few submissions each.
    pub fn distributed_flood() -> Self {
        Self {
            total_requests: 500,
            spacing_ms: 20,
            unique_ips: 100,
            ..Default::default()
        }
    }

    /// Junk flood - mostly invalid submissions from a handful of clients.
    pub fn junk_flood() -> Self {
        Self {
            total_requests: 100,
            spacing_ms: 50,
            unique_ips: 5,
            junk_ratio: 1.0,
        }
    }

    /// Slow drip - one submission per window boundary, never throttled.
    pub fn slow_drip(interval_ms: i64) -> Self {
        Self {
            total_requests: 20,
            spacing_ms: interval_ms,
            unique_ips: 1,
            ..Default::default()
        }
    }

    /// Simulated duration of the whole flood.
    pub fn simulated_duration_ms(&self) -> i64 {
        self.spacing_ms * self.total_requests as i64
    }
}

/// Simple deterministic "random" based on index and ratio.
pub fn rand_bool(ratio: f64, index: usize) -> bool {
    if ratio >= 1.0 {
        true
    } else if ratio <= 0.0 {
        false
    } else {
        (index as f64 * 0.618033988749895) % 1.0 < ratio
    }
}
