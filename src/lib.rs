// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Inquiry Rate Limiter
//!
//! Abuse mitigation for the public submission endpoints of the solar site
//! (contact, product inquiry and service inquiry forms):
//!
//! - Fixed-window request counting keyed by client IP (60s window default)
//! - Per-form limits (5 submissions per window default)
//! - Periodic sweep of expired windows owned by an explicit task
//! - Minimal submission validation once a request is admitted
//! - Prometheus counters for checks, sweeps and evictions

pub mod client;
pub mod clock;
pub mod config;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod sweeper;
pub mod validator;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use limiter::{RateLimitResult, RateLimiter};
pub use sweeper::{Sweeper, SweeperHandle};
pub use validator::{InquiryKind, InquiryValidator, ValidationResult};
