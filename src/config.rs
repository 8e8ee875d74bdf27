// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the inquiry rate limiter.
//!
//! Every field has a default, so an empty environment yields a working
//! service: a 60 second window, 5 submissions per form per window, and a
//! sweep once a minute.

use crate::validator::InquiryKind;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors. The service refuses to start on any of these.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Invalid bind address: {0}")]
    InvalidBindAddr(String),

    #[error("Invalid setting: {0}")]
    Invalid(&'static str),
}

/// Configuration for the inquiry rate limiter service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Per-form submission limits
    #[serde(default)]
    pub forms: FormLimits,

    /// Client identification
    #[serde(default)]
    pub client: ClientConfig,

    /// Submission validation
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Fixed-window limiter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Window length in milliseconds (default: 60000)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Expected number of distinct clients per window (default: 500).
    /// Only used to size the window map; not a cap.
    #[serde(default = "default_unique_token_per_interval")]
    pub unique_token_per_interval: usize,

    /// How often expired windows are swept, in milliseconds (default: 60000)
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,

    /// Hard bound on tracked clients (default: unbounded)
    #[serde(default)]
    pub max_tracked_keys: Option<usize>,
}

/// Submissions allowed per client per window, by form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormLimits {
    #[serde(default = "default_form_limit")]
    pub contact: u32,

    #[serde(default = "default_form_limit")]
    pub product_inquiry: u32,

    #[serde(default = "default_form_limit")]
    pub service_inquiry: u32,
}

/// How the limiter key is derived from a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Honour `X-Forwarded-For` / `X-Real-IP` set by the hosting proxy
    /// (default: true)
    #[serde(default = "default_true")]
    pub trust_forwarded_headers: bool,
}

/// Validation configuration for inquiry submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Accepted content types (default: JSON and url-encoded forms)
    #[serde(default = "default_content_types")]
    pub accepted_content_types: Vec<String>,

    /// Maximum length of short fields such as name or email (default: 200)
    #[serde(default = "default_max_field_len")]
    pub max_field_len: usize,

    /// Maximum length of the free-text message (default: 5000)
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_interval_ms() -> u64 {
    60_000
}

fn default_unique_token_per_interval() -> usize {
    500
}

fn default_sweep_interval_ms() -> u64 {
    60_000
}

fn default_form_limit() -> u32 {
    5
}

fn default_content_types() -> Vec<String> {
    vec![
        "application/json".to_string(),
        "application/x-www-form-urlencoded".to_string(),
    ]
}

fn default_max_field_len() -> usize {
    200
}

fn default_max_message_len() -> usize {
    5000
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            rate_limit: RateLimitConfig::default(),
            forms: FormLimits::default(),
            client: ClientConfig::default(),
            validation: ValidationConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            unique_token_per_interval: default_unique_token_per_interval(),
            sweep_interval_ms: default_sweep_interval_ms(),
            max_tracked_keys: None,
        }
    }
}

impl Default for FormLimits {
    fn default() -> Self {
        Self {
            contact: default_form_limit(),
            product_inquiry: default_form_limit(),
            service_inquiry: default_form_limit(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            trust_forwarded_headers: default_true(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            accepted_content_types: default_content_types(),
            max_field_len: default_max_field_len(),
            max_message_len: default_max_message_len(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl RateLimitConfig {
    /// Get the window duration
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Get the sweep period
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

impl FormLimits {
    /// Submissions allowed per window for `kind`.
    pub fn limit_for(&self, kind: InquiryKind) -> u32 {
        match kind {
            InquiryKind::Contact => self.contact,
            InquiryKind::ProductInquiry => self.product_inquiry,
            InquiryKind::ServiceInquiry => self.service_inquiry,
        }
    }
}

impl Config {
    /// Load configuration from environment variables over the defaults.
    ///
    /// - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
    /// - `RATE_LIMIT_INTERVAL_MS`: Window length (default: 60000)
    /// - `RATE_LIMIT_UNIQUE_TOKENS`: Expected clients per window (default: 500)
    /// - `RATE_LIMIT_SWEEP_INTERVAL_MS`: Sweep period (default: 60000)
    /// - `RATE_LIMIT_MAX_KEYS`: Hard bound on tracked clients (default: none)
    /// - `CONTACT_LIMIT`, `PRODUCT_INQUIRY_LIMIT`, `SERVICE_INQUIRY_LIMIT`:
    ///   Submissions per window (default: 5)
    /// - `TRUST_FORWARDED_HEADERS`: Use proxy headers for client IP (default: true)
    /// - `METRICS_ENABLED`: Serve `/metrics` (default: true)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr;
        }

        let rl = &mut config.rate_limit;
        overlay(&lookup, "RATE_LIMIT_INTERVAL_MS", &mut rl.interval_ms)?;
        overlay(&lookup, "RATE_LIMIT_UNIQUE_TOKENS", &mut rl.unique_token_per_interval)?;
        overlay(&lookup, "RATE_LIMIT_SWEEP_INTERVAL_MS", &mut rl.sweep_interval_ms)?;
        if let Some(max) = parse_var(&lookup, "RATE_LIMIT_MAX_KEYS")? {
            rl.max_tracked_keys = Some(max);
        }

        overlay(&lookup, "CONTACT_LIMIT", &mut config.forms.contact)?;
        overlay(&lookup, "PRODUCT_INQUIRY_LIMIT", &mut config.forms.product_inquiry)?;
        overlay(&lookup, "SERVICE_INQUIRY_LIMIT", &mut config.forms.service_inquiry)?;
        overlay(
            &lookup,
            "TRUST_FORWARDED_HEADERS",
            &mut config.client.trust_forwarded_headers,
        )?;
        overlay(&lookup, "METRICS_ENABLED", &mut config.metrics.enabled)?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the limiter cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit.interval_ms == 0 {
            return Err(ConfigError::Invalid("rate_limit.interval_ms must be positive"));
        }
        if self.rate_limit.sweep_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit.sweep_interval_ms must be positive",
            ));
        }
        if self.rate_limit.max_tracked_keys == Some(0) {
            return Err(ConfigError::Invalid("rate_limit.max_tracked_keys must be positive"));
        }
        if self.forms.contact == 0 || self.forms.product_inquiry == 0 || self.forms.service_inquiry == 0
        {
            return Err(ConfigError::Invalid("form limits must be positive"));
        }
        if !self.metrics.path.starts_with('/') {
            return Err(ConfigError::Invalid("metrics.path must start with '/'"));
        }
        self.socket_addr().map(|_| ())
    }

    /// Parsed bind address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(self.bind_addr.clone()))
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
    }
}

fn overlay<F, T>(lookup: &F, name: &'static str, slot: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(value) = parse_var(lookup, name)? {
        *slot = value;
    }
    Ok(())
}
