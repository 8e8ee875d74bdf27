// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Inquiry Rate Limiter Service
//!
//! Fronts the public contact, product inquiry and service inquiry forms of
//! the solar site with a per-client fixed-window limiter:
//!
//! - 5 submissions per form per client per 60s window (default)
//! - 429 with `Retry-After` once a client's window is exhausted
//! - `X-RateLimit-*` headers on every form response
//! - Periodic sweep of expired windows
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables, see
//! [`Config::from_env`](inquiry_rate_limiter::Config::from_env). The most
//! common ones:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `RATE_LIMIT_INTERVAL_MS`: Window length (default: 60000)
//! - `CONTACT_LIMIT`: Contact submissions per window (default: 5)
//! - `TRUST_FORWARDED_HEADERS`: Key clients by `X-Forwarded-For` (default: true)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use inquiry_rate_limiter::{
    config::Config,
    handlers::{router, AppState},
    limiter::RateLimiter,
    metrics::Metrics,
    sweeper::Sweeper,
    validator::InquiryValidator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        bind_addr = %config.bind_addr,
        interval_ms = config.rate_limit.interval_ms,
        sweep_interval_ms = config.rate_limit.sweep_interval_ms,
        max_tracked_keys = ?config.rate_limit.max_tracked_keys,
        contact_limit = config.forms.contact,
        product_inquiry_limit = config.forms.product_inquiry,
        service_inquiry_limit = config.forms.service_inquiry,
        "Starting inquiry rate limiter"
    );

    // Create application state
    let metrics = if config.metrics.enabled {
        Some(Metrics::new()?)
    } else {
        None
    };

    let mut limiter = RateLimiter::new(config.rate_limit.clone());
    if let Some(metrics) = &metrics {
        limiter = limiter.with_metrics(metrics.clone());
    }
    let validator = InquiryValidator::new(config.validation.clone());

    let sweeper = Sweeper::spawn(limiter.clone(), config.rate_limit.sweep_interval());

    let state = Arc::new(AppState {
        limiter,
        validator,
        config: config.clone(),
        metrics,
    });

    let app = router(state);

    // Start server
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.shutdown().await;
    info!("Inquiry rate limiter stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
