// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Background sweep of expired rate windows.
//!
//! The sweep only bounds memory: `check` already treats an expired window
//! as absent. The task belongs to whoever holds the [`SweeperHandle`] and
//! stops when the handle is shut down or dropped.

use crate::limiter::RateLimiter;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Shortest period the sweeper will tick at.
pub const MIN_SWEEP_PERIOD: Duration = Duration::from_millis(1);

/// Periodic sweeper for a [`RateLimiter`].
pub struct Sweeper;

impl Sweeper {
    /// Start sweeping `limiter` every `period`, first after one full period.
    ///
    /// Periods shorter than [`MIN_SWEEP_PERIOD`] are raised to it.
    pub fn spawn(limiter: RateLimiter, period: Duration) -> SweeperHandle {
        if period < MIN_SWEEP_PERIOD {
            warn!(?period, "Sweep period too short, using minimum");
        }
        let period = period.max(MIN_SWEEP_PERIOD);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        let removed = limiter.sweep().await;
                        if removed > 0 {
                            debug!(removed, "Swept expired rate windows");
                        }
                    }
                }
            }

            info!("Rate window sweeper stopped");
        });

        SweeperHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Owner of a running sweeper task.
pub struct SweeperHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for the task to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "Sweeper task ended abnormally");
            }
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
