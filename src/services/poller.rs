//! Timer-driven polling of the history reconciler.
//!
//! DESIGN
//! ======
//! The first tick fires immediately, then every `interval`. Each tick spawns
//! its own round task instead of awaiting the previous one, so a slow round
//! never delays the schedule; overlapping rounds are ordered by the
//! reconciler's sequence guard.
//!
//! Stopping deactivates the reconciler first and then aborts the timer loop.
//! Round tasks already in flight run to completion and are discarded.

#[cfg(test)]
#[path = "poller_test.rs"]
mod poller_test;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::history::HistoryReconciler;
use crate::config::DEFAULT_POLL_INTERVAL_SECS;

/// Owns the polling loop. Dropping it stops polling.
pub struct Poller {
    reconciler: Arc<HistoryReconciler>,
    task: JoinHandle<()>,
}

impl Poller {
    /// Stop scheduling rounds and discard any round still in flight.
    pub fn stop(&self) {
        if self.reconciler.is_active() {
            self.reconciler.deactivate();
            info!("history poller stopped");
        }
        self.task.abort();
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Activate polling: one round now, then one per `interval`. A zero
/// interval falls back to the default poll interval.
#[must_use]
pub fn spawn_poller(reconciler: Arc<HistoryReconciler>, interval: Duration) -> Poller {
    let interval = if interval.is_zero() {
        warn!("zero poll interval; using default");
        Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS)
    } else {
        interval
    };
    info!(interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX), "history poller started");
    let task = tokio::spawn({
        let reconciler = reconciler.clone();
        async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if !reconciler.is_active() {
                    break;
                }
                let round = reconciler.clone();
                tokio::spawn(async move {
                    round.poll_once().await;
                });
            }
        }
    });
    Poller { reconciler, task }
}
