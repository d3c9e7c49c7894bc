//! Inverter Poller
//!
//! Drives the fetch → parse → publish cycle for one inverter.
//!
//! # States
//!
//! ```text
//!            tick             200 + parsed
//!   Idle ───────────► Fetching ────────────► Success
//!                        │
//!                        │ transport error / non-200 / parse error
//!                        ▼
//!                      Failed
//! ```
//!
//! `Success` and `Failed` are resting states until the next tick.
//!
//! # Guarantees
//!
//! - **Single-flight**: one cycle at a time per inverter. A second caller waits
//!   for the running cycle to finish before starting its own.
//! - **Stale over unavailable**: a failed cycle leaves the [`SnapshotStore`]
//!   untouched.
//! - **Setup vs update**: the first fetch ([`Poller::setup`]) reports a
//!   [`SetupError`] so the caller can tell "retry later" from "reconfigure".
//!   Later cycles report [`UpdateFailed`] and never stop the loop.

use crate::error::{SetupError, UpdateFailed};
use crate::snapshot::SnapshotStore;
use crate::solax::client::SolaxClient;
use crate::solax::types::RawSnapshot;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Poll cycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollState {
    Idle,
    Fetching,
    Success,
    Failed,
}

/// Result of one poll cycle.
pub type PollResult = Result<Arc<RawSnapshot>, UpdateFailed>;

pub struct Poller {
    client: SolaxClient,
    store: SnapshotStore,
    state: watch::Sender<PollState>,
    in_flight: Mutex<()>,
}

impl Poller {
    pub fn new(client: SolaxClient, store: SnapshotStore) -> Self {
        let (state, _) = watch::channel(PollState::Idle);
        Self {
            client,
            store,
            state,
            in_flight: Mutex::new(()),
        }
    }

    pub fn client(&self) -> &SolaxClient {
        &self.client
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn state(&self) -> PollState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PollState> {
        self.state.subscribe()
    }

    /// Run one cycle, publishing the snapshot on success.
    async fn cycle(&self) -> crate::error::Result<Arc<RawSnapshot>> {
        let _guard = self.in_flight.lock().await;
        self.state.send_replace(PollState::Fetching);

        match self.client.fetch_realtime().await {
            Ok(snapshot) => {
                let snapshot = self.store.publish(snapshot);
                self.state.send_replace(PollState::Success);
                Ok(snapshot)
            }
            Err(e) => {
                self.state.send_replace(PollState::Failed);
                Err(e)
            }
        }
    }

    /// First fetch for a freshly configured inverter.
    pub async fn setup(&self) -> Result<Arc<RawSnapshot>, SetupError> {
        let host = self.client.connection().host();
        match self.cycle().await {
            Ok(snapshot) => {
                info!(
                    "Connected to Solax inverter at {} ({} fields)",
                    host,
                    snapshot.len()
                );
                Ok(snapshot)
            }
            Err(e) => Err(SetupError::from(e)),
        }
    }

    /// One scheduled update. Failures are logged and returned, never propagated further.
    pub async fn poll_once(&self) -> PollResult {
        match self.cycle().await {
            Ok(snapshot) => {
                debug!("Polled {} fields from inverter", snapshot.len());
                Ok(snapshot)
            }
            Err(e) => {
                let failed = UpdateFailed::from(e);
                warn!(
                    "Polling {} failed: {}",
                    self.client.connection().host(),
                    failed.message
                );
                Err(failed)
            }
        }
    }

    /// Poll on a fixed period until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// `on_cycle` sees the result of every completed cycle. A cycle still running
    /// when shutdown arrives is abandoned.
    pub async fn run<F>(
        self: Arc<Self>,
        period: Duration,
        mut shutdown: watch::Receiver<bool>,
        mut on_cycle: F,
    ) where
        F: FnMut(&PollResult),
    {
        // The setup fetch already produced a snapshot; the first tick is one period out.
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            }

            tokio::select! {
                result = self.poll_once() => on_cycle(&result),
                changed = shutdown.changed() => {
                    debug!("Abandoning in-flight poll on shutdown");
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Poll loop for {} stopped", self.client.connection().host());
    }
}
