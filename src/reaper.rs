//! Background reclamation of clearances that expired unconsumed.

use crate::tower::ControlTower;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::trace;

/// Sweep the tower's ledger every `sweep_interval` until shutdown.
///
/// Each pass snapshots the expired entries under the ledger lock and then
/// revokes them one by one; revocation is idempotent, so a clearance that
/// gets consumed between snapshot and revoke is simply skipped.
pub(crate) fn spawn(
    tower: Arc<ControlTower>,
    sweep_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; swallow it so the first sweep
        // happens one full interval after the tower comes up.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    trace!("reaper sweep");
                    tower.sweep_expired();
                }
                _ = shutdown.changed() => break,
            }
        }
    })
}
