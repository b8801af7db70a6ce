//! The control tower: atomic paired reservation, clearance consumption,
//! revocation, and supervised teardown.
//!
//! Locking discipline is two-tier. One manager-wide ledger lock serializes
//! every mutating tower operation, which is what makes the two-resource
//! reservation atomic. Each runway/stand additionally guards its own state
//! transitions, because operation tasks touch resources without the ledger
//! lock. Resources never call back into the tower, so the manager lock and
//! the resource locks are only ever taken in that order.

use crate::{
    clearance::ClearanceToken,
    config::TowerConfig,
    error::{Error, Result},
    reaper,
    resource::{ParkingStand, Runway, RunwayId, StandId, StandState},
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

/// Answer to a clearance request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directive {
    /// Resources or identity precondition unavailable right now; poll again.
    Hold,
    /// Clearance granted; the accompanying token is live.
    Proceed,
}

/// Outcome of presenting a clearance to `perform_landing`/`perform_take_off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpsResult {
    /// Operation launched; it completes on its own after the configured
    /// duration.
    Success,
    /// Structurally malformed token, or one naming resources this tower
    /// does not own. Not retryable with the same token.
    InvalidParams,
    /// The validity window elapsed before consumption. The clearance has
    /// been revoked; request a new one.
    ExpiredToken,
}

#[derive(Debug, Clone, Copy)]
enum OpsKind {
    Landing,
    TakeOff,
}

/// Owns the runway and stand pools, the outstanding-clearance ledger, the
/// reaper, and the in-flight operation tasks.
///
/// Construction spawns the reaper and therefore needs a Tokio runtime.
/// Call [`ControlTower::shutdown`] to stop the reaper and join every
/// in-flight operation; until then the reaper keeps the tower alive
/// through its `Arc`.
#[derive(Debug)]
pub struct ControlTower {
    runways: Vec<Arc<Runway>>,
    stands: Vec<Arc<ParkingStand>>,
    config: TowerConfig,
    /// Outstanding clearances. Unique per aircraft id while present.
    ledger: Mutex<Vec<ClearanceToken>>,
    /// In-flight operation tasks, joined at shutdown.
    operations: Mutex<Vec<JoinHandle<()>>>,
    reaper: Mutex<Option<JoinHandle<()>>>,
    shutdown_tx: watch::Sender<bool>,
}

impl ControlTower {
    /// Build a tower over fixed pools and start its reaper.
    ///
    /// # Errors
    /// [`Error::EmptyPool`] when either pool is empty.
    pub fn new(
        runways: Vec<Runway>,
        stands: Vec<ParkingStand>,
        config: TowerConfig,
    ) -> Result<Arc<Self>> {
        if runways.is_empty() || stands.is_empty() {
            return Err(Error::EmptyPool {
                runways: runways.len(),
                stands: stands.len(),
            });
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let tower = Arc::new(Self {
            runways: runways.into_iter().map(Arc::new).collect(),
            stands: stands.into_iter().map(Arc::new).collect(),
            config,
            ledger: Mutex::new(Vec::new()),
            operations: Mutex::new(Vec::new()),
            reaper: Mutex::new(None),
            shutdown_tx,
        });

        let handle = reaper::spawn(Arc::clone(&tower), config.sweep_interval, shutdown_rx);
        *tower.reaper.lock() = Some(handle);

        info!(
            runways = tower.runways.len(),
            stands = tower.stands.len(),
            "control tower up"
        );
        Ok(tower)
    }

    #[must_use]
    pub fn runways(&self) -> &[Arc<Runway>] {
        &self.runways
    }

    #[must_use]
    pub fn stands(&self) -> &[Arc<ParkingStand>] {
        &self.stands
    }

    /// Snapshot of the outstanding clearances.
    #[must_use]
    pub fn outstanding(&self) -> Vec<ClearanceToken> {
        self.ledger.lock().clone()
    }

    /// Reserve a runway/stand pair for an inbound aircraft.
    ///
    /// Holds when the identity is not unique (an outstanding clearance or
    /// any ground presence under the same id) or when either resource is
    /// unavailable; a half-reserved pair is released before returning, so
    /// pool occupancy after a `Hold` equals occupancy before.
    pub fn request_landing(&self, aircraft_id: &str) -> (Directive, ClearanceToken) {
        let mut ledger = self.ledger.lock();

        if !self.is_ident_unique(&ledger, aircraft_id, OpsKind::Landing) {
            debug!(aircraft_id, "landing held: identity not unique");
            return (Directive::Hold, ClearanceToken::default());
        }
        let Some(runway) = self.reserve_runway() else {
            debug!(aircraft_id, "landing held: no runway available");
            return (Directive::Hold, ClearanceToken::default());
        };
        let Some(stand) = self.reserve_stand() else {
            // Compensating release: give the runway back.
            runway.release();
            debug!(aircraft_id, "landing held: no parking stand available");
            return (Directive::Hold, ClearanceToken::default());
        };

        let token = ClearanceToken::new(
            aircraft_id,
            runway.id(),
            stand.id(),
            self.config.token_validity,
        );
        runway.assign_reservation(&token);
        stand.assign_reservation(&token);
        ledger.push(token.clone());

        debug!(aircraft_id, "landing clearance granted");
        (Directive::Proceed, token)
    }

    /// Reserve a runway for a departing aircraft already on the ground.
    ///
    /// The stand is located, not freshly reserved: the first stand whose
    /// reservation carries this aircraft id. Locating happens before the
    /// runway reservation, so the not-found branch never has anything to
    /// compensate.
    pub fn request_take_off(&self, aircraft_id: &str) -> (Directive, ClearanceToken) {
        let mut ledger = self.ledger.lock();

        if !self.is_ident_unique(&ledger, aircraft_id, OpsKind::TakeOff) {
            debug!(aircraft_id, "take-off held: clearance already outstanding");
            return (Directive::Hold, ClearanceToken::default());
        }
        let Some(stand) = self.locate_on_ground(aircraft_id) else {
            debug!(aircraft_id, "take-off held: aircraft not on the ground");
            return (Directive::Hold, ClearanceToken::default());
        };
        let Some(runway) = self.reserve_runway() else {
            debug!(aircraft_id, "take-off held: no runway available");
            return (Directive::Hold, ClearanceToken::default());
        };

        let token = ClearanceToken::new(
            aircraft_id,
            runway.id(),
            stand.id(),
            self.config.token_validity,
        );
        runway.assign_reservation(&token);
        stand.assign_reservation(&token);
        ledger.push(token.clone());

        debug!(aircraft_id, "take-off clearance granted");
        (Directive::Proceed, token)
    }

    /// Consume a landing clearance. On `Success` the physical operation
    /// runs in a detached task: runway in operation for the configured
    /// duration, then freed, then the stand marked occupied.
    pub fn perform_landing(&self, token: &ClearanceToken) -> OpsResult {
        self.perform(token, OpsKind::Landing)
    }

    /// Consume a take-off clearance. As [`perform_landing`], except the
    /// stand is freed when the operation completes.
    ///
    /// [`perform_landing`]: ControlTower::perform_landing
    pub fn perform_take_off(&self, token: &ClearanceToken) -> OpsResult {
        self.perform(token, OpsKind::TakeOff)
    }

    fn perform(&self, token: &ClearanceToken, kind: OpsKind) -> OpsResult {
        if !token.is_valid() {
            return OpsResult::InvalidParams;
        }
        // is_valid guarantees both references are present.
        let Some((runway, stand)) = token
            .runway()
            .and_then(|id| self.runway_by_id(id))
            .zip(token.stand().and_then(|id| self.stand_by_id(id)))
        else {
            warn!(
                aircraft_id = token.aircraft_id(),
                "clearance names resources this tower does not own"
            );
            return OpsResult::InvalidParams;
        };
        if token.has_expired() {
            self.revoke_token(token);
            debug!(aircraft_id = token.aircraft_id(), "clearance expired");
            return OpsResult::ExpiredToken;
        }

        // Consumption handoff: the clearance leaves the ledger before the
        // operation task runs, so a concurrent sweep cannot reclaim it.
        {
            let mut ledger = self.ledger.lock();
            if let Some(pos) = ledger.iter().position(|t| t == token) {
                ledger.swap_remove(pos);
            }
        }

        self.spawn_operation(runway, stand, token.clone(), kind);
        OpsResult::Success
    }

    /// Reclaim an unconsumed clearance. Idempotent: acts only while the
    /// token is still in the ledger, and releases each resource only while
    /// it still holds this exact token in `Reserved` state. Consumed
    /// resources are left to their operation task.
    pub fn revoke_token(&self, token: &ClearanceToken) {
        let mut ledger = self.ledger.lock();
        let Some(pos) = ledger.iter().position(|t| t == token) else {
            return;
        };

        if let Some(runway) = token.runway().and_then(|id| self.runway_by_id(id)) {
            runway.release_if_unused(token);
        }
        if let Some(stand) = token.stand().and_then(|id| self.stand_by_id(id)) {
            stand.release_if_unused(token);
        }
        ledger.swap_remove(pos);
        debug!(aircraft_id = token.aircraft_id(), "clearance revoked");
    }

    /// One reaper pass: snapshot expired ledger entries, then revoke each.
    pub(crate) fn sweep_expired(&self) {
        let expired: Vec<ClearanceToken> = {
            let ledger = self.ledger.lock();
            ledger.iter().filter(|t| t.has_expired()).cloned().collect()
        };
        if expired.is_empty() {
            return;
        }
        debug!(count = expired.len(), "reaping expired clearances");
        for token in &expired {
            self.revoke_token(token);
        }
    }

    /// Stop the reaper and join it and every in-flight operation task.
    ///
    /// # Errors
    /// [`Error::TaskJoin`] when a background task panicked.
    pub async fn shutdown(&self) -> Result<()> {
        let _ = self.shutdown_tx.send(true);

        let reaper = self.reaper.lock().take();
        if let Some(handle) = reaper {
            handle.await?;
        }
        let operations: Vec<JoinHandle<()>> = std::mem::take(&mut *self.operations.lock());
        for handle in operations {
            handle.await?;
        }
        info!("control tower shut down");
        Ok(())
    }

    /// Caller holds the ledger lock; `outstanding` is its contents.
    fn is_ident_unique(
        &self,
        outstanding: &[ClearanceToken],
        aircraft_id: &str,
        kind: OpsKind,
    ) -> bool {
        if outstanding.iter().any(|t| t.aircraft_id() == aircraft_id) {
            return false;
        }
        // Landing additionally requires no ground presence under this id.
        if matches!(kind, OpsKind::Landing) {
            let on_ground = self.stands.iter().any(|stand| {
                matches!(stand.state(), StandState::Reserved | StandState::Occupied)
                    && stand.reservation().aircraft_id() == aircraft_id
            });
            if on_ground {
                return false;
            }
        }
        true
    }

    /// First available runway in pool order; no load balancing.
    fn reserve_runway(&self) -> Option<Arc<Runway>> {
        self.runways
            .iter()
            .find(|runway| runway.try_reserve())
            .cloned()
    }

    fn reserve_stand(&self) -> Option<Arc<ParkingStand>> {
        self.stands.iter().find(|stand| stand.try_reserve()).cloned()
    }

    /// First stand whose reservation carries this aircraft id.
    fn locate_on_ground(&self, aircraft_id: &str) -> Option<Arc<ParkingStand>> {
        self.stands
            .iter()
            .find(|stand| stand.reservation().aircraft_id() == aircraft_id)
            .cloned()
    }

    fn runway_by_id(&self, id: RunwayId) -> Option<Arc<Runway>> {
        self.runways.iter().find(|r| r.id() == id).cloned()
    }

    fn stand_by_id(&self, id: StandId) -> Option<Arc<ParkingStand>> {
        self.stands.iter().find(|s| s.id() == id).cloned()
    }

    fn spawn_operation(
        &self,
        runway: Arc<Runway>,
        stand: Arc<ParkingStand>,
        token: ClearanceToken,
        kind: OpsKind,
    ) {
        let duration = self.config.operation_duration;
        let handle = tokio::spawn(async move {
            if !runway.begin_operation(&token) {
                // Lost the race with a revocation; the resources may
                // already belong to another aircraft. Touch nothing.
                warn!(
                    aircraft_id = token.aircraft_id(),
                    "operation dropped: clearance is no longer current"
                );
                return;
            }
            debug!(aircraft_id = token.aircraft_id(), "operation started");
            tokio::time::sleep(duration).await;
            runway.release();
            match kind {
                OpsKind::TakeOff => stand.release(),
                OpsKind::Landing => {
                    stand.begin_operation(&token);
                }
            }
            debug!(aircraft_id = token.aircraft_id(), "operation complete");
        });

        let mut operations = self.operations.lock();
        operations.retain(|h| !h.is_finished());
        operations.push(handle);
    }
}
