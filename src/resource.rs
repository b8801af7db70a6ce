//! Runway and parking stand state machines.
//!
//! Both resources cycle `Available -> Reserved -> InOperation/Occupied ->
//! Available` under a lock local to the resource. Only read accessors are
//! public; every mutating transition is crate-private so all mutation
//! flows through the tower or its operation tasks.

use crate::clearance::ClearanceToken;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunwayId(pub Uuid);

impl RunwayId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunwayId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StandId(pub Uuid);

impl StandId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StandId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunwayState {
    Available,
    Reserved,
    InOperation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StandState {
    Available,
    Reserved,
    Occupied,
}

#[derive(Debug)]
struct RunwaySlot {
    state: RunwayState,
    reservation: ClearanceToken,
}

/// A runway. Carries a length attribute for future capacity matching;
/// allocation ignores it.
#[derive(Debug)]
pub struct Runway {
    id: RunwayId,
    length_m: u32,
    slot: Mutex<RunwaySlot>,
}

impl Runway {
    #[must_use]
    pub fn new(length_m: u32) -> Self {
        Self {
            id: RunwayId::new(),
            length_m,
            slot: Mutex::new(RunwaySlot {
                state: RunwayState::Available,
                reservation: ClearanceToken::default(),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> RunwayId {
        self.id
    }

    #[must_use]
    pub fn length_m(&self) -> u32 {
        self.length_m
    }

    #[must_use]
    pub fn state(&self) -> RunwayState {
        self.slot.lock().state
    }

    /// The clearance currently attached to this runway. Meaningful only
    /// while the state is not `Available`; otherwise the empty token.
    #[must_use]
    pub fn reservation(&self) -> ClearanceToken {
        self.slot.lock().reservation.clone()
    }

    /// Exactly one caller wins on a race; everyone else sees `false` with
    /// no side effects.
    pub(crate) fn try_reserve(&self) -> bool {
        let mut slot = self.slot.lock();
        if slot.state == RunwayState::Available {
            slot.state = RunwayState::Reserved;
            true
        } else {
            false
        }
    }

    /// Attach the owning clearance. Caller must already hold the
    /// reservation; state is untouched.
    pub(crate) fn assign_reservation(&self, token: &ClearanceToken) {
        self.slot.lock().reservation = token.clone();
    }

    /// `Reserved -> InOperation`, only when `token` matches the stored
    /// reservation. A mismatch is swallowed; the return value tells the
    /// operation task whether it owns the runway.
    pub(crate) fn begin_operation(&self, token: &ClearanceToken) -> bool {
        let mut slot = self.slot.lock();
        if slot.state == RunwayState::Reserved && slot.reservation == *token {
            slot.state = RunwayState::InOperation;
            true
        } else {
            false
        }
    }

    pub(crate) fn release(&self) {
        let mut slot = self.slot.lock();
        slot.state = RunwayState::Available;
        slot.reservation = ClearanceToken::default();
    }

    /// Release only if `token` still holds an unconsumed reservation.
    /// One lock acquisition, so the check and the reset cannot interleave
    /// with an operation task.
    pub(crate) fn release_if_unused(&self, token: &ClearanceToken) -> bool {
        let mut slot = self.slot.lock();
        if slot.state == RunwayState::Reserved && slot.reservation == *token {
            slot.state = RunwayState::Available;
            slot.reservation = ClearanceToken::default();
            true
        } else {
            false
        }
    }
}

#[derive(Debug)]
struct StandSlot {
    state: StandState,
    reservation: ClearanceToken,
}

#[derive(Debug)]
pub struct ParkingStand {
    id: StandId,
    slot: Mutex<StandSlot>,
}

impl ParkingStand {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: StandId::new(),
            slot: Mutex::new(StandSlot {
                state: StandState::Available,
                reservation: ClearanceToken::default(),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> StandId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> StandState {
        self.slot.lock().state
    }

    #[must_use]
    pub fn reservation(&self) -> ClearanceToken {
        self.slot.lock().reservation.clone()
    }

    pub(crate) fn try_reserve(&self) -> bool {
        let mut slot = self.slot.lock();
        if slot.state == StandState::Available {
            slot.state = StandState::Reserved;
            true
        } else {
            false
        }
    }

    pub(crate) fn assign_reservation(&self, token: &ClearanceToken) {
        self.slot.lock().reservation = token.clone();
    }

    /// `Reserved -> Occupied` on a token match (an aircraft rolling onto
    /// the stand after landing); mismatches are swallowed.
    pub(crate) fn begin_operation(&self, token: &ClearanceToken) -> bool {
        let mut slot = self.slot.lock();
        if slot.state == StandState::Reserved && slot.reservation == *token {
            slot.state = StandState::Occupied;
            true
        } else {
            false
        }
    }

    pub(crate) fn release(&self) {
        let mut slot = self.slot.lock();
        slot.state = StandState::Available;
        slot.reservation = ClearanceToken::default();
    }

    pub(crate) fn release_if_unused(&self, token: &ClearanceToken) -> bool {
        let mut slot = self.slot.lock();
        if slot.state == StandState::Reserved && slot.reservation == *token {
            slot.state = StandState::Available;
            slot.reservation = ClearanceToken::default();
            true
        } else {
            false
        }
    }
}

impl Default for ParkingStand {
    fn default() -> Self {
        Self::new()
    }
}
