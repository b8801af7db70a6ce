#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Lease-based allocation of paired airfield ground resources.
//!
//! A [`ControlTower`] owns a fixed pool of runways and parking stands and
//! hands out time-bounded [`ClearanceToken`]s binding one aircraft to
//! exactly one runway and one parking stand. Clients poll for a clearance,
//! consume it by performing the landing or take-off, and a background
//! reaper reclaims clearances that expire unused.

pub mod clearance;
pub mod config;
pub mod error;
pub mod resource;
pub mod tower;

pub(crate) mod reaper;

pub mod test_utils;

pub use clearance::ClearanceToken;
pub use config::TowerConfig;
pub use error::{Error, Result};
pub use resource::{ParkingStand, Runway, RunwayId, RunwayState, StandId, StandState};
pub use tower::{ControlTower, Directive, OpsResult};
