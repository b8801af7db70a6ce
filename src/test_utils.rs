//! Shared fixtures for unit and integration tests.

use crate::{config::TowerConfig, resource::ParkingStand, resource::Runway, tower::ControlTower};
use std::sync::Arc;
use std::time::Duration;

/// Millisecond-scale timing so scenarios finish quickly: 50ms operations,
/// 250ms clearances, 25ms sweeps.
#[must_use]
pub fn fast_config() -> TowerConfig {
    TowerConfig {
        operation_duration: Duration::from_millis(50),
        token_validity: Duration::from_millis(250),
        sweep_interval: Duration::from_millis(25),
    }
}

/// A config whose sweep interval is far longer than any test, for
/// scenarios that must observe expiry before the reaper does.
#[must_use]
pub fn no_sweep_config() -> TowerConfig {
    TowerConfig {
        sweep_interval: Duration::from_secs(3600),
        ..fast_config()
    }
}

/// Tower over `runways` x `stands` fresh resources. Panics on empty pools;
/// tests always pass at least one of each.
#[must_use]
pub fn test_tower(runways: usize, stands: usize, config: TowerConfig) -> Arc<ControlTower> {
    let runways = (0..runways).map(|_| Runway::new(3000)).collect();
    let stands = (0..stands).map(|_| ParkingStand::new()).collect();
    ControlTower::new(runways, stands, config).expect("test pools are non-empty")
}
