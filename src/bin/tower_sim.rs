//! Airfield simulation: a handful of aircraft competing for two runways
//! and four parking stands. Each aircraft polls for a landing clearance,
//! dawdles long enough that some clearances expire, lands, then does the
//! same for take-off.
//!
//! `TARMAC_AIRCRAFT` sets the fleet size (default 10); `RUST_LOG` controls
//! verbosity.

use anyhow::Result;
use rand::Rng;
use std::{env, sync::Arc, time::Duration};
use tarmac::{ClearanceToken, ControlTower, Directive, OpsResult, ParkingStand, Runway, TowerConfig};
use tokio::time::sleep;
use tracing::info;

const RETRY_INTERVAL: Duration = Duration::from_secs(2);

fn random_secs(max: u64) -> Duration {
    Duration::from_secs(rand::thread_rng().gen_range(1..=max))
}

async fn poll_landing(tower: &ControlTower, id: &str) -> ClearanceToken {
    loop {
        sleep(RETRY_INTERVAL).await;
        if let (Directive::Proceed, token) = tower.request_landing(id) {
            info!("{id} received a landing clearance");
            return token;
        }
    }
}

async fn poll_take_off(tower: &ControlTower, id: &str) -> ClearanceToken {
    loop {
        sleep(RETRY_INTERVAL).await;
        if let (Directive::Proceed, token) = tower.request_take_off(id) {
            info!("{id} received a take-off clearance");
            return token;
        }
    }
}

async fn fly(tower: Arc<ControlTower>, id: String) {
    let mut token = poll_landing(&tower, &id).await;
    // Dawdle; sometimes past the validity window, which is fine.
    sleep(random_secs(3)).await;
    loop {
        info!("{id} is landing");
        match tower.perform_landing(&token) {
            OpsResult::Success => break,
            OpsResult::ExpiredToken => {
                info!("{id} landing clearance expired, trying again");
                token = poll_landing(&tower, &id).await;
            }
            OpsResult::InvalidParams => unreachable!("granted clearances are well-formed"),
        }
    }
    info!("{id} has landed");

    // Stay parked at least as long as the landing takes to finish.
    sleep(TowerConfig::default().operation_duration + random_secs(6)).await;

    let mut token = poll_take_off(&tower, &id).await;
    sleep(random_secs(3)).await;
    loop {
        info!("{id} is taking off");
        match tower.perform_take_off(&token) {
            OpsResult::Success => break,
            OpsResult::ExpiredToken => {
                info!("{id} take-off clearance expired, trying again");
                token = poll_take_off(&tower, &id).await;
            }
            OpsResult::InvalidParams => unreachable!("granted clearances are well-formed"),
        }
    }
    info!("{id} has taken off");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let fleet: usize = env::var("TARMAC_AIRCRAFT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);

    let runways = vec![Runway::new(3682), Runway::new(2560)];
    let stands = (0..4).map(|_| ParkingStand::new()).collect();
    let tower = ControlTower::new(runways, stands, TowerConfig::default())?;

    info!("airfield open, {fleet} aircraft inbound");

    let mut aircraft = Vec::with_capacity(fleet);
    for i in 0..fleet {
        let tower = Arc::clone(&tower);
        aircraft.push(tokio::spawn(fly(tower, format!("Aircraft {i}"))));
    }
    for handle in aircraft {
        handle.await?;
    }

    tower.shutdown().await?;
    info!("airfield closed");
    Ok(())
}
