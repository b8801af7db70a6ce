//! Expiry, reaping, revocation idempotence, and the revoke-vs-consume
//! race policy.

use std::time::Duration;
use tarmac::test_utils::{fast_config, no_sweep_config, test_tower};
use tarmac::{Directive, OpsResult, RunwayState, StandState, TowerConfig};
use tokio::time::sleep;

/// An unconsumed clearance presented after its validity window yields
/// `ExpiredToken` and both resources go back to the pool.
#[tokio::test]
async fn expired_clearance_is_rejected_and_reclaimed() {
    let tower = test_tower(1, 1, no_sweep_config());

    let (directive, token) = tower.request_landing("N1");
    assert_eq!(directive, Directive::Proceed);

    sleep(Duration::from_millis(400)).await;
    assert_eq!(tower.perform_landing(&token), OpsResult::ExpiredToken);

    assert_eq!(tower.runways()[0].state(), RunwayState::Available);
    assert_eq!(tower.stands()[0].state(), StandState::Available);
    assert!(tower.outstanding().is_empty());

    // A second presentation finds nothing left to revoke.
    assert_eq!(tower.perform_landing(&token), OpsResult::ExpiredToken);

    tower.shutdown().await.unwrap();
}

/// Inside the window the clearance is still consumable.
#[tokio::test]
async fn clearance_is_consumable_before_expiry() {
    let tower = test_tower(1, 1, no_sweep_config());
    let (_, token) = tower.request_landing("N2");
    assert_eq!(tower.perform_landing(&token), OpsResult::Success);
    tower.shutdown().await.unwrap();
}

/// The reaper reclaims an expired, never-consumed clearance on its own.
#[tokio::test]
async fn reaper_reclaims_unused_clearances() {
    let tower = test_tower(1, 1, fast_config());

    let (directive, _token) = tower.request_landing("N3");
    assert_eq!(directive, Directive::Proceed);

    // Past validity plus several sweep intervals.
    sleep(Duration::from_millis(500)).await;

    assert!(tower.outstanding().is_empty());
    assert_eq!(tower.runways()[0].state(), RunwayState::Available);
    assert_eq!(tower.stands()[0].state(), StandState::Available);

    // The identity is free again.
    assert_eq!(tower.request_landing("N3").0, Directive::Proceed);

    tower.shutdown().await.unwrap();
}

#[tokio::test]
async fn revoke_is_idempotent() {
    let tower = test_tower(1, 1, no_sweep_config());
    let (_, token) = tower.request_landing("N4");

    tower.revoke_token(&token);
    assert_eq!(tower.runways()[0].state(), RunwayState::Available);
    assert!(tower.outstanding().is_empty());

    // Second revoke: no effect, no panic.
    tower.revoke_token(&token);
    assert_eq!(tower.runways()[0].state(), RunwayState::Available);
    assert!(tower.outstanding().is_empty());

    tower.shutdown().await.unwrap();
}

/// A consumed clearance is past revocation: once the operation has begun,
/// revoke leaves the resources to the operation task.
#[tokio::test]
async fn revoke_never_reclaims_consumed_resources() {
    let config = TowerConfig {
        operation_duration: Duration::from_millis(200),
        token_validity: Duration::from_secs(10),
        sweep_interval: Duration::from_secs(3600),
    };
    let tower = test_tower(1, 1, config);

    let (_, token) = tower.request_landing("N5");
    assert_eq!(tower.perform_landing(&token), OpsResult::Success);

    // Operation under way.
    sleep(Duration::from_millis(50)).await;
    assert_eq!(tower.runways()[0].state(), RunwayState::InOperation);

    tower.revoke_token(&token);
    assert_eq!(tower.runways()[0].state(), RunwayState::InOperation);

    // The operation still runs to completion.
    sleep(Duration::from_millis(300)).await;
    assert_eq!(tower.runways()[0].state(), RunwayState::Available);
    assert_eq!(tower.stands()[0].state(), StandState::Occupied);

    tower.shutdown().await.unwrap();
}

/// Race policy: an operation presented under a revoked clearance is
/// swallowed, and its dead task must not disturb the next holder of the
/// same resources.
#[tokio::test]
async fn stale_operation_cannot_steal_reassigned_resources() {
    let config = TowerConfig {
        operation_duration: Duration::from_millis(50),
        token_validity: Duration::from_secs(10),
        sweep_interval: Duration::from_secs(3600),
    };
    let tower = test_tower(1, 1, config);

    let (_, stale) = tower.request_landing("N6");
    tower.revoke_token(&stale);

    // The freed pair goes to another aircraft.
    let (directive, current) = tower.request_landing("N7");
    assert_eq!(directive, Directive::Proceed);

    // The stale clearance is structurally fine and unexpired, so the call
    // reports success, but the spawned task finds the reservation gone
    // and aborts without touching anything.
    assert_eq!(tower.perform_landing(&stale), OpsResult::Success);
    sleep(Duration::from_millis(200)).await;

    assert_eq!(tower.runways()[0].state(), RunwayState::Reserved);
    assert_eq!(tower.runways()[0].reservation(), current);
    assert_eq!(tower.stands()[0].reservation(), current);

    tower.shutdown().await.unwrap();
}
