use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long a landing or take-off occupies its runway.
pub const DEFAULT_OPERATION_DURATION: Duration = Duration::from_secs(5);

/// How long a granted clearance stays consumable.
pub const DEFAULT_TOKEN_VALIDITY: Duration = Duration::from_secs(2);

/// How often the reaper sweeps for expired clearances.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Timing knobs for a [`crate::ControlTower`].
///
/// Tests shrink these to millisecond scale; the defaults match the
/// simulated airfield (5s operations, 2s clearances, 5s sweeps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TowerConfig {
    pub operation_duration: Duration,
    pub token_validity: Duration,
    pub sweep_interval: Duration,
}

impl Default for TowerConfig {
    fn default() -> Self {
        Self {
            operation_duration: DEFAULT_OPERATION_DURATION,
            token_validity: DEFAULT_TOKEN_VALIDITY,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_airfield_constants() {
        let config = TowerConfig::default();
        assert_eq!(config.operation_duration, Duration::from_secs(5));
        assert_eq!(config.token_validity, Duration::from_secs(2));
        assert_eq!(config.sweep_interval, Duration::from_secs(5));
    }
}
