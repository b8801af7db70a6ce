use crate::resource::{RunwayId, StandId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A time-bounded clearance binding one aircraft to one runway and one
/// parking stand.
///
/// Granted by the tower and immutable afterwards; the only mutation path
/// is [`ClearanceToken::fill`], which exists so a default (empty) instance
/// can be reused, never to alter a live grant. Two tokens naming the same
/// resources but carrying different expiries are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearanceToken {
    aircraft_id: String,
    runway: Option<RunwayId>,
    stand: Option<StandId>,
    expiry: DateTime<Utc>,
}

impl ClearanceToken {
    pub(crate) fn new(
        aircraft_id: &str,
        runway: RunwayId,
        stand: StandId,
        validity: Duration,
    ) -> Self {
        Self {
            aircraft_id: aircraft_id.to_owned(),
            runway: Some(runway),
            stand: Some(stand),
            expiry: Utc::now() + validity,
        }
    }

    /// Structural validity: an aircraft identity and both resource
    /// references are present. The empty token returned with `Hold` fails
    /// this check.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.aircraft_id.is_empty() && self.runway.is_some() && self.stand.is_some()
    }

    #[must_use]
    pub fn has_expired(&self) -> bool {
        Utc::now() > self.expiry
    }

    /// Refill an empty/default instance for reuse.
    pub fn fill(&mut self, aircraft_id: &str, runway: RunwayId, stand: StandId, validity: Duration) {
        self.aircraft_id = aircraft_id.to_owned();
        self.runway = Some(runway);
        self.stand = Some(stand);
        self.expiry = Utc::now() + validity;
    }

    #[must_use]
    pub fn aircraft_id(&self) -> &str {
        &self.aircraft_id
    }

    #[must_use]
    pub fn runway(&self) -> Option<RunwayId> {
        self.runway
    }

    #[must_use]
    pub fn stand(&self) -> Option<StandId> {
        self.stand
    }

    #[must_use]
    pub fn expiry(&self) -> DateTime<Utc> {
        self.expiry
    }
}

impl Default for ClearanceToken {
    /// The empty token: no identity, no references, expired since epoch.
    fn default() -> Self {
        Self {
            aircraft_id: String::new(),
            runway: None,
            stand: None,
            expiry: DateTime::UNIX_EPOCH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_is_invalid_and_expired() {
        let token = ClearanceToken::default();
        assert!(!token.is_valid());
        assert!(token.has_expired());
    }

    #[test]
    fn granted_token_is_valid_until_expiry() {
        let token = ClearanceToken::new(
            "N42",
            RunwayId::new(),
            StandId::new(),
            Duration::from_secs(2),
        );
        assert!(token.is_valid());
        assert!(!token.has_expired());
    }

    #[test]
    fn token_with_zero_validity_expires() {
        let token =
            ClearanceToken::new("N42", RunwayId::new(), StandId::new(), Duration::ZERO);
        std::thread::sleep(Duration::from_millis(5));
        assert!(token.has_expired());
        // Expiry does not affect structural validity.
        assert!(token.is_valid());
    }

    #[test]
    fn equality_is_by_full_field_match() {
        let runway = RunwayId::new();
        let stand = StandId::new();
        let a = ClearanceToken::new("N42", runway, stand, Duration::from_secs(60));
        assert_eq!(a, a.clone());

        // Same resources, different expiry: distinct tokens.
        std::thread::sleep(Duration::from_millis(5));
        let b = ClearanceToken::new("N42", runway, stand, Duration::from_secs(60));
        assert_ne!(a, b);
    }

    #[test]
    fn fill_turns_empty_token_into_a_valid_one() {
        let mut token = ClearanceToken::default();
        token.fill("N42", RunwayId::new(), StandId::new(), Duration::from_secs(2));
        assert!(token.is_valid());
        assert_eq!(token.aircraft_id(), "N42");
    }
}
