//! Exit claim records.
//!
//! ## Validity
//!
//! ```text
//!   ┌───────┐  challenge (spend proven)  ┌─────────┐
//!   │ VALID ├───────────────────────────▶│ INVALID │
//!   └───────┘                            └─────────┘
//! ```
//!
//! The transition is one-way. A record keeps its queue position after being
//! invalidated; finalize simply settles it without payout.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::{Address, ExitGameError, ExitId, OutputCoordinate, PriorityKey, TxHash};

/// State of one exit claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitRecord {
    /// Hash of the serialized transaction that created the exited output.
    pub transaction_ref: TxHash,
    /// Value of the exited output. Never mutated.
    pub amount: U256,
    /// Claimant; receives the payout.
    pub owner: Address,
    /// Clock reading (seconds) when the claim was accepted.
    pub time_published: u64,
    pub coordinate: OutputCoordinate,
    /// True at creation; cleared once by a successful challenge.
    pub is_valid: bool,
    /// Reserved for claims under deeper dispute. Carried through unchanged.
    pub is_limbo: bool,
}

impl ExitRecord {
    /// A fresh, valid claim.
    #[must_use]
    pub fn new(
        transaction_ref: TxHash,
        amount: U256,
        owner: Address,
        coordinate: OutputCoordinate,
        time_published: u64,
    ) -> Self {
        Self {
            transaction_ref,
            amount,
            owner,
            time_published,
            coordinate,
            is_valid: true,
            is_limbo: false,
        }
    }

    #[must_use]
    pub fn exit_id(&self) -> ExitId {
        ExitId::derive(&self.transaction_ref, &self.owner, &self.coordinate)
    }

    #[must_use]
    pub fn priority(&self) -> PriorityKey {
        self.coordinate.priority()
    }

    /// Whether the challenge window has elapsed at `now`.
    ///
    /// Saturates instead of overflowing for absurd delays.
    #[must_use]
    pub fn is_mature(&self, exit_delay_secs: u64, now: u64) -> bool {
        self.time_published.saturating_add(exit_delay_secs) <= now
    }

    /// Mark the claim invalid.
    ///
    /// # Errors
    /// Returns [`ExitGameError::AlreadyInvalid`] if it was already invalid.
    pub fn invalidate(&mut self) -> crate::Result<()> {
        if !self.is_valid {
            return Err(ExitGameError::AlreadyInvalid(self.exit_id()));
        }
        self.is_valid = false;
        Ok(())
    }
}

/// Final disposition of a popped exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitOutcome {
    /// Value and bond were paid to the owner.
    Paid,
    /// The claim had been invalidated; nothing was paid.
    Skipped,
}

impl ExitOutcome {
    #[must_use]
    pub fn is_paid(self) -> bool {
        matches!(self, Self::Paid)
    }
}

impl From<bool> for ExitOutcome {
    fn from(paid: bool) -> Self {
        if paid { Self::Paid } else { Self::Skipped }
    }
}

impl std::fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paid => write!(f, "PAID"),
            Self::Skipped => write!(f, "SKIPPED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(time_published: u64) -> ExitRecord {
        ExitRecord::new(
            TxHash::of(b"fund"),
            U256::from(100u64),
            Address::repeat(2),
            OutputCoordinate::new(1, 0, 0),
            time_published,
        )
    }

    #[test]
    fn new_record_is_valid_and_not_limbo() {
        let r = record(10);
        assert!(r.is_valid);
        assert!(!r.is_limbo);
    }

    #[test]
    fn maturity_boundary_is_inclusive() {
        let r = record(1_000);
        assert!(!r.is_mature(100, 1_099));
        assert!(r.is_mature(100, 1_100));
        assert!(r.is_mature(100, 5_000));
    }

    #[test]
    fn maturity_saturates() {
        let r = record(u64::MAX - 1);
        assert!(!r.is_mature(10, u64::MAX - 1));
        assert!(r.is_mature(10, u64::MAX));
    }

    #[test]
    fn invalidate_once() {
        let mut r = record(0);
        r.invalidate().unwrap();
        assert!(!r.is_valid);
        let err = r.invalidate().unwrap_err();
        assert!(matches!(err, ExitGameError::AlreadyInvalid(id) if id == r.exit_id()));
        assert!(!r.is_valid);
    }

    #[test]
    fn exit_id_matches_derive() {
        let r = record(0);
        assert_eq!(
            r.exit_id(),
            ExitId::derive(&r.transaction_ref, &r.owner, &r.coordinate)
        );
    }

    #[test]
    fn record_serde_roundtrip() {
        let r = record(42);
        let json = serde_json::to_string(&r).unwrap();
        let back: ExitRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
    }

    #[test]
    fn outcome_from_bool() {
        assert!(ExitOutcome::from(true).is_paid());
        assert!(!ExitOutcome::from(false).is_paid());
        assert_eq!(ExitOutcome::Skipped.to_string(), "SKIPPED");
    }
}
