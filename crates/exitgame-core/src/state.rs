//! In-memory exit game state: the three registries plus bond totals.

use exitgame_types::{ExitGameConfig, ExitGameError, Result, U256};
use serde::{Deserialize, Serialize};

use crate::{outcomes::SuccessfulExits, queue::ExitQueue, store::ExitRecordStore};

/// Running totals of collateral.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondTotals {
    /// Bonds posted by exits still in the queue.
    pub held: U256,
    /// Forfeited bonds removed from circulation.
    pub burned: U256,
    /// Forfeited bonds paid to a sweep address.
    pub swept: U256,
}

/// Settlement terms queued exits were accepted under.
///
/// Finalize refunds the bond and measures maturity with these, so they must
/// not change while the journal holds exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitTerms {
    pub bond: U256,
    pub exit_delay_secs: u64,
}

impl ExitTerms {
    #[must_use]
    pub fn of(config: &ExitGameConfig) -> Self {
        Self {
            bond: config.bond,
            exit_delay_secs: config.exit_delay_secs,
        }
    }
}

/// Store, queue and outcome set, mutated only by the lifecycle controller.
#[derive(Debug, Default, Clone)]
pub struct ExitState {
    pub records: ExitRecordStore,
    pub queue: ExitQueue,
    pub outcomes: SuccessfulExits,
    pub bonds: BondTotals,
    /// Terms recorded with the first accepted exit; `None` until then.
    pub terms: Option<ExitTerms>,
}

impl ExitState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `terms` can settle everything this state holds.
    ///
    /// # Errors
    /// [`ExitGameError::Configuration`] if the recorded terms differ, or if
    /// the held bond total is not one `terms.bond` per queued exit.
    pub fn check_terms(&self, terms: &ExitTerms) -> Result<()> {
        if let Some(recorded) = self.terms {
            if recorded != *terms {
                return Err(ExitGameError::Configuration(format!(
                    "exits were accepted with bond {} and delay {}s, configured bond {} and delay {}s",
                    recorded.bond, recorded.exit_delay_secs, terms.bond, terms.exit_delay_secs
                )));
            }
        }

        let expected = terms
            .bond
            .checked_mul(U256::from(self.queue.len()))
            .ok_or_else(|| ExitGameError::Configuration("held bond total overflows".into()))?;
        if self.bonds.held != expected {
            return Err(ExitGameError::Configuration(format!(
                "{} bond held for {} queued exits, bond {} requires {expected}",
                self.bonds.held,
                self.queue.len(),
                terms.bond
            )));
        }
        Ok(())
    }
}
