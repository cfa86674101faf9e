//! Configuration for an exit game instance.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::{Address, ExitGameError, constants};

/// What happens to the bond of an exit found invalid at finalize time.
///
/// The owner never gets it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ForfeitPolicy {
    /// Removed from circulation; only tallied.
    #[default]
    Burn,
    /// Paid to a fixed fund (e.g. the operator) in the same payout batch.
    SweepTo(Address),
}

impl std::fmt::Display for ForfeitPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Burn => write!(f, "BURN"),
            Self::SweepTo(addr) => write!(f, "SWEEP_TO({addr})"),
        }
    }
}

/// Parameters of the exit game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitGameConfig {
    /// Challenge window in seconds between publication and maturity.
    pub exit_delay_secs: u64,
    /// Exact collateral every `start_exit` must post.
    pub bond: U256,
    /// Disposition of bonds from invalidated exits.
    #[serde(default)]
    pub forfeit_policy: ForfeitPolicy,
    /// Budget used by callers that have no opinion on `max_items`.
    #[serde(default = "default_finalize_budget")]
    pub default_finalize_budget: usize,
}

fn default_finalize_budget() -> usize {
    constants::DEFAULT_FINALIZE_BUDGET
}

impl Default for ExitGameConfig {
    fn default() -> Self {
        Self {
            exit_delay_secs: constants::DEFAULT_EXIT_DELAY_SECS,
            bond: U256::from(constants::DEFAULT_EXIT_BOND),
            forfeit_policy: ForfeitPolicy::default(),
            default_finalize_budget: constants::DEFAULT_FINALIZE_BUDGET,
        }
    }
}

impl ExitGameConfig {
    /// Reject configurations that would make the game meaningless.
    ///
    /// # Errors
    /// [`ExitGameError::Configuration`] on a zero challenge window or a zero
    /// default finalize budget.
    pub fn validate(&self) -> crate::Result<()> {
        if self.exit_delay_secs == 0 {
            return Err(ExitGameError::Configuration(
                "exit_delay_secs must be > 0".into(),
            ));
        }
        if self.default_finalize_budget == 0 {
            return Err(ExitGameError::Configuration(
                "default_finalize_budget must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON config document.
    pub fn from_json_str(s: &str) -> crate::Result<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| ExitGameError::Configuration(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Value paid out for a valid exit of `amount`.
    ///
    /// Returns `None` on overflow.
    #[must_use]
    pub fn payout_for(&self, amount: U256) -> Option<U256> {
        amount.checked_add(self.bond)
    }
}
