//! Successful-exit set.
//!
//! Each exit id gets exactly one final disposition when it leaves the queue.
//! Like a spent output, an outcome can be written once and never again,
//! which is what rules out double payout.

use std::collections::HashMap;

use exitgame_types::{ExitGameError, ExitId, ExitOutcome, Result};

/// Write-once map from exit id to its settlement outcome.
#[derive(Debug, Default, Clone)]
pub struct SuccessfulExits {
    outcomes: HashMap<ExitId, ExitOutcome>,
}

impl SuccessfulExits {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a popped exit.
    ///
    /// # Errors
    /// [`ExitGameError::ExitAlreadyFinalized`] if an outcome exists.
    pub fn record(&mut self, exit_id: ExitId, outcome: ExitOutcome) -> Result<()> {
        if self.outcomes.contains_key(&exit_id) {
            return Err(ExitGameError::ExitAlreadyFinalized(exit_id));
        }
        self.outcomes.insert(exit_id, outcome);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, exit_id: &ExitId) -> Option<ExitOutcome> {
        self.outcomes.get(exit_id).copied()
    }

    /// True only for exits that were paid. Unknown and skipped exits are false.
    #[must_use]
    pub fn is_successful(&self, exit_id: &ExitId) -> bool {
        self.get(exit_id).is_some_and(ExitOutcome::is_paid)
    }

    #[must_use]
    pub fn is_finalized(&self, exit_id: &ExitId) -> bool {
        self.outcomes.contains_key(exit_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
