//! Multi-caller handle.
//!
//! Every operation on the game is serialized through one mutex, so callers
//! on different threads observe the three mutating operations in some total
//! order.

use std::sync::{Arc, Mutex, MutexGuard};

use exitgame_types::{ExitEvent, ExitGameError, ExitId, ExitRecord, PriorityKey, Result, U256};

use crate::{
    finalize::FinalizeReport,
    game::{ChallengeSpentExit, ExitGame, StartExit, StartedExit},
    state::BondTotals,
};

/// Cloneable, thread-safe handle onto an [`ExitGame`].
#[derive(Debug, Clone)]
pub struct SharedExitGame {
    inner: Arc<Mutex<ExitGame>>,
}

impl SharedExitGame {
    #[must_use]
    pub fn new(game: ExitGame) -> Self {
        Self {
            inner: Arc::new(Mutex::new(game)),
        }
    }

    /// Run `f` with exclusive access to the game.
    ///
    /// # Errors
    /// [`ExitGameError::Internal`] if another caller panicked while holding
    /// the lock.
    pub fn with<R>(&self, f: impl FnOnce(&mut ExitGame) -> R) -> Result<R> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard))
    }

    pub fn start_exit(&self, req: StartExit) -> Result<StartedExit> {
        self.lock()?.start_exit(req)
    }

    pub fn challenge_spent_exit(&self, req: ChallengeSpentExit) -> Result<ExitRecord> {
        self.lock()?.challenge_spent_exit(req)
    }

    pub fn finalize_exits(&self, max_items: usize) -> Result<FinalizeReport> {
        self.lock()?.finalize_exits(max_items)
    }

    pub fn finalize_default(&self) -> Result<FinalizeReport> {
        self.lock()?.finalize_default()
    }

    pub fn query_exit(&self, exit_id: &ExitId) -> Result<Option<ExitRecord>> {
        Ok(self.lock()?.query_exit(exit_id).cloned())
    }

    pub fn queue_size(&self) -> Result<usize> {
        Ok(self.lock()?.queue_size())
    }

    pub fn queue_peek_min(&self) -> Result<Option<ExitId>> {
        Ok(self.lock()?.queue_peek_min())
    }

    pub fn exit_outcome(&self, exit_id: &ExitId) -> Result<Option<bool>> {
        Ok(self.lock()?.exit_outcome(exit_id))
    }

    pub fn pending_exits(&self) -> Result<Vec<(PriorityKey, ExitId)>> {
        Ok(self.lock()?.pending_exits())
    }

    pub fn bonds_held(&self) -> Result<U256> {
        Ok(self.lock()?.bonds_held())
    }

    pub fn bond_totals(&self) -> Result<BondTotals> {
        Ok(self.lock()?.bond_totals())
    }

    pub fn take_events(&self) -> Result<Vec<ExitEvent>> {
        Ok(self.lock()?.take_events())
    }

    fn lock(&self) -> Result<MutexGuard<'_, ExitGame>> {
        self.inner
            .lock()
            .map_err(|_| ExitGameError::Internal("exit game lock poisoned".into()))
    }
}
