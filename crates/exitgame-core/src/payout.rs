//! Funds-transfer port.
//!
//! A finalize call hands the whole set of transfers it decided on to
//! [`Payout::pay`] as one batch. The batch either lands completely or not at
//! all; the exit game relies on that to keep finalize atomic.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use exitgame_types::{Address, ExitGameError, Result, U256};

/// A single transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payment {
    pub to: Address,
    pub amount: U256,
}

/// Funds-transfer primitive.
pub trait Payout: Send + Sync {
    /// Execute all payments, or none.
    ///
    /// # Errors
    /// [`ExitGameError::PayoutFailed`] if the batch cannot be honored.
    fn pay(&mut self, payments: &[Payment]) -> Result<()>;
}

#[derive(Debug, Default)]
struct LedgerState {
    /// Remaining funds the game may pay out of. `None` = unbounded.
    custody: Option<U256>,
    balances: HashMap<Address, U256>,
    transfers: usize,
}

/// In-memory [`Payout`] that credits balances, optionally out of a bounded
/// custody pool.
///
/// Cloning yields another handle onto the same ledger.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    inner: Arc<Mutex<LedgerState>>,
}

impl Ledger {
    /// Ledger that never runs out of funds.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Ledger holding exactly `custody` for payouts.
    #[must_use]
    pub fn with_custody(custody: U256) -> Self {
        let ledger = Self::default();
        ledger.lock().custody = Some(custody);
        ledger
    }

    /// Add funds to a bounded custody pool. No-op when unbounded.
    pub fn fund(&self, amount: U256) {
        let mut state = self.lock();
        if let Some(custody) = state.custody.as_mut() {
            *custody = custody.saturating_add(amount);
        }
    }

    /// Total credited to `who`.
    #[must_use]
    pub fn balance(&self, who: &Address) -> U256 {
        self.lock().balances.get(who).copied().unwrap_or_default()
    }

    /// Remaining custody, `None` when unbounded.
    #[must_use]
    pub fn custody(&self) -> Option<U256> {
        self.lock().custody
    }

    /// Number of individual transfers executed so far.
    #[must_use]
    pub fn transfer_count(&self) -> usize {
        self.lock().transfers
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Payout for Ledger {
    fn pay(&mut self, payments: &[Payment]) -> Result<()> {
        let mut state = self.lock();

        let total = payments
            .iter()
            .try_fold(U256::zero(), |acc, p| acc.checked_add(p.amount))
            .ok_or_else(|| ExitGameError::PayoutFailed {
                reason: "batch total overflows".into(),
            })?;

        if let Some(custody) = state.custody {
            if total > custody {
                return Err(ExitGameError::PayoutFailed {
                    reason: format!("custody {custody} cannot cover batch of {total}"),
                });
            }
            state.custody = Some(custody - total);
        }

        for p in payments {
            let balance = state.balances.entry(p.to).or_default();
            *balance = balance.saturating_add(p.amount);
        }
        state.transfers += payments.len();
        Ok(())
    }
}
