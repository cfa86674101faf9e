//! Finalize planning.
//!
//! A finalize call walks the queue head-first through an explicit state
//! machine:
//!
//! ```text
//!            ┌──────┐
//!            │ IDLE │
//!            └──┬───┘
//!               ▼
//!  ┌────────▶┌─────────┐  budget spent   ┌────────────────┐
//!  │ settled │ POPPING ├────────────────▶│ STOPPED_BUDGET │
//!  └─────────┤         ├───────┐         └────────────────┘
//!            └────┬────┘       │ queue exhausted
//!                 │ head       ▼
//!                 │ immature  ┌───────────────┐
//!                 ▼           │ STOPPED_EMPTY │
//!      ┌──────────────────┐   └───────────────┘
//!      │ STOPPED_IMMATURE │
//!      └──────────────────┘
//! ```
//!
//! Planning only reads state. It produces the full list of settlements and
//! the payout batch; the controller then commits the plan in one step, so a
//! failed payout leaves nothing half-applied.

use exitgame_types::{
    BondDisposition, ExitGameConfig, ExitGameError, ExitId, ExitOutcome, ExitRecord,
    ForfeitPolicy, PriorityKey, Result, U256,
};
use serde::{Deserialize, Serialize};

use crate::{
    payout::Payment,
    state::{BondTotals, ExitState},
};

/// Where a finalize walk currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FinalizeState {
    Idle,
    Popping,
    /// The queue head is still inside its challenge window.
    StoppedImmature,
    /// Every queued exit was settled.
    StoppedEmpty,
    /// `max_items` settlements were made.
    StoppedBudget,
}

impl FinalizeState {
    #[must_use]
    pub fn is_stopped(self) -> bool {
        matches!(
            self,
            Self::StoppedImmature | Self::StoppedEmpty | Self::StoppedBudget
        )
    }
}

impl std::fmt::Display for FinalizeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Popping => write!(f, "POPPING"),
            Self::StoppedImmature => write!(f, "STOPPED_IMMATURE"),
            Self::StoppedEmpty => write!(f, "STOPPED_EMPTY"),
            Self::StoppedBudget => write!(f, "STOPPED_BUDGET"),
        }
    }
}

/// One queue entry leaving the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub exit_id: ExitId,
    pub priority: PriorityKey,
    pub record: ExitRecord,
    pub outcome: ExitOutcome,
    /// Value credited to the owner; zero when skipped.
    pub payout: U256,
    /// Set when the bond of an invalid exit was forfeited.
    pub forfeit: Option<BondDisposition>,
    /// Transfer this settlement contributes to the payout batch.
    pub transfer: Option<Payment>,
}

/// Everything a finalize call will do, computed before any mutation.
#[derive(Debug, Clone)]
pub struct FinalizePlan {
    pub settlements: Vec<Settlement>,
    pub payments: Vec<Payment>,
    /// Bond totals after the plan is applied.
    pub bonds: BondTotals,
    pub stop: FinalizeState,
}

/// Result of a successful finalize call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeReport {
    /// Number of exits popped.
    pub processed: usize,
    /// `(exit_id, paid)` in pop order.
    pub outcomes: Vec<(ExitId, bool)>,
    /// Why the walk stopped.
    pub stop: FinalizeState,
}

/// Walk the queue and decide up to `max_items` settlements.
///
/// # Errors
/// - [`ExitGameError::NothingToFinalize`] when no entry can be settled.
/// - [`ExitGameError::AmountOverflow`] if a payout or bond total overflows.
/// - [`ExitGameError::Internal`] if a queued id has no record.
pub fn plan(
    state: &ExitState,
    config: &ExitGameConfig,
    now: u64,
    max_items: usize,
) -> Result<FinalizePlan> {
    let mut entries = state.queue.iter();
    let mut settlements = Vec::new();
    let mut payments = Vec::new();
    let mut bonds = state.bonds;
    let mut machine = FinalizeState::Idle;

    while !machine.is_stopped() {
        machine = if settlements.len() >= max_items {
            FinalizeState::StoppedBudget
        } else if let Some((priority, exit_id)) = entries.next() {
            let record = state.records.get(&exit_id).ok_or_else(|| {
                ExitGameError::Internal(format!("queued exit {exit_id} has no record"))
            })?;
            if record.is_mature(config.exit_delay_secs, now) {
                let settlement = settle(config, &mut bonds, priority, exit_id, record)?;
                payments.extend(settlement.transfer);
                settlements.push(settlement);
                FinalizeState::Popping
            } else {
                FinalizeState::StoppedImmature
            }
        } else {
            FinalizeState::StoppedEmpty
        };
    }

    if settlements.is_empty() {
        let head_matures_at = state
            .queue
            .peek_min()
            .and_then(|(_, id)| state.records.get(&id))
            .map(|r| r.time_published.saturating_add(config.exit_delay_secs));
        return Err(ExitGameError::NothingToFinalize {
            queue_len: state.queue.len(),
            head_matures_at,
        });
    }

    Ok(FinalizePlan {
        settlements,
        payments,
        bonds,
        stop: machine,
    })
}

fn settle(
    config: &ExitGameConfig,
    bonds: &mut BondTotals,
    priority: PriorityKey,
    exit_id: ExitId,
    record: &ExitRecord,
) -> Result<Settlement> {
    bonds.held = bonds
        .held
        .checked_sub(config.bond)
        .ok_or_else(|| ExitGameError::Internal(format!("bond of {exit_id} was never held")))?;

    let (outcome, payout, forfeit, transfer) = if record.is_valid {
        let payout = config
            .payout_for(record.amount)
            .ok_or_else(|| ExitGameError::AmountOverflow {
                reason: format!("payout of {exit_id}"),
            })?;
        let transfer = Payment {
            to: record.owner,
            amount: payout,
        };
        (ExitOutcome::Paid, payout, None, Some(transfer))
    } else {
        let disposition = forfeit(config.forfeit_policy, bonds, config.bond)?;
        let transfer = match disposition {
            BondDisposition::Swept(to) => Some(Payment {
                to,
                amount: config.bond,
            }),
            BondDisposition::Burned => None,
        };
        (ExitOutcome::Skipped, U256::zero(), Some(disposition), transfer)
    };

    Ok(Settlement {
        exit_id,
        priority,
        record: record.clone(),
        outcome,
        payout,
        forfeit,
        transfer,
    })
}

fn forfeit(policy: ForfeitPolicy, bonds: &mut BondTotals, bond: U256) -> Result<BondDisposition> {
    let overflow = || ExitGameError::AmountOverflow {
        reason: "forfeited bond total".into(),
    };
    Ok(match policy {
        ForfeitPolicy::Burn => {
            bonds.burned = bonds.burned.checked_add(bond).ok_or_else(overflow)?;
            BondDisposition::Burned
        }
        ForfeitPolicy::SweepTo(to) => {
            bonds.swept = bonds.swept.checked_add(bond).ok_or_else(overflow)?;
            BondDisposition::Swept(to)
        }
    })
}
