//! Durable journal of exit game state over a [`KeyValueStore`].
//!
//! Layout:
//!
//! ```text
//! exit/record/<exit_id:32>                 -> JSON ExitRecord
//! exit/queue/<priority:16 BE><exit_id:32>  -> exit_id
//! exit/outcome/<exit_id:32>                -> 0x01 paid | 0x00 skipped
//! exit/meta/bonds                          -> JSON BondTotals
//! exit/meta/terms                          -> JSON ExitTerms
//! ```
//!
//! Queue keys embed the big-endian priority, so a prefix scan returns the
//! queue already in settlement order.
//!
//! Every operation writes exactly one batch. When a batch must be followed by
//! an external effect (a payout), [`Journal::commit_then`] rolls the batch
//! back if the effect fails.

use std::collections::BTreeSet;

use exitgame_types::{ExitGameError, ExitId, ExitOutcome, ExitRecord, PriorityKey, Result};

use crate::{
    kv::{BatchOperation, KeyValueStore},
    state::{BondTotals, ExitState, ExitTerms},
};

const RECORD_PREFIX: &[u8] = b"exit/record/";
const QUEUE_PREFIX: &[u8] = b"exit/queue/";
const OUTCOME_PREFIX: &[u8] = b"exit/outcome/";
const BONDS_KEY: &[u8] = b"exit/meta/bonds";
const TERMS_KEY: &[u8] = b"exit/meta/terms";

fn record_key(exit_id: &ExitId) -> Vec<u8> {
    [RECORD_PREFIX, exit_id.as_bytes()].concat()
}

fn queue_key(priority: PriorityKey, exit_id: &ExitId) -> Vec<u8> {
    [QUEUE_PREFIX, &priority.to_be_bytes(), exit_id.as_bytes()].concat()
}

fn outcome_key(exit_id: &ExitId) -> Vec<u8> {
    [OUTCOME_PREFIX, exit_id.as_bytes()].concat()
}

fn exit_id_from(bytes: &[u8]) -> Result<ExitId> {
    <[u8; 32]>::try_from(bytes)
        .map(ExitId)
        .map_err(|_| ExitGameError::Storage(format!("bad exit id length {}", bytes.len())))
}

/// Writes produced by one exit game operation.
#[derive(Debug, Default)]
pub struct WriteBatch {
    ops: Vec<BatchOperation>,
}

impl WriteBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_record(&mut self, exit_id: &ExitId, record: &ExitRecord) -> Result<()> {
        self.ops
            .push(BatchOperation::put(record_key(exit_id), serde_json::to_vec(record)?));
        Ok(())
    }

    pub fn enqueue(&mut self, priority: PriorityKey, exit_id: &ExitId) {
        self.ops
            .push(BatchOperation::put(queue_key(priority, exit_id), exit_id.as_bytes().to_vec()));
    }

    pub fn dequeue(&mut self, priority: PriorityKey, exit_id: &ExitId) {
        self.ops
            .push(BatchOperation::delete(queue_key(priority, exit_id)));
    }

    pub fn put_outcome(&mut self, exit_id: &ExitId, outcome: ExitOutcome) {
        let value = vec![u8::from(outcome.is_paid())];
        self.ops.push(BatchOperation::put(outcome_key(exit_id), value));
    }

    pub fn put_bonds(&mut self, totals: &BondTotals) -> Result<()> {
        self.ops
            .push(BatchOperation::put(BONDS_KEY.to_vec(), serde_json::to_vec(totals)?));
        Ok(())
    }

    pub fn put_terms(&mut self, terms: &ExitTerms) -> Result<()> {
        self.ops
            .push(BatchOperation::put(TERMS_KEY.to_vec(), serde_json::to_vec(terms)?));
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Persists exit game state and rebuilds it after a restart.
pub struct Journal {
    store: Box<dyn KeyValueStore>,
}

impl Journal {
    #[must_use]
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Apply a batch with no follow-up effect.
    pub fn commit(&mut self, batch: WriteBatch) -> Result<()> {
        self.store.atomic_batch_write(batch.ops)
    }

    /// Apply a batch, then run `effect`. If the effect fails, the batch is
    /// reverted and the effect's error returned.
    pub fn commit_then<T>(
        &mut self,
        batch: WriteBatch,
        effect: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let undo = self.undo_for(&batch)?;
        self.store.atomic_batch_write(batch.ops)?;

        match effect() {
            Ok(value) => Ok(value),
            Err(err) => {
                if let Err(undo_err) = self.store.atomic_batch_write(undo) {
                    tracing::error!(
                        %err,
                        %undo_err,
                        "Journal rollback failed; durable state is ahead of effects"
                    );
                }
                Err(err)
            }
        }
    }

    /// Operations restoring every key touched by `batch` to its current value.
    fn undo_for(&self, batch: &WriteBatch) -> Result<Vec<BatchOperation>> {
        let mut seen = BTreeSet::new();
        let mut undo = Vec::with_capacity(batch.ops.len());
        for op in &batch.ops {
            let key = op.key();
            if !seen.insert(key.to_vec()) {
                continue;
            }
            undo.push(match self.store.get(key)? {
                Some(value) => BatchOperation::put(key.to_vec(), value),
                None => BatchOperation::delete(key.to_vec()),
            });
        }
        Ok(undo)
    }

    /// Rebuild the full in-memory state.
    ///
    /// # Errors
    /// [`ExitGameError::Storage`] or [`ExitGameError::Serialization`] on
    /// unreadable entries, [`ExitGameError::Internal`] if the persisted
    /// registries contradict each other.
    pub fn load(&self) -> Result<ExitState> {
        let mut state = ExitState::new();

        for (key, value) in self.store.prefix_scan(RECORD_PREFIX)? {
            let exit_id = exit_id_from(&key[RECORD_PREFIX.len()..])?;
            let record: ExitRecord = serde_json::from_slice(&value)?;
            if record.exit_id() != exit_id {
                return Err(ExitGameError::Internal(format!(
                    "record stored under {exit_id} hashes to {}",
                    record.exit_id()
                )));
            }
            state.records.insert(exit_id, record)?;
        }

        for (key, value) in self.store.prefix_scan(OUTCOME_PREFIX)? {
            let exit_id = exit_id_from(&key[OUTCOME_PREFIX.len()..])?;
            let outcome = match value.as_slice() {
                [1] => ExitOutcome::Paid,
                [0] => ExitOutcome::Skipped,
                other => {
                    return Err(ExitGameError::Serialization(format!(
                        "bad outcome value {other:?} for {exit_id}"
                    )));
                }
            };
            state.outcomes.record(exit_id, outcome)?;
        }

        for (key, _) in self.store.prefix_scan(QUEUE_PREFIX)? {
            let body = &key[QUEUE_PREFIX.len()..];
            let Some((priority, id_bytes)) = body.split_first_chunk::<16>() else {
                return Err(ExitGameError::Storage(format!(
                    "bad queue key length {}",
                    key.len()
                )));
            };
            let priority = PriorityKey::from_be_bytes(*priority);
            let exit_id = exit_id_from(id_bytes)?;

            let record = state.records.get(&exit_id).ok_or_else(|| {
                ExitGameError::Internal(format!("queued exit {exit_id} has no record"))
            })?;
            if record.priority() != priority {
                return Err(ExitGameError::Internal(format!(
                    "queued exit {exit_id} under priority {priority}, record says {}",
                    record.priority()
                )));
            }
            if state.outcomes.is_finalized(&exit_id) {
                return Err(ExitGameError::Internal(format!(
                    "exit {exit_id} is both queued and finalized"
                )));
            }
            state.queue.insert(priority, exit_id);
        }

        if let Some(bytes) = self.store.get(BONDS_KEY)? {
            state.bonds = serde_json::from_slice(&bytes)?;
        }
        if let Some(bytes) = self.store.get(TERMS_KEY)? {
            state.terms = Some(serde_json::from_slice(&bytes)?);
        }

        Ok(state)
    }
}

impl std::fmt::Debug for Journal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journal").finish_non_exhaustive()
    }
}
