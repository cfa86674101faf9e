//! Exit record store.
//!
//! Records are never removed: a finalized exit keeps its entry for audit and
//! so that a replayed `start_exit` is still caught as a duplicate.

use std::collections::HashMap;

use exitgame_types::{ExitGameError, ExitId, ExitRecord, Result};

/// All exit records ever accepted, keyed by exit id.
#[derive(Debug, Default, Clone)]
pub struct ExitRecordStore {
    records: HashMap<ExitId, ExitRecord>,
}

impl ExitRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new record.
    ///
    /// # Errors
    /// [`ExitGameError::DuplicateExit`] if the id is already present.
    pub fn insert(&mut self, exit_id: ExitId, record: ExitRecord) -> Result<()> {
        if self.records.contains_key(&exit_id) {
            return Err(ExitGameError::DuplicateExit(exit_id));
        }
        self.records.insert(exit_id, record);
        Ok(())
    }

    /// Overwrite an existing record (validity flip after a challenge).
    ///
    /// # Errors
    /// [`ExitGameError::UnknownExit`] if the id is not present.
    pub fn replace(&mut self, exit_id: ExitId, record: ExitRecord) -> Result<()> {
        let slot = self
            .records
            .get_mut(&exit_id)
            .ok_or(ExitGameError::UnknownExit(exit_id))?;
        *slot = record;
        Ok(())
    }

    #[must_use]
    pub fn get(&self, exit_id: &ExitId) -> Option<&ExitRecord> {
        self.records.get(exit_id)
    }

    #[must_use]
    pub fn contains(&self, exit_id: &ExitId) -> bool {
        self.records.contains_key(exit_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records still valid.
    #[must_use]
    pub fn valid_count(&self) -> usize {
        self.records.values().filter(|r| r.is_valid).count()
    }
}
