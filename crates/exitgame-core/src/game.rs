//! Exit lifecycle controller.
//!
//! [`ExitGame`] owns the record store, the priority queue, the outcome set
//! and the journal, and is the only place any of them change. Each of the
//! three mutating operations follows the same shape:
//!
//! 1. validate everything against the current state and the ports
//! 2. build one journal batch describing the change
//! 3. commit the batch (and, for finalize, the payout batch with it)
//! 4. apply the same change in memory and emit events
//!
//! A rejection in steps 1-3 leaves both durable and in-memory state exactly
//! as they were.

use exitgame_proofs::{BlockRoots, InclusionProof, ProofVerifier, TransactionCodec};
use exitgame_types::{
    Address, BlockRoot, BondDisposition, ExitEvent, ExitGameConfig, ExitGameError, ExitId,
    ExitOutcome, ExitRecord, OutputCoordinate, PriorityKey, Result, TxHash, U256,
};

use crate::{
    clock::Clock,
    finalize::{self, FinalizePlan, FinalizeReport},
    journal::{Journal, WriteBatch},
    kv::KeyValueStore,
    payout::Payout,
    state::{BondTotals, ExitState, ExitTerms},
};

/// Injected collaborators.
pub struct Collaborators {
    pub verifier: Box<dyn ProofVerifier>,
    pub codec: Box<dyn TransactionCodec>,
    pub blocks: Box<dyn BlockRoots>,
    pub clock: Box<dyn Clock>,
    pub payout: Box<dyn Payout>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Claim to withdraw one output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartExit {
    pub block_number: u32,
    pub output_index: u8,
    /// Serialized transaction that created the output.
    pub tx_bytes: Vec<u8>,
    /// Inclusion proof in wire format; carries the transaction's position.
    pub proof: Vec<u8>,
    pub caller: Address,
    pub bond: U256,
}

/// Identity and settlement slot of an accepted exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartedExit {
    pub exit_id: ExitId,
    pub priority: PriorityKey,
}

/// Evidence that an exited output was already spent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeSpentExit {
    pub exit_id: ExitId,
    pub spend_block_number: u32,
    pub spend_tx_bytes: Vec<u8>,
    pub spend_proof: Vec<u8>,
    /// Which input of the spending transaction consumes the exited output.
    pub input_index: u8,
}

/// The exit game.
pub struct ExitGame {
    config: ExitGameConfig,
    ports: Collaborators,
    journal: Journal,
    state: ExitState,
    events: Vec<ExitEvent>,
}

impl ExitGame {
    /// Open an exit game over `store`, rebuilding any state it already holds.
    ///
    /// # Errors
    /// [`ExitGameError::Configuration`] for an invalid config, or one whose
    /// bond or exit delay differs from the terms the stored exits were
    /// accepted under; storage and consistency errors from [`Journal::load`].
    pub fn open(
        config: ExitGameConfig,
        ports: Collaborators,
        store: Box<dyn KeyValueStore>,
    ) -> Result<Self> {
        config.validate()?;
        let journal = Journal::new(store);
        let state = journal.load()?;
        state.check_terms(&ExitTerms::of(&config))?;

        tracing::info!(
            version = exitgame_types::constants::VERSION,
            exit_delay_secs = config.exit_delay_secs,
            bond = %config.bond,
            forfeit_policy = %config.forfeit_policy,
            records = state.records.len(),
            valid = state.records.valid_count(),
            queued = state.queue.len(),
            finalized = state.outcomes.len(),
            "Exit game opened"
        );

        Ok(Self {
            config,
            ports,
            journal,
            state,
            events: Vec::new(),
        })
    }

    // ── start_exit ──────────────────────────────────────────────────

    /// Register a claim on a committed output and enqueue it.
    ///
    /// # Errors
    /// In check order: `InsufficientBond`, `UnknownBlock`, `InvalidProof`
    /// (undecodable), `MalformedTransaction`, `OutputIndexOutOfRange`,
    /// `InvalidProof` (not included), `NotOutputOwner`, `DuplicateExit`.
    pub fn start_exit(&mut self, req: StartExit) -> Result<StartedExit> {
        if req.bond != self.config.bond {
            return Err(ExitGameError::InsufficientBond {
                required: self.config.bond,
                posted: req.bond,
            });
        }

        let root = self.root_of(req.block_number)?;
        let proof = InclusionProof::decode(&req.proof)?;
        let tx = self.ports.codec.decode(&req.tx_bytes)?;
        let output = tx
            .output(req.output_index)
            .ok_or(ExitGameError::OutputIndexOutOfRange {
                index: req.output_index,
                outputs: tx.outputs.len(),
            })?;

        let coordinate = OutputCoordinate::new(req.block_number, proof.tx_index, req.output_index);
        if !self
            .ports
            .verifier
            .verify_inclusion(&root, &coordinate, &req.tx_bytes, &proof)
        {
            return Err(ExitGameError::InvalidProof {
                reason: format!("transaction not committed at {coordinate}"),
            });
        }

        if output.owner != req.caller {
            return Err(ExitGameError::NotOutputOwner {
                caller: req.caller,
                owner: output.owner,
            });
        }

        let record = ExitRecord::new(
            TxHash::of(&req.tx_bytes),
            output.amount,
            output.owner,
            coordinate,
            self.ports.clock.now(),
        );
        let exit_id = record.exit_id();
        let priority = record.priority();
        if self.state.records.contains(&exit_id) {
            return Err(ExitGameError::DuplicateExit(exit_id));
        }

        let held = self
            .state
            .bonds
            .held
            .checked_add(req.bond)
            .ok_or_else(|| ExitGameError::AmountOverflow {
                reason: "held bond total".into(),
            })?;
        let bonds = BondTotals {
            held,
            ..self.state.bonds
        };

        let mut batch = WriteBatch::new();
        batch.put_record(&exit_id, &record)?;
        batch.enqueue(priority, &exit_id);
        batch.put_bonds(&bonds)?;
        let terms = ExitTerms::of(&self.config);
        if self.state.terms.is_none() {
            batch.put_terms(&terms)?;
        }
        self.journal.commit(batch)?;

        tracing::info!(
            exit_id = %exit_id,
            owner = %record.owner,
            coordinate = %coordinate,
            amount = %record.amount,
            tx_ref = hex::encode(record.transaction_ref.as_bytes()),
            "Exit started"
        );

        self.events.push(ExitEvent::ExitTransactionPublished {
            transaction_ref: record.transaction_ref,
            tx_data: req.tx_bytes,
        });
        self.events
            .push(ExitEvent::ExitPriorityAssigned { exit_id, priority });
        self.events.push(ExitEvent::ExitStarted {
            exit_id,
            owner: record.owner,
            coordinate,
        });

        self.state.records.insert(exit_id, record)?;
        self.state.queue.insert(priority, exit_id);
        self.state.bonds = bonds;
        self.state.terms = Some(terms);

        Ok(StartedExit { exit_id, priority })
    }

    // ── challenge_spent_exit ────────────────────────────────────────

    /// Invalidate an exit by proving its output was spent later.
    ///
    /// The exit keeps its queue slot; finalize settles it without payout.
    ///
    /// # Errors
    /// In check order: `UnknownExit`, `ExitAlreadyFinalized`,
    /// `AlreadyInvalid`, `InvalidProof` (undecodable), `SpendNotAfterExit`,
    /// `UnknownBlock`, `MalformedTransaction`, `InputMismatch`,
    /// `InvalidProof` (spend not committed).
    pub fn challenge_spent_exit(&mut self, req: ChallengeSpentExit) -> Result<ExitRecord> {
        let (record, spend_tx_index) = self.validate_challenge(&req).inspect_err(|err| {
            tracing::warn!(exit_id = %req.exit_id, %err, "Challenge rejected");
        })?;

        let mut batch = WriteBatch::new();
        batch.put_record(&req.exit_id, &record)?;
        self.journal.commit(batch)?;

        tracing::warn!(
            exit_id = %req.exit_id,
            owner = %record.owner,
            spend_block = req.spend_block_number,
            spend_tx_index,
            "Exit challenged: output already spent"
        );

        self.events.push(ExitEvent::ExitChallenged {
            exit_id: req.exit_id,
            spend_block_number: req.spend_block_number,
            spend_tx_index,
        });
        self.state.records.replace(req.exit_id, record.clone())?;

        Ok(record)
    }

    /// Run every challenge check; return the invalidated record and the
    /// spending transaction's position.
    fn validate_challenge(&self, req: &ChallengeSpentExit) -> Result<(ExitRecord, u32)> {
        let mut record = self
            .state
            .records
            .get(&req.exit_id)
            .cloned()
            .ok_or(ExitGameError::UnknownExit(req.exit_id))?;
        if self.state.outcomes.is_finalized(&req.exit_id) {
            return Err(ExitGameError::ExitAlreadyFinalized(req.exit_id));
        }
        record.invalidate()?;

        let proof = InclusionProof::decode(&req.spend_proof)?;
        let exited = record.coordinate;
        if !exited.is_created_before(req.spend_block_number, proof.tx_index) {
            return Err(ExitGameError::SpendNotAfterExit {
                exited,
                spend_block: req.spend_block_number,
                spend_tx_index: proof.tx_index,
            });
        }

        let root = self.root_of(req.spend_block_number)?;
        let spending = self.ports.codec.decode(&req.spend_tx_bytes)?;
        if !spending.spends_at(req.input_index, &exited) {
            return Err(ExitGameError::InputMismatch {
                input_index: req.input_index,
                expected: exited,
            });
        }

        if !self.ports.verifier.verify_spend(
            &root,
            req.input_index,
            &req.spend_tx_bytes,
            &proof,
            &exited,
        ) {
            return Err(ExitGameError::InvalidProof {
                reason: format!(
                    "spend not committed in block {} at {}",
                    req.spend_block_number, proof.tx_index
                ),
            });
        }

        Ok((record, proof.tx_index))
    }

    // ── finalize_exits ──────────────────────────────────────────────

    /// Settle up to `max_items` mature exits from the head of the queue.
    ///
    /// All payments of one call go to the payout port as a single batch; if
    /// it fails the whole call is rejected and nothing changes.
    ///
    /// # Errors
    /// `NothingToFinalize` when no exit could be settled; `PayoutFailed`,
    /// `AmountOverflow`, or a storage error otherwise.
    pub fn finalize_exits(&mut self, max_items: usize) -> Result<FinalizeReport> {
        let now = self.ports.clock.now();
        let plan = finalize::plan(&self.state, &self.config, now, max_items)?;

        let mut batch = WriteBatch::new();
        for s in &plan.settlements {
            batch.dequeue(s.priority, &s.exit_id);
            batch.put_outcome(&s.exit_id, s.outcome);
        }
        batch.put_bonds(&plan.bonds)?;

        let payout = &mut self.ports.payout;
        let payments = &plan.payments;
        self.journal
            .commit_then(batch, || payout.pay(payments))
            .inspect_err(|err| {
                tracing::warn!(
                    %err,
                    settlements = plan.settlements.len(),
                    "Finalize rejected"
                );
            })?;

        self.apply_finalize(plan, now)
    }

    /// [`Self::finalize_exits`] with the configured default budget.
    pub fn finalize_default(&mut self) -> Result<FinalizeReport> {
        self.finalize_exits(self.config.default_finalize_budget)
    }

    fn apply_finalize(&mut self, plan: FinalizePlan, now: u64) -> Result<FinalizeReport> {
        let FinalizePlan {
            settlements,
            bonds,
            stop,
            ..
        } = plan;
        let mut outcomes = Vec::with_capacity(settlements.len());
        let mut total_paid = U256::zero();

        for s in settlements {
            match self.state.queue.pop_min() {
                Some((priority, exit_id)) if priority == s.priority && exit_id == s.exit_id => {}
                other => {
                    return Err(ExitGameError::Internal(format!(
                        "queue head {other:?} diverged from planned {}",
                        s.exit_id
                    )));
                }
            }
            self.state.outcomes.record(s.exit_id, s.outcome)?;
            total_paid = total_paid.saturating_add(s.payout);

            tracing::debug!(
                exit_id = %s.exit_id,
                outcome = %s.outcome,
                payout = %s.payout,
                owner = %s.record.owner,
                "Exit finalized"
            );

            self.events.push(ExitEvent::ExitFinalized {
                exit_id: s.exit_id,
                paid: s.outcome.is_paid(),
                payout: s.payout,
            });
            if let Some(disposition) = s.forfeit {
                match disposition {
                    BondDisposition::Burned => {
                        tracing::warn!(exit_id = %s.exit_id, bond = %self.config.bond, "Bond burned");
                    }
                    BondDisposition::Swept(to) => {
                        tracing::warn!(exit_id = %s.exit_id, %to, bond = %self.config.bond, "Bond swept");
                    }
                }
                self.events.push(ExitEvent::BondForfeited {
                    exit_id: s.exit_id,
                    bond: self.config.bond,
                    disposition,
                });
            }
            outcomes.push((s.exit_id, s.outcome.is_paid()));
        }
        self.state.bonds = bonds;

        tracing::info!(
            processed = outcomes.len(),
            paid = outcomes.iter().filter(|(_, paid)| *paid).count(),
            total_paid = %total_paid,
            remaining = self.state.queue.len(),
            stop = %stop,
            now,
            "Finalize complete"
        );

        Ok(FinalizeReport {
            processed: outcomes.len(),
            outcomes,
            stop,
        })
    }

    // ── Queries ─────────────────────────────────────────────────────

    #[must_use]
    pub fn query_exit(&self, exit_id: &ExitId) -> Option<&ExitRecord> {
        self.state.records.get(exit_id)
    }

    #[must_use]
    pub fn queue_size(&self) -> usize {
        self.state.queue.len()
    }

    /// Exit that the next finalize would settle first.
    #[must_use]
    pub fn queue_peek_min(&self) -> Option<ExitId> {
        self.state.queue.peek_min().map(|(_, id)| id)
    }

    /// `Some(paid)` once the exit has left the queue.
    #[must_use]
    pub fn exit_outcome(&self, exit_id: &ExitId) -> Option<bool> {
        self.state.outcomes.get(exit_id).map(ExitOutcome::is_paid)
    }

    #[must_use]
    pub fn is_successful_exit(&self, exit_id: &ExitId) -> bool {
        self.state.outcomes.is_successful(exit_id)
    }

    /// Queued exits in settlement order.
    #[must_use]
    pub fn pending_exits(&self) -> Vec<(PriorityKey, ExitId)> {
        self.state.queue.iter().collect()
    }

    /// Whether the exit's challenge window has elapsed.
    ///
    /// # Errors
    /// [`ExitGameError::UnknownExit`] if no such exit exists.
    pub fn is_mature(&self, exit_id: &ExitId) -> Result<bool> {
        let record = self
            .state
            .records
            .get(exit_id)
            .ok_or(ExitGameError::UnknownExit(*exit_id))?;
        Ok(record.is_mature(self.config.exit_delay_secs, self.ports.clock.now()))
    }

    #[must_use]
    pub fn bond(&self) -> U256 {
        self.config.bond
    }

    #[must_use]
    pub fn exit_delay(&self) -> u64 {
        self.config.exit_delay_secs
    }

    /// Collateral currently held for queued exits.
    #[must_use]
    pub fn bonds_held(&self) -> U256 {
        self.state.bonds.held
    }

    #[must_use]
    pub fn bond_totals(&self) -> BondTotals {
        self.state.bonds
    }

    #[must_use]
    pub fn config(&self) -> &ExitGameConfig {
        &self.config
    }

    /// Drain notifications emitted since the last call.
    pub fn take_events(&mut self) -> Vec<ExitEvent> {
        std::mem::take(&mut self.events)
    }

    fn root_of(&self, block_number: u32) -> Result<BlockRoot> {
        self.ports
            .blocks
            .root_of(block_number)
            .ok_or(ExitGameError::UnknownBlock(block_number))
    }
}

impl std::fmt::Debug for ExitGame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExitGame")
            .field("config", &self.config)
            .field("records", &self.state.records.len())
            .field("queued", &self.state.queue.len())
            .field("finalized", &self.state.outcomes.len())
            .finish_non_exhaustive()
    }
}
