//! Shared harness for exit game integration tests.
//!
//! Every collaborator is a shared handle, so a test can commit blocks, move
//! the clock and inspect balances while the game owns its own copies.

#![allow(dead_code)]

use std::collections::BTreeMap;

use exitgame_core::{
    ChallengeSpentExit, Collaborators, ExitGame, InMemoryKvStore, Ledger, ManualClock, StartExit,
};
use exitgame_proofs::{BlockTree, CommittedBlocks, JsonCodec, MerkleVerifier, TransactionCodec};
use exitgame_types::{
    Address, ExitGameConfig, ExitId, ExitRecord, OutputCoordinate, PriorityKey, Result,
    Transaction, U256,
};
use tracing_subscriber::EnvFilter;

pub const BOND: u64 = 1_000;
pub const DELAY: u64 = 7 * 24 * 3_600;
pub const GENESIS: u64 = 1_700_000_000;

pub fn alice() -> Address {
    Address::repeat(0xa1)
}

pub fn bob() -> Address {
    Address::repeat(0xb0)
}

pub fn carol() -> Address {
    Address::repeat(0xc4)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn test_config() -> ExitGameConfig {
    ExitGameConfig {
        exit_delay_secs: DELAY,
        bond: U256::from(BOND),
        ..ExitGameConfig::default()
    }
}

/// A transaction committed in a block, with its wire-format proof.
#[derive(Debug, Clone)]
pub struct Committed {
    pub block_number: u32,
    pub tx_index: u32,
    pub bytes: Vec<u8>,
    pub proof: Vec<u8>,
}

impl Committed {
    pub fn output(&self, output_index: u8) -> OutputCoordinate {
        OutputCoordinate::new(self.block_number, self.tx_index, output_index)
    }
}

/// Everything observable about exit game state, for before/after checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub disk: BTreeMap<Vec<u8>, Vec<u8>>,
    pub pending: Vec<(PriorityKey, ExitId)>,
    pub bonds_held: U256,
    pub transfers: usize,
}

pub struct Harness {
    pub game: ExitGame,
    pub config: ExitGameConfig,
    pub blocks: CommittedBlocks,
    pub clock: ManualClock,
    pub ledger: Ledger,
    pub store: InMemoryKvStore,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(test_config(), Ledger::unbounded())
    }

    pub fn with(config: ExitGameConfig, ledger: Ledger) -> Self {
        init_tracing();
        let blocks = CommittedBlocks::new();
        let clock = ManualClock::new(GENESIS);
        let store = InMemoryKvStore::new();
        let game = open(&config, &blocks, &clock, &ledger, &store).unwrap();
        Self {
            game,
            config,
            blocks,
            clock,
            ledger,
            store,
        }
    }

    /// A second game over the same disk, chain, clock and ledger.
    pub fn reopen(&self) -> Result<ExitGame> {
        self.open_with(&self.config)
    }

    /// A second game over the same collaborators with a different config.
    pub fn open_with(&self, config: &ExitGameConfig) -> Result<ExitGame> {
        open(config, &self.blocks, &self.clock, &self.ledger, &self.store)
    }

    pub fn commit_block(&self, number: u32, txs: &[Transaction]) -> Vec<Committed> {
        let bytes: Vec<Vec<u8>> = txs.iter().map(|tx| JsonCodec.encode(tx).unwrap()).collect();
        self.commit_raw(number, bytes)
    }

    /// Commit arbitrary leaves, decodable or not.
    pub fn commit_raw(&self, number: u32, leaves: Vec<Vec<u8>>) -> Vec<Committed> {
        let tree = BlockTree::build(&leaves);
        self.blocks.commit(number, tree.root()).unwrap();
        leaves
            .into_iter()
            .enumerate()
            .map(|(i, bytes)| {
                let tx_index = u32::try_from(i).unwrap();
                Committed {
                    block_number: number,
                    tx_index,
                    bytes,
                    proof: tree.proof(tx_index).unwrap().encode(),
                }
            })
            .collect()
    }

    pub fn start_request(&self, tx: &Committed, output_index: u8, caller: Address) -> StartExit {
        StartExit {
            block_number: tx.block_number,
            output_index,
            tx_bytes: tx.bytes.clone(),
            proof: tx.proof.clone(),
            caller,
            bond: self.config.bond,
        }
    }

    pub fn start(&mut self, tx: &Committed, caller: Address) -> ExitId {
        let req = self.start_request(tx, 0, caller);
        self.game.start_exit(req).unwrap().exit_id
    }

    pub fn mature(&self) {
        self.clock.advance(self.config.exit_delay_secs);
    }

    pub fn record(&self, exit_id: &ExitId) -> ExitRecord {
        self.game.query_exit(exit_id).cloned().unwrap()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            disk: self.store.snapshot(),
            pending: self.game.pending_exits(),
            bonds_held: self.game.bonds_held(),
            transfers: self.ledger.transfer_count(),
        }
    }
}

pub fn challenge(exit_id: ExitId, spend: &Committed, input_index: u8) -> ChallengeSpentExit {
    ChallengeSpentExit {
        exit_id,
        spend_block_number: spend.block_number,
        spend_tx_bytes: spend.bytes.clone(),
        spend_proof: spend.proof.clone(),
        input_index,
    }
}

fn open(
    config: &ExitGameConfig,
    blocks: &CommittedBlocks,
    clock: &ManualClock,
    ledger: &Ledger,
    store: &InMemoryKvStore,
) -> Result<ExitGame> {
    let ports = Collaborators {
        verifier: Box::new(MerkleVerifier::new(JsonCodec)),
        codec: Box::new(JsonCodec),
        blocks: Box::new(blocks.clone()),
        clock: Box::new(clock.clone()),
        payout: Box::new(ledger.clone()),
    };
    ExitGame::open(config.clone(), ports, Box::new(store.clone()))
}
