//! # exitgame-core
//!
//! **Exit lifecycle controller** for a Plasma-style withdrawal game.
//!
//! ## Lifecycle
//!
//! 1. `start_exit`: an output owner proves their output is committed in a
//!    block, posts a bond, and is queued by the output's age.
//! 2. `challenge_spent_exit`: anyone proves the output was consumed by a
//!    later transaction; the exit is marked invalid but keeps its slot.
//! 3. `finalize_exits`: once the challenge window has elapsed, the queue is
//!    drained oldest-output-first. Valid exits are paid amount plus bond;
//!    invalid ones are settled without payout and their bond is forfeited.
//!
//! ## Modules
//!
//! - [`game`]: the [`ExitGame`] controller and its requests
//! - [`finalize`]: the finalize state machine and planning
//! - [`queue`], [`store`], [`outcomes`], [`state`]: in-memory registries
//! - [`journal`], [`kv`]: durable state and its storage port
//! - [`clock`], [`payout`]: time and funds-transfer ports
//! - [`shared`]: thread-safe handle

pub mod clock;
pub mod finalize;
pub mod game;
pub mod journal;
pub mod kv;
pub mod outcomes;
pub mod payout;
pub mod queue;
pub mod shared;
pub mod state;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use finalize::{FinalizeReport, FinalizeState};
pub use game::{ChallengeSpentExit, Collaborators, ExitGame, StartExit, StartedExit};
pub use kv::{BatchOperation, InMemoryKvStore, KeyValueStore};
pub use payout::{Ledger, Payment, Payout};
pub use shared::SharedExitGame;
pub use state::{BondTotals, ExitTerms};
