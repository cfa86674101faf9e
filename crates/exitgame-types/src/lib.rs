//! # exitgame-types
//!
//! Shared types, errors, and configuration for the **ExitGame** exit queue.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`Address`], [`TxHash`], [`BlockRoot`], [`ExitId`]
//! - **Ordering**: [`OutputCoordinate`], [`PriorityKey`]
//! - **Exit model**: [`ExitRecord`], [`ExitOutcome`]
//! - **Transaction model**: [`Transaction`], [`TxOutput`], [`TxType`]
//! - **Notifications**: [`ExitEvent`], [`BondDisposition`]
//! - **Configuration**: [`ExitGameConfig`], [`ForfeitPolicy`]
//! - **Errors**: [`ExitGameError`] with `EG_ERR_` prefix codes
//! - **Constants**: defaults and wire-format sizes

pub mod config;
pub mod constants;
pub mod coordinate;
pub mod error;
pub mod event;
pub mod exit;
pub mod ids;
pub mod transaction;

pub use config::*;
pub use coordinate::*;
pub use error::*;
pub use event::*;
pub use exit::*;
pub use ids::*;
pub use transaction::*;

// Amounts are opaque 256-bit unsigned integers.
pub use primitive_types::U256;
