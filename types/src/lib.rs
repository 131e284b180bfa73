//! Common types used throughout pyre.
//!
//! This crate defines the data model shared by the engine and its drivers:
//! identities, trait ids, round phases, policy configuration, and the
//! persisted state records with their canonical binary encodings.

pub mod config;
pub mod primitives;
pub mod state;

pub use config::{ConfigError, DecimatorTier, GameConfig, JackpotSchedule, BPS};
pub use primitives::{JackpotKind, PlayerId, RoundPhase, TraitId, TRAIT_COUNT};
pub use state::{BurnStats, PendingPayout, PendingReward, Round, TraitSupply};
