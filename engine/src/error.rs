//! Engine error taxonomy.
//!
//! Time/state gates that are simply "not yet" are not errors; they surface as
//! `StepResult { progressed: false, .. }`. Errors here are either caller
//! mistakes (wrong phase, double request) or fatal invariant violations that
//! must never be silently repaired.

use crate::hooks::HookError;
use pyre_types::{ConfigError, RoundPhase};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// A randomness request is already outstanding; no second id is issued.
    #[error("randomness request already pending")]
    RequestPending,

    /// `consume()` was called without a fulfilled word.
    #[error("randomness word not ready")]
    RandomnessNotReady,

    /// Stall recovery was requested but the pending request is not stalled.
    #[error("pending randomness request is not stalled")]
    NotStalled,

    /// A debit exceeding the claimable balance is rejected outright.
    #[error("insufficient claimable balance: have {have}, need {need}")]
    InsufficientClaimable { have: u64, need: u64 },

    /// The action is not allowed in the current phase.
    #[error("action not allowed in {phase} phase")]
    PhaseMismatch { phase: RoundPhase },

    /// Burning a trait whose remaining supply is already zero.
    #[error("trait {0} has no remaining supply")]
    TraitDepleted(u8),

    /// An external collaborator refused an operation the engine depends on.
    #[error(transparent)]
    External(#[from] HookError),

    /// The game reached its terminal round.
    #[error("game is over")]
    GameOver,

    /// Rejected configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// Internal state is inconsistent. Programmer error; not recoverable.
    #[error("invariant violation: {0}")]
    InvariantViolation(&'static str),
}
