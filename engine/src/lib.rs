//! Deterministic core of the pyre game economy.
//!
//! A game is a sequence of rounds. Players mint entries during Setup and
//! burn them during Purchase; burns buy lottery tickets on the burned trait.
//! Randomness-driven jackpots redistribute the shared prize pool: an
//! escalating daily jackpot, the extermination milestone that ends the
//! round, a map raffle paying queued mints, and the burn-tiered decimator.
//! Winnings land in a pull-payment claimable ledger.
//!
//! The engine is a plain owned [`Engine`] struct advanced by `&mut self`
//! methods with an explicit `now_ms` clock, so behavior is reproducible from
//! inputs alone. External concerns (token custody, affiliates, trophies,
//! randomness generation) live behind the traits in [`hooks`]. Unbounded
//! work is never done in one call: payouts, reward mints, and supply
//! rebuilds drain through resumable cursors under a per-call work budget.

pub mod batch;
pub mod error;
pub mod hooks;
pub mod jackpot;
pub mod ledger;
pub mod machine;
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
pub mod rng;
pub mod tickets;


pub use error::EngineError;
pub use machine::{Engine, PoolTotals, StepOutcome, StepResult};
