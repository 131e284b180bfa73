//! External collaborator interfaces.
//!
//! The engine owns game state only. Token custody, affiliate revenue sharing,
//! and trophy minting live behind these traits so hosts can wire in whatever
//! backs them. Trophy awards are best-effort: a registry failure is logged
//! and the jackpot outcome stands.

use pyre_types::{JackpotKind, PlayerId, TraitId};
use thiserror::Error;

/// Failure reported by an external collaborator.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("external hook failure: {0}")]
pub struct HookError(pub String);

/// Custody of the game currency.
pub trait TokenLedger {
    /// Move `amount` from the player into the prize pool.
    fn collect(&mut self, player: &PlayerId, amount: u64) -> Result<(), HookError>;

    /// Pay `amount` out to the player.
    fn pay(&mut self, player: &PlayerId, amount: u64) -> Result<(), HookError>;

    /// Mint one game entry of the given trait to the player.
    fn mint_entry(&mut self, player: &PlayerId, trait_id: TraitId) -> Result<(), HookError>;
}

/// Revenue share for referred players. Consulted when a referred player
/// mints entries and again when a jackpot credit lands for them.
pub trait AffiliateProgram {
    /// Affiliate cut owed on an amount moving to or from `player`, in pool
    /// units. Zero when the player has no referrer.
    fn affiliate_cut(&self, player: &PlayerId, amount: u64) -> u64;

    /// Pay the referrer their cut.
    fn pay_affiliate(&mut self, player: &PlayerId, amount: u64) -> Result<(), HookError>;
}

/// Commemorative trophy mints for jackpot winners.
pub trait TrophyRegistry {
    fn award(&mut self, player: &PlayerId, kind: JackpotKind, round: u32) -> Result<(), HookError>;
}

/// Oracle that delivers randomness words asynchronously.
pub trait RandomnessProvider {
    /// Ask the oracle to fulfill `request_id`. The word arrives later through
    /// the engine's fulfillment callback.
    fn request(&mut self, request_id: u64) -> Result<(), HookError>;
}
