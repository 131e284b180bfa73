//! Game configuration and jackpot policy tables.
//!
//! All numeric policy (the escalating daily schedule, bucket shares, the
//! exterminator share rule, decimator tiers) lives here as data, not code.
//! Defaults reproduce the showcased economy but any validated table works.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Basis points denominator (100% == 10_000).
pub const BPS: u64 = 10_000;

/// Configuration validation failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("daily schedule must not be empty")]
    EmptySchedule,
    #[error("{0} exceeds 10_000 basis points")]
    BpsOverflow(&'static str),
    #[error("bucket shares sum to more than 10_000 basis points")]
    BucketShareOverflow,
    #[error("decimator tiers must start at zero and be strictly ascending")]
    BadTiers,
}

/// One decimator payout tier. Entrants whose cumulative round burn volume at
/// ticket time is at least `min_burned` (and below the next tier's floor)
/// fall into this tier and carry its multiplier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecimatorTier {
    /// Inclusive lower bound on cumulative burned units.
    pub min_burned: u64,
    /// Payout multiplier in basis points (10_000 == 1x).
    pub multiplier_bps: u16,
}

/// Jackpot policy tables.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JackpotSchedule {
    /// Escalating basis-point share of the prize pool claimed by successive
    /// daily jackpots. Index = jackpot-of-the-day.
    pub daily_bps: Vec<u16>,
    /// Share of each daily slice allocated to the four winning-trait buckets.
    pub bucket_share_bps: [u16; 4],
    /// Exterminator's share of the prize pool on a normal round.
    pub exterminator_share_bps: u16,
    /// Exterminator's share on bonus rounds (see
    /// [`JackpotSchedule::exterminator_bps_for_round`]).
    pub exterminator_bonus_share_bps: u16,
    /// Number of sampled draws for the map jackpot.
    pub map_draws: u8,
    /// Share of the prize pool reserved for the decimator when it runs.
    pub decimator_pool_bps: u16,
    /// Burn-volume tiers for the decimator, ascending by `min_burned`.
    pub decimator_tiers: Vec<DecimatorTier>,
}

impl Default for JackpotSchedule {
    fn default() -> Self {
        Self {
            // Sums to ~95% of the pool over ten jackpots, escalating.
            daily_bps: vec![610, 677, 746, 813, 881, 949, 1017, 1085, 1153, 1225],
            bucket_share_bps: [2500, 2500, 2500, 2500],
            exterminator_share_bps: 3000,
            exterminator_bonus_share_bps: 4000,
            map_draws: 4,
            decimator_pool_bps: 1500,
            decimator_tiers: vec![
                DecimatorTier {
                    min_burned: 0,
                    multiplier_bps: 10_000,
                },
                DecimatorTier {
                    min_burned: 10,
                    multiplier_bps: 20_000,
                },
                DecimatorTier {
                    min_burned: 100,
                    multiplier_bps: 40_000,
                },
            ],
        }
    }
}

impl JackpotSchedule {
    /// Exterminator share for the round that just ended. Rounds whose index
    /// ends in 4 (except round 4 itself) pay the bonus share.
    pub fn exterminator_bps_for_round(&self, round_index: u32) -> u16 {
        if round_index % 10 == 4 && round_index != 4 {
            self.exterminator_bonus_share_bps
        } else {
            self.exterminator_share_bps
        }
    }

    /// Whether the decimator jackpot runs at the end of the given round.
    pub fn decimator_runs(&self, round_index: u32) -> bool {
        round_index % 10 == 5 && round_index >= 15 && round_index % 100 != 95
    }

    /// Tier index for a cumulative burn volume.
    pub fn tier_for(&self, burned: u64) -> u8 {
        let mut tier = 0u8;
        for (i, t) in self.decimator_tiers.iter().enumerate() {
            if burned >= t.min_burned {
                tier = i as u8;
            }
        }
        tier
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.daily_bps.is_empty() {
            return Err(ConfigError::EmptySchedule);
        }
        if self.daily_bps.iter().any(|&bps| u64::from(bps) > BPS) {
            return Err(ConfigError::BpsOverflow("daily_bps"));
        }
        let bucket_sum: u64 = self.bucket_share_bps.iter().map(|&b| u64::from(b)).sum();
        if bucket_sum > BPS {
            return Err(ConfigError::BucketShareOverflow);
        }
        for field in [
            ("exterminator_share_bps", self.exterminator_share_bps),
            (
                "exterminator_bonus_share_bps",
                self.exterminator_bonus_share_bps,
            ),
            ("decimator_pool_bps", self.decimator_pool_bps),
        ] {
            if u64::from(field.1) > BPS {
                return Err(ConfigError::BpsOverflow(field.0));
            }
        }
        match self.decimator_tiers.first() {
            Some(first) if first.min_burned == 0 => {}
            _ => return Err(ConfigError::BadTiers),
        }
        for pair in self.decimator_tiers.windows(2) {
            if pair[1].min_burned <= pair[0].min_burned {
                return Err(ConfigError::BadTiers);
            }
        }
        if self.map_draws == 0 {
            return Err(ConfigError::Zero("map_draws"));
        }
        Ok(())
    }
}

/// Top-level engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Price of one minted entry, in pool units.
    pub price_unit: u64,
    /// Length of one "day": at most one daily jackpot per day.
    pub day_ms: u64,
    /// Pending randomness older than this is considered stalled.
    pub stall_threshold_ms: u64,
    /// Minimum duration of the setup phase before purchase can open.
    pub setup_window_ms: u64,
    /// Number of minted entries required to open the purchase phase.
    pub mint_target: u32,
    /// Hard cap on jackpots per round; reaching it forces the burn phase.
    pub jackpot_cap: u8,
    /// Terminal round index; finalizing this round ends the game.
    pub max_level: u32,
    /// Sampled winners per winning-trait bucket.
    pub winners_per_bucket: u8,
    /// Starting supply per trait at round open.
    pub trait_start_supply: u32,
    /// If set, draining the prize pool to or below this closes purchase early.
    pub early_close_pool_target: Option<u64>,
    /// Jackpot policy tables.
    pub schedule: JackpotSchedule,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            price_unit: 1_000,
            day_ms: 86_400_000,
            stall_threshold_ms: 3_600_000,
            setup_window_ms: 86_400_000,
            mint_target: 100,
            jackpot_cap: 10,
            max_level: 100,
            winners_per_bucket: 3,
            trait_start_supply: 64,
            early_close_pool_target: None,
            schedule: JackpotSchedule::default(),
        }
    }
}

impl GameConfig {
    /// Validate the configuration. All durations and counts must be non-zero
    /// and every basis-point table must be within bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.price_unit == 0 {
            return Err(ConfigError::Zero("price_unit"));
        }
        if self.day_ms == 0 {
            return Err(ConfigError::Zero("day_ms"));
        }
        if self.stall_threshold_ms == 0 {
            return Err(ConfigError::Zero("stall_threshold_ms"));
        }
        if self.mint_target == 0 {
            return Err(ConfigError::Zero("mint_target"));
        }
        if self.jackpot_cap == 0 {
            return Err(ConfigError::Zero("jackpot_cap"));
        }
        if self.max_level == 0 {
            return Err(ConfigError::Zero("max_level"));
        }
        if self.winners_per_bucket == 0 {
            return Err(ConfigError::Zero("winners_per_bucket"));
        }
        if self.trait_start_supply == 0 {
            return Err(ConfigError::Zero("trait_start_supply"));
        }
        self.schedule.validate()
    }
}
