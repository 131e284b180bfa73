//! Daily jackpot: an escalating slice of the pool paid to holders of four
//! winning traits.
//!
//! Winning-trait selection blends the day's burn statistics with entropy so
//! it is neither fully predictable from activity nor fully random. One trait
//! per quadrant:
//!
//! | quadrant | combo |
//! |---|---|
//! | 0 | hottest symbol, entropy-chosen color |
//! | 1 | hottest color, entropy-chosen symbol |
//! | 2 | hottest full combo |
//! | 3 | entropy-chosen combo |
//!
//! Each bucket claims its configured share of the slice and raffles it over
//! that trait's tickets. Buckets with no tickets leave their share behind.

use super::{bps_share, draw_share, JackpotOutcome};
use crate::rng::Entropy;
use crate::tickets::TicketPool;
use pyre_types::{BurnStats, JackpotSchedule, TraitId};

/// Salt base for bucket draws; bucket `i` draws under `DRAW_SALT + i`.
const DRAW_SALT: u64 = 100;

/// A resolved daily jackpot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DailyDraw {
    pub winning_traits: [TraitId; 4],
    pub outcome: JackpotOutcome,
}

/// Pick the four winning traits from the day's burn tallies and entropy bits.
pub fn winning_traits(stats: &BurnStats, entropy: &Entropy) -> [TraitId; 4] {
    let bits = entropy.as_u64();
    let e_symbol = (bits & 7) as u8;
    let e_color = ((bits >> 3) & 7) as u8;
    let e_combo = ((bits >> 6) & 63) as u8;

    let hot_symbol = BurnStats::hottest(&stats.symbol);
    let hot_color = BurnStats::hottest(&stats.color);
    let hot_combo = BurnStats::hottest(&stats.combo);

    [
        TraitId::from_parts(0, (e_color << 3) | hot_symbol),
        TraitId::from_parts(1, (hot_color << 3) | e_symbol),
        TraitId::from_parts(2, hot_combo),
        TraitId::from_parts(3, e_combo),
    ]
}

/// Resolve one daily jackpot over `slice` pool units.
pub fn resolve(
    slice: u64,
    stats: &BurnStats,
    tickets: &TicketPool,
    entropy: &Entropy,
    schedule: &JackpotSchedule,
    winners_per_bucket: u8,
) -> DailyDraw {
    let traits = winning_traits(stats, entropy);
    let mut winners = Vec::new();
    let mut consumed = 0u64;
    for (i, &trait_id) in traits.iter().enumerate() {
        let share = bps_share(slice, schedule.bucket_share_bps[i]);
        let bucket = draw_share(
            share,
            trait_id,
            tickets,
            entropy,
            DRAW_SALT + i as u64,
            winners_per_bucket,
        );
        consumed += bucket.consumed;
        winners.extend(bucket.winners);
    }
    DailyDraw {
        winning_traits: traits,
        outcome: JackpotOutcome {
            winners,
            consumed,
            leftover: slice - consumed,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::player;

    #[test]
    fn winning_traits_span_all_quadrants() {
        let mut stats = BurnStats::default();
        stats.record(TraitId::from_parts(0, 0b010_011));
        let entropy = Entropy::new([0xA5; 32]);
        let traits = winning_traits(&stats, &entropy);
        for (q, t) in traits.iter().enumerate() {
            assert_eq!(t.quadrant(), q as u8);
        }
    }

    #[test]
    fn hot_traits_reflect_burn_activity() {
        let mut stats = BurnStats::default();
        // Symbol 3 and color 5 dominate the tallies.
        for _ in 0..10 {
            stats.record(TraitId::from_parts(1, 0b101_011));
        }
        let entropy = Entropy::new([0; 32]);
        let traits = winning_traits(&stats, &entropy);
        assert_eq!(traits[0].symbol(), 3);
        assert_eq!(traits[1].color(), 5);
        assert_eq!(traits[2].combo(), 0b101_011);
    }

    #[test]
    fn empty_buckets_leave_their_share() {
        let stats = BurnStats::default();
        let tickets = TicketPool::default();
        let entropy = Entropy::new([3; 32]);
        let schedule = JackpotSchedule::default();

        let draw = resolve(10_000, &stats, &tickets, &entropy, &schedule, 3);
        assert_eq!(draw.outcome.consumed, 0);
        assert_eq!(draw.outcome.leftover, 10_000);
    }

    #[test]
    fn funded_bucket_pays_its_ticket_holders() {
        let stats = BurnStats::default();
        let entropy = Entropy::new([3; 32]);
        let schedule = JackpotSchedule::default();

        // Put the sole ticket holder on every possible winning trait so one
        // bucket is guaranteed to be funded.
        let mut tickets = TicketPool::default();
        let lucky = player(1);
        for t in winning_traits(&stats, &entropy) {
            tickets.add(t, lucky.clone());
        }

        let draw = resolve(10_000, &stats, &tickets, &entropy, &schedule, 2);
        // Four buckets of 2_500, two draws of 1_250 each, all to one player.
        assert_eq!(draw.outcome.winners.len(), 8);
        assert_eq!(draw.outcome.consumed, 10_000);
        assert_eq!(draw.outcome.leftover, 0);
        assert!(draw.outcome.winners.iter().all(|(p, a)| p == &lucky && *a == 1_250));
    }
}
