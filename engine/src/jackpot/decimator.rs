//! Decimator jackpot: a burn-volume tiered raffle that runs on a sparse
//! round cadence.
//!
//! Every burn enrolls the burner with the payout tier their cumulative round
//! volume had reached at that moment. At resolution each draw lands uniformly
//! on one enrolled entry and pays the base prize scaled by that entry's tier
//! multiplier, so a burn recorded at a heavier tier is worth more when it
//! wins. Draws are sized against the heaviest enrolled multiplier, so the
//! total paid never exceeds the pool.

use super::JackpotOutcome;
use crate::rng::Entropy;
use pyre_types::{DecimatorTier, PlayerId, BPS};

/// Salt for the prize draws.
const DRAW_SALT: u64 = 400;

/// One enrolled burn: the burner and the tier index recorded at burn time.
pub type Entry = (PlayerId, u8);

fn multiplier_of(tiers: &[DecimatorTier], tier: u8) -> u64 {
    tiers
        .get(tier as usize)
        .map_or(0, |t| u64::from(t.multiplier_bps))
}

/// Raffle `pool` over the enrolled entries in `draws` prizes. Each draw pays
/// `base * multiplier` where `base` assumes every draw could land on the
/// heaviest enrolled tier; lighter winners leave the difference behind. No
/// entries (or all zero-multiplier) leaves the pool untouched.
pub fn resolve(
    pool: u64,
    entries: &[Entry],
    tiers: &[DecimatorTier],
    entropy: &Entropy,
    draws: u8,
) -> JackpotOutcome {
    if pool == 0 || draws == 0 || entries.is_empty() {
        return JackpotOutcome::untouched(pool);
    }
    let max_bps = entries
        .iter()
        .map(|(_, tier)| multiplier_of(tiers, *tier))
        .max()
        .unwrap_or(0);
    if max_bps == 0 {
        return JackpotOutcome::untouched(pool);
    }

    let base = u128::from(pool) * u128::from(BPS) / (u128::from(draws) * u128::from(max_bps));
    let mut winners = Vec::with_capacity(draws as usize);
    let mut consumed = 0u64;
    for i in 0..u64::from(draws) {
        let sub = entropy.derive(DRAW_SALT, i);
        let (player, tier) = &entries[sub.index_below(entries.len())];
        let multiplier = multiplier_of(tiers, *tier);
        if multiplier == 0 {
            continue;
        }
        let amount = (base * u128::from(multiplier) / u128::from(BPS)) as u64;
        winners.push((player.clone(), amount));
        consumed += amount;
    }
    JackpotOutcome {
        winners,
        consumed,
        leftover: pool - consumed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::player;
    use pyre_types::JackpotSchedule;

    fn tiers() -> Vec<DecimatorTier> {
        JackpotSchedule::default().decimator_tiers
    }

    #[test]
    fn no_entries_leaves_pool_untouched() {
        let entropy = Entropy::new([1; 32]);
        let outcome = resolve(100, &[], &tiers(), &entropy, 3);
        assert_eq!(outcome, JackpotOutcome::untouched(100));
    }

    #[test]
    fn draws_split_the_pool_evenly_at_a_single_tier() {
        let entries = vec![(player(1), 0)];
        let entropy = Entropy::new([2; 32]);
        let outcome = resolve(100, &entries, &tiers(), &entropy, 4);
        assert_eq!(outcome.winners.len(), 4);
        assert_eq!(outcome.consumed, 100);
        assert!(outcome.winners.iter().all(|(_, a)| *a == 25));
    }

    #[test]
    fn tier_multiplier_scales_the_payout() {
        // Tier 2 pays 4x what tier 0 pays per winning draw.
        let heavy = player(1);
        let light = player(2);
        let entries = vec![(light.clone(), 0), (heavy.clone(), 2)];
        let tiers = tiers();
        let base = Entropy::new([3; 32]);

        let mut light_amount = None;
        let mut heavy_amount = None;
        for i in 0..200u64 {
            let entropy = base.derive(9, i);
            let outcome = resolve(100, &entries, &tiers, &entropy, 1);
            assert!(outcome.consumed <= 100);
            let (winner, amount) = &outcome.winners[0];
            if *winner == heavy {
                heavy_amount = Some(*amount);
            } else {
                light_amount = Some(*amount);
            }
            if light_amount.is_some() && heavy_amount.is_some() {
                break;
            }
        }
        let light_amount = light_amount.expect("a light win");
        let heavy_amount = heavy_amount.expect("a heavy win");
        assert_eq!(heavy_amount, 100);
        assert_eq!(light_amount, 25);
        assert_eq!(heavy_amount, 4 * light_amount);
    }

    #[test]
    fn consumed_never_exceeds_the_pool() {
        // Mixed tiers over many entries and draws.
        let entries: Vec<Entry> = (0..12).map(|i| (player(i), (i % 3) as u8)).collect();
        let tiers = tiers();
        for fill in 0..16u8 {
            let entropy = Entropy::new([fill; 32]);
            let outcome = resolve(997, &entries, &tiers, &entropy, 5);
            assert!(outcome.consumed <= 997);
            assert_eq!(outcome.consumed + outcome.leftover, 997);
        }
    }

    #[test]
    fn unknown_tier_has_zero_multiplier() {
        let entries = vec![(player(1), 9)];
        let entropy = Entropy::new([4; 32]);
        let outcome = resolve(100, &entries, &tiers(), &entropy, 2);
        assert_eq!(outcome, JackpotOutcome::untouched(100));
    }
}
