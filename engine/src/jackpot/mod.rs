//! Jackpot resolver family.
//!
//! Every resolver is a pure function of the pool amount it is handed, the
//! state it reads, and one entropy value. It returns an explicit
//! [`JackpotOutcome`]; the state machine applies the credits. Resolvers never
//! sample an empty pool and never touch more than the amount given: whatever
//! is not consumed comes back as `leftover`.

pub mod daily;
pub mod decimator;
pub mod extermination;
pub mod map;

use crate::rng::Entropy;
use crate::tickets::TicketPool;
use pyre_types::{PlayerId, TraitId, BPS};

/// `amount * bps / 10_000` without intermediate overflow.
pub fn bps_share(amount: u64, bps: u16) -> u64 {
    (u128::from(amount) * u128::from(bps) / u128::from(BPS)) as u64
}

/// The result of resolving one jackpot against a pool amount.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JackpotOutcome {
    /// Credits to apply, in resolution order.
    pub winners: Vec<(PlayerId, u64)>,
    /// Sum of winner credits.
    pub consumed: u64,
    /// Unconsumed remainder of the pool amount (empty draws, rounding).
    pub leftover: u64,
}

impl JackpotOutcome {
    /// An outcome that consumed nothing.
    pub fn untouched(pool: u64) -> Self {
        Self {
            winners: Vec::new(),
            consumed: 0,
            leftover: pool,
        }
    }

    fn from_winners(pool: u64, winners: Vec<(PlayerId, u64)>) -> Self {
        let consumed: u64 = winners.iter().map(|(_, amount)| amount).sum();
        debug_assert!(consumed <= pool);
        Self {
            winners,
            consumed,
            leftover: pool - consumed,
        }
    }
}

/// Split `pool` into `draws` equal prizes and raffle each one over a trait's
/// tickets under an independent sub-entropy. Prizes with no ticket to land on
/// and the division remainder are leftover.
pub fn draw_share(
    pool: u64,
    trait_id: TraitId,
    tickets: &TicketPool,
    entropy: &Entropy,
    salt: u64,
    draws: u8,
) -> JackpotOutcome {
    if pool == 0 || draws == 0 {
        return JackpotOutcome::untouched(pool);
    }
    let per_draw = pool / u64::from(draws);
    let mut winners = Vec::new();
    for i in 0..draws {
        let sub = entropy.derive(salt, u64::from(i));
        if let Some(winner) = tickets.sample_one(trait_id, &sub) {
            winners.push((winner.clone(), per_draw));
        }
    }
    JackpotOutcome::from_winners(pool, winners)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::player;

    #[test]
    fn draw_share_splits_evenly_with_rounding_leftover() {
        let mut tickets = TicketPool::default();
        tickets.add(TraitId(3), player(1));
        let entropy = Entropy::new([7; 32]);

        let outcome = draw_share(10, TraitId(3), &tickets, &entropy, 0, 4);
        // Sole ticket holder wins every draw of 2; the remainder 2 is left.
        assert_eq!(outcome.winners.len(), 4);
        assert_eq!(outcome.consumed, 8);
        assert_eq!(outcome.leftover, 2);
        assert_eq!(outcome.consumed + outcome.leftover, 10);
    }

    #[test]
    fn draw_share_on_empty_trait_consumes_nothing() {
        let tickets = TicketPool::default();
        let entropy = Entropy::new([7; 32]);
        let outcome = draw_share(100, TraitId(0), &tickets, &entropy, 0, 4);
        assert_eq!(outcome, JackpotOutcome::untouched(100));
    }

    #[test]
    fn zero_pool_and_zero_draws_are_noops() {
        let mut tickets = TicketPool::default();
        tickets.add(TraitId(0), player(1));
        let entropy = Entropy::new([1; 32]);
        assert_eq!(
            draw_share(0, TraitId(0), &tickets, &entropy, 0, 4).consumed,
            0
        );
        let outcome = draw_share(50, TraitId(0), &tickets, &entropy, 0, 0);
        assert_eq!(outcome.leftover, 50);
    }
}
