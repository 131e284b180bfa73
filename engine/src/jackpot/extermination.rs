//! Milestone jackpot fired when a trait's supply is depleted.
//!
//! The player whose burn hit zero is the sole winner of the exterminator
//! share of the pool. The share handed in here is theirs entirely; the rest
//! of the pool is distributed to the exterminated trait's ticket holders via
//! [`resolve_holders`]. A round that ended without an exterminator (jackpot
//! cap reached first) pays nobody and the amount carries.

use super::{draw_share, JackpotOutcome};
use crate::rng::Entropy;
use crate::tickets::TicketPool;
use pyre_types::{PlayerId, TraitId};

/// Salt for the holder bucket draws.
const HOLDER_SALT: u64 = 200;

/// Number of sampled holder draws.
const HOLDER_DRAWS: u8 = 4;

/// Pay the exterminator their full share.
pub fn resolve(share: u64, exterminator: Option<&PlayerId>) -> JackpotOutcome {
    match exterminator {
        Some(winner) if share > 0 => JackpotOutcome {
            winners: vec![(winner.clone(), share)],
            consumed: share,
            leftover: 0,
        },
        _ => JackpotOutcome::untouched(share),
    }
}

/// Raffle the holders' pool over the exterminated trait's tickets in four
/// sampled draws.
pub fn resolve_holders(
    pool: u64,
    exterminated: TraitId,
    tickets: &TicketPool,
    entropy: &Entropy,
) -> JackpotOutcome {
    draw_share(pool, exterminated, tickets, entropy, HOLDER_SALT, HOLDER_DRAWS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::player;

    #[test]
    fn exterminator_takes_the_full_share() {
        let winner = player(5);
        let outcome = resolve(10, Some(&winner));
        assert_eq!(outcome.winners, vec![(winner, 10)]);
        assert_eq!(outcome.consumed, 10);
        assert_eq!(outcome.leftover, 0);
    }

    #[test]
    fn no_exterminator_means_nothing_consumed() {
        let outcome = resolve(10, None);
        assert_eq!(outcome, JackpotOutcome::untouched(10));
    }

    #[test]
    fn zero_share_pays_nobody() {
        let winner = player(5);
        let outcome = resolve(0, Some(&winner));
        assert!(outcome.winners.is_empty());
    }

    #[test]
    fn holders_of_the_dead_trait_split_the_rest() {
        let mut tickets = TicketPool::default();
        let holder = player(1);
        tickets.add(TraitId(7), holder.clone());
        let entropy = Entropy::new([9; 32]);

        let outcome = resolve_holders(100, TraitId(7), &tickets, &entropy);
        assert_eq!(outcome.winners.len(), 4);
        assert_eq!(outcome.consumed, 100);
        assert!(outcome.winners.iter().all(|(p, a)| p == &holder && *a == 25));
    }
}
