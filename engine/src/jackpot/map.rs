//! Map jackpot: non-monetary mint rewards raffled over the secondary map
//! ticket class.
//!
//! Winners are not paid currency. Each draw queues a pending mint of an
//! entropy-chosen trait, drained later by the bounded mint job, so resolving
//! this jackpot is O(draws) no matter how large the queue gets.

use crate::rng::Entropy;
use pyre_types::{PendingReward, PlayerId, TraitId};

/// Salt for winner selection; draw `i` uses index `i`.
const WINNER_SALT: u64 = 300;

/// Salt for the rewarded trait of each draw.
const REWARD_SALT: u64 = 301;

/// Raffle `draws` pending mints over the map tickets. An empty ticket class
/// yields no rewards.
pub fn resolve(
    round_index: u32,
    map_tickets: &[PlayerId],
    entropy: &Entropy,
    draws: u8,
) -> Vec<PendingReward> {
    if map_tickets.is_empty() {
        return Vec::new();
    }
    let mut rewards = Vec::with_capacity(draws as usize);
    for i in 0..u64::from(draws) {
        let winner = &map_tickets[entropy.derive(WINNER_SALT, i).index_below(map_tickets.len())];
        let trait_id = TraitId((entropy.derive(REWARD_SALT, i).as_u64() & 0xFF) as u8);
        rewards.push(PendingReward {
            player: winner.clone(),
            trait_id,
            round: round_index,
        });
    }
    rewards
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::player;

    #[test]
    fn empty_ticket_class_yields_nothing() {
        let entropy = Entropy::new([1; 32]);
        assert!(resolve(3, &[], &entropy, 4).is_empty());
    }

    #[test]
    fn every_draw_queues_one_reward() {
        let tickets = vec![player(1), player(2), player(3)];
        let entropy = Entropy::new([2; 32]);
        let rewards = resolve(7, &tickets, &entropy, 4);
        assert_eq!(rewards.len(), 4);
        assert!(rewards.iter().all(|r| r.round == 7));
        assert!(rewards.iter().all(|r| tickets.contains(&r.player)));
    }

    #[test]
    fn resolution_is_deterministic() {
        let tickets = vec![player(1), player(2)];
        let entropy = Entropy::new([2; 32]);
        assert_eq!(
            resolve(1, &tickets, &entropy, 3),
            resolve(1, &tickets, &entropy, 3)
        );
        assert_ne!(
            resolve(1, &tickets, &entropy, 3),
            resolve(1, &tickets, &Entropy::new([3; 32]), 3)
        );
    }
}
