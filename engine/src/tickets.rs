//! Ticket pools: per-trait lottery entries for the current round.
//!
//! Each burn appends the burner to the exterminated trait's entry list, so
//! repeat activity buys more tickets and a player holding `k` of `n` tickets
//! wins a draw with probability `k/n`. Lists grow only while the round is
//! open, are sampled during resolution, and are cleared once fully paid.

use crate::rng::Entropy;
use pyre_types::{PlayerId, TraitId};
use std::collections::BTreeMap;

/// Per-trait ticket lists for one round.
#[derive(Clone, Debug, Default)]
pub struct TicketPool {
    entries: BTreeMap<TraitId, Vec<PlayerId>>,
}

impl TicketPool {
    /// Append one ticket.
    pub fn add(&mut self, trait_id: TraitId, player: PlayerId) {
        self.entries.entry(trait_id).or_default().push(player);
    }

    /// Number of tickets for a trait.
    pub fn len(&self, trait_id: TraitId) -> usize {
        self.entries.get(&trait_id).map_or(0, Vec::len)
    }

    /// Total tickets across all traits.
    pub fn total(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }

    /// Uniform draw over a trait's tickets. `None` when the pool is empty;
    /// callers apply their fallback policy (skip, or carry the amount).
    pub fn sample_one(&self, trait_id: TraitId, entropy: &Entropy) -> Option<&PlayerId> {
        let tickets = self.entries.get(&trait_id)?;
        if tickets.is_empty() {
            return None;
        }
        Some(&tickets[entropy.index_below(tickets.len())])
    }

    /// `k` draws with replacement, each under an independent sub-entropy, so
    /// one identity can win several sub-prizes.
    pub fn sample_many(
        &self,
        trait_id: TraitId,
        entropy: &Entropy,
        salt: u64,
        k: usize,
    ) -> Vec<&PlayerId> {
        let mut winners = Vec::with_capacity(k);
        for i in 0..k {
            let sub = entropy.derive(salt, i as u64);
            if let Some(winner) = self.sample_one(trait_id, &sub) {
                winners.push(winner);
            }
        }
        winners
    }

    /// Drop a trait's tickets once the round that produced them is fully
    /// paid.
    pub fn clear(&mut self, trait_id: TraitId) {
        self.entries.remove(&trait_id);
    }

    /// Drop everything (round finalization).
    pub fn clear_all(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::player;
    use crate::rng::Entropy;

    fn entropy(fill: u8) -> Entropy {
        Entropy::new([fill; 32])
    }

    #[test]
    fn empty_pool_yields_no_sample() {
        let pool = TicketPool::default();
        assert_eq!(pool.len(TraitId(0)), 0);
        assert!(pool.sample_one(TraitId(0), &entropy(1)).is_none());
        assert!(pool.sample_many(TraitId(0), &entropy(1), 0, 4).is_empty());
    }

    #[test]
    fn sample_lands_on_a_ticket_holder() {
        let mut pool = TicketPool::default();
        let a = player(1);
        let b = player(2);
        pool.add(TraitId(7), a.clone());
        pool.add(TraitId(7), b.clone());
        for fill in 0..32u8 {
            let winner = pool.sample_one(TraitId(7), &entropy(fill)).expect("sample");
            assert!(winner == &a || winner == &b);
        }
    }

    #[test]
    fn sample_many_allows_repeat_winners() {
        let mut pool = TicketPool::default();
        let only = player(3);
        pool.add(TraitId(1), only.clone());
        let winners = pool.sample_many(TraitId(1), &entropy(4), 9, 5);
        assert_eq!(winners.len(), 5);
        assert!(winners.iter().all(|w| *w == &only));
    }

    #[test]
    fn sample_many_is_deterministic() {
        let mut pool = TicketPool::default();
        for seed in 0..10 {
            pool.add(TraitId(2), player(seed));
        }
        let first: Vec<_> = pool
            .sample_many(TraitId(2), &entropy(8), 3, 4)
            .into_iter()
            .cloned()
            .collect();
        let second: Vec<_> = pool
            .sample_many(TraitId(2), &entropy(8), 3, 4)
            .into_iter()
            .cloned()
            .collect();
        assert_eq!(first, second);

        let other_salt: Vec<_> = pool
            .sample_many(TraitId(2), &entropy(8), 4, 4)
            .into_iter()
            .cloned()
            .collect();
        assert_ne!(first, other_salt);
    }

    #[test]
    fn ticket_weight_drives_win_frequency() {
        // One identity holds 3 of 4 tickets; expect ~75% of draws.
        let mut pool = TicketPool::default();
        let heavy = player(1);
        let light = player(2);
        pool.add(TraitId(5), heavy.clone());
        pool.add(TraitId(5), heavy.clone());
        pool.add(TraitId(5), heavy.clone());
        pool.add(TraitId(5), light.clone());

        let base = entropy(11);
        let trials = 4_000u64;
        let mut heavy_wins = 0u64;
        for i in 0..trials {
            let sub = base.derive(77, i);
            if pool.sample_one(TraitId(5), &sub) == Some(&heavy) {
                heavy_wins += 1;
            }
        }
        let frequency = heavy_wins as f64 / trials as f64;
        assert!(
            (frequency - 0.75).abs() < 0.03,
            "expected ~0.75, got {frequency}"
        );
    }

    #[test]
    fn clear_removes_only_the_target_trait() {
        let mut pool = TicketPool::default();
        pool.add(TraitId(1), player(1));
        pool.add(TraitId(2), player(2));
        pool.clear(TraitId(1));
        assert_eq!(pool.len(TraitId(1)), 0);
        assert_eq!(pool.len(TraitId(2)), 1);
        pool.clear_all();
        assert!(pool.is_empty());
    }
}
