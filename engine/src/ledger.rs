//! Claimable winnings ledger.
//!
//! Jackpot credits land here rather than moving tokens immediately; players
//! withdraw on their own schedule. The ledger maintains a running total so
//! the solvency check (sum of balances == total) is O(1) per mutation and
//! auditable in O(n).

use crate::error::EngineError;
use pyre_types::PlayerId;
use std::collections::BTreeMap;
use tracing::trace;

#[derive(Clone, Debug, Default)]
pub struct ClaimableLedger {
    balances: BTreeMap<PlayerId, u64>,
    total: u64,
}

impl ClaimableLedger {
    /// Credit winnings to a player.
    pub fn credit(&mut self, player: &PlayerId, amount: u64) -> Result<(), EngineError> {
        if amount == 0 {
            return Ok(());
        }
        let balance = self.balances.entry(player.clone()).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(EngineError::InvariantViolation("claimable balance overflow"))?;
        self.total = self
            .total
            .checked_add(amount)
            .ok_or(EngineError::InvariantViolation("claimable total overflow"))?;
        trace!(?player, amount, balance = *balance, "credited claimable");
        Ok(())
    }

    /// Debit a withdrawal. Rejected outright if the balance is short; no
    /// partial debits.
    pub fn debit(&mut self, player: &PlayerId, amount: u64) -> Result<(), EngineError> {
        let have = self.balance(player);
        if have < amount {
            return Err(EngineError::InsufficientClaimable { have, need: amount });
        }
        if amount == 0 {
            return Ok(());
        }
        let remaining = have - amount;
        if remaining == 0 {
            self.balances.remove(player);
        } else {
            self.balances.insert(player.clone(), remaining);
        }
        self.total -= amount;
        trace!(?player, amount, balance = remaining, "debited claimable");
        Ok(())
    }

    pub fn balance(&self, player: &PlayerId) -> u64 {
        self.balances.get(player).copied().unwrap_or(0)
    }

    /// Outstanding liability across all players.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Full audit: recompute the sum and compare to the running total.
    pub fn check_invariant(&self) -> Result<(), EngineError> {
        let sum: u64 = self.balances.values().sum();
        if sum != self.total {
            return Err(EngineError::InvariantViolation(
                "claimable total diverged from balance sum",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::player;

    #[test]
    fn credit_and_debit_track_total() {
        let mut ledger = ClaimableLedger::default();
        let a = player(1);
        let b = player(2);

        ledger.credit(&a, 100).expect("credit");
        ledger.credit(&b, 50).expect("credit");
        ledger.credit(&a, 25).expect("credit");
        assert_eq!(ledger.balance(&a), 125);
        assert_eq!(ledger.balance(&b), 50);
        assert_eq!(ledger.total(), 175);
        ledger.check_invariant().expect("invariant");

        ledger.debit(&a, 125).expect("debit");
        assert_eq!(ledger.balance(&a), 0);
        assert_eq!(ledger.total(), 50);
        ledger.check_invariant().expect("invariant");
    }

    #[test]
    fn overdraft_rejected_without_side_effects() {
        let mut ledger = ClaimableLedger::default();
        let a = player(1);
        ledger.credit(&a, 10).expect("credit");

        assert_eq!(
            ledger.debit(&a, 11),
            Err(EngineError::InsufficientClaimable { have: 10, need: 11 })
        );
        assert_eq!(ledger.balance(&a), 10);
        assert_eq!(ledger.total(), 10);
        ledger.check_invariant().expect("invariant");
    }

    #[test]
    fn debit_from_unknown_player_rejected() {
        let mut ledger = ClaimableLedger::default();
        assert_eq!(
            ledger.debit(&player(9), 1),
            Err(EngineError::InsufficientClaimable { have: 0, need: 1 })
        );
    }

    #[test]
    fn zero_amounts_are_noops() {
        let mut ledger = ClaimableLedger::default();
        let a = player(1);
        ledger.credit(&a, 0).expect("credit zero");
        ledger.debit(&a, 0).expect("debit zero");
        assert_eq!(ledger.total(), 0);
        assert_eq!(ledger.balance(&a), 0);
    }

    #[test]
    fn credit_overflow_is_fatal() {
        let mut ledger = ClaimableLedger::default();
        let a = player(1);
        ledger.credit(&a, u64::MAX).expect("credit");
        assert!(matches!(
            ledger.credit(&a, 1),
            Err(EngineError::InvariantViolation(_))
        ));
    }
}
