//! Deterministic identities and recording collaborators for tests and local
//! simulation.

use crate::hooks::{AffiliateProgram, HookError, RandomnessProvider, TokenLedger, TrophyRegistry};
use commonware_cryptography::{ed25519::PrivateKey, Signer};
use commonware_math::algebra::Random;
use pyre_types::{JackpotKind, PlayerId, TraitId, BPS};
use rand::{rngs::StdRng, SeedableRng};

/// Deterministic player identity for a seed.
pub fn player(seed: u64) -> PlayerId {
    let mut rng = StdRng::seed_from_u64(seed);
    PrivateKey::random(&mut rng).public_key()
}

/// Token custodian that records every movement. Set `fail_pay` to exercise
/// refused transfers.
#[derive(Clone, Debug, Default)]
pub struct MockTokens {
    pub collected: Vec<(PlayerId, u64)>,
    pub paid: Vec<(PlayerId, u64)>,
    pub minted: Vec<(PlayerId, TraitId)>,
    pub fail_pay: bool,
}

impl TokenLedger for MockTokens {
    fn collect(&mut self, player: &PlayerId, amount: u64) -> Result<(), HookError> {
        self.collected.push((player.clone(), amount));
        Ok(())
    }

    fn pay(&mut self, player: &PlayerId, amount: u64) -> Result<(), HookError> {
        if self.fail_pay {
            return Err(HookError("transfer refused".into()));
        }
        self.paid.push((player.clone(), amount));
        Ok(())
    }

    fn mint_entry(&mut self, player: &PlayerId, trait_id: TraitId) -> Result<(), HookError> {
        self.minted.push((player.clone(), trait_id));
        Ok(())
    }
}

/// Affiliate program where every buyer is referred at a fixed cut.
#[derive(Clone, Debug, Default)]
pub struct MockAffiliates {
    pub cut_bps: u16,
    pub paid: Vec<(PlayerId, u64)>,
}

impl AffiliateProgram for MockAffiliates {
    fn affiliate_cut(&self, _buyer: &PlayerId, amount: u64) -> u64 {
        amount * u64::from(self.cut_bps) / BPS
    }

    fn pay_affiliate(&mut self, buyer: &PlayerId, amount: u64) -> Result<(), HookError> {
        self.paid.push((buyer.clone(), amount));
        Ok(())
    }
}

/// Trophy registry that records awards. Set `fail` to prove awards are
/// best-effort.
#[derive(Clone, Debug, Default)]
pub struct MockTrophies {
    pub awards: Vec<(PlayerId, JackpotKind, u32)>,
    pub fail: bool,
}

impl TrophyRegistry for MockTrophies {
    fn award(&mut self, player: &PlayerId, kind: JackpotKind, round: u32) -> Result<(), HookError> {
        if self.fail {
            return Err(HookError("registry unavailable".into()));
        }
        self.awards.push((player.clone(), kind, round));
        Ok(())
    }
}

/// Oracle stub that records request ids for the driver to fulfill.
#[derive(Clone, Debug, Default)]
pub struct MockOracle {
    pub requests: Vec<u64>,
}

impl RandomnessProvider for MockOracle {
    fn request(&mut self, request_id: u64) -> Result<(), HookError> {
        self.requests.push(request_id);
        Ok(())
    }
}
