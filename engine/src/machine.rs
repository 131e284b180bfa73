//! The round state machine.
//!
//! A game is a sequence of rounds, each moving `Setup → Purchase → Burn` and
//! rolling into the next round's Setup (or the terminal `GameOver`). All
//! timing is driven by the `now_ms` the caller passes in; the engine never
//! reads a clock, so replaying the same inputs reproduces the same state on
//! any machine.
//!
//! ## Advancing
//!
//! Hosts call [`Engine::advance`] on a cadence. Each call performs at most
//! one unit of lifecycle progress, checked in a fixed priority order:
//!
//! 1. a stalled randomness request is surfaced before anything else;
//! 2. a due daily jackpot (requesting randomness if none is in flight);
//! 3. an exhausted jackpot schedule (or a drained pool) forces the Burn
//!    phase;
//! 4. queued batch work is drained up to `work_budget` items;
//! 5. a fully drained Burn phase finalizes the round.
//!
//! A call with nothing to do returns `progressed: false` and mutates nothing.

use crate::batch::{BatchQueue, SupplyRebuild};
use crate::error::EngineError;
use crate::hooks::{AffiliateProgram, TokenLedger, TrophyRegistry};
use crate::jackpot::{bps_share, daily, decimator, extermination, map, JackpotOutcome};
use crate::ledger::ClaimableLedger;
use crate::rng::{Entropy, RandomnessLifecycle, Word};
use crate::tickets::TicketPool;
use pyre_types::{
    BurnStats, GameConfig, JackpotKind, PendingPayout, PendingReward, PlayerId, Round, RoundPhase,
    TraitId, TraitSupply, TRAIT_COUNT,
};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// What one `advance` call accomplished.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing to do (or still waiting on the oracle).
    Idle,
    /// The pending randomness request exceeded the stall threshold; the host
    /// should recover it.
    RandomnessStalled,
    /// A randomness word was requested from the oracle.
    RandomnessRequested { request_id: u64 },
    /// Setup gates satisfied; purchase is open with this pool.
    PurchaseOpened { pool: u64 },
    /// A daily jackpot resolved.
    DailyResolved {
        slice: u64,
        consumed: u64,
        leftover: u64,
        winning_traits: [TraitId; 4],
    },
    /// The purchase phase has nothing left to give; the round moved to Burn.
    BurnEntered,
    /// End-of-round jackpots resolved.
    FinaleResolved { paid: u64, carried: u64 },
    /// Batch work was drained.
    Drained {
        payouts: usize,
        mints: usize,
        rebuilt: usize,
    },
    /// The round closed and the next one opened in Setup.
    RoundFinalized { next_round: u32 },
    /// The terminal round closed.
    GameOver,
}

/// Result of one `advance` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepResult {
    /// Whether any state changed.
    pub progressed: bool,
    /// Phase after the call.
    pub phase: RoundPhase,
    pub outcome: StepOutcome,
}

/// Current/next/last prize pool snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolTotals {
    pub current: u64,
    pub next: u64,
    pub last: u64,
}

/// The whole game state, advanced by `&mut self` methods.
#[derive(Clone, Debug)]
pub struct Engine {
    config: GameConfig,
    round: Round,
    rng: RandomnessLifecycle,
    supplies: Box<[TraitSupply; TRAIT_COUNT]>,
    burn_stats: BurnStats,
    tickets: TicketPool,
    map_tickets: Vec<PlayerId>,
    decimator_entries: Vec<decimator::Entry>,
    burned_by_player: BTreeMap<PlayerId, u64>,
    ledger: ClaimableLedger,
    payouts: BatchQueue<PendingPayout>,
    mints: BatchQueue<PendingReward>,
    rebuild: SupplyRebuild,
    finale_resolved: bool,
}

impl Engine {
    /// Open round 1 in Setup at `now_ms`.
    pub fn new(config: GameConfig, now_ms: u64) -> Result<Self, EngineError> {
        config.validate()?;
        let mut supplies = Box::new([TraitSupply::fresh(config.trait_start_supply); TRAIT_COUNT]);
        let mut rebuild = SupplyRebuild::default();
        rebuild.step(&mut supplies, config.trait_start_supply, TRAIT_COUNT)?;
        let round = Round::genesis(config.price_unit, now_ms);
        Ok(Self {
            config,
            round,
            rng: RandomnessLifecycle::default(),
            supplies,
            burn_stats: BurnStats::default(),
            tickets: TicketPool::default(),
            map_tickets: Vec::new(),
            decimator_entries: Vec::new(),
            burned_by_player: BTreeMap::new(),
            ledger: ClaimableLedger::default(),
            payouts: BatchQueue::default(),
            mints: BatchQueue::default(),
            rebuild,
            finale_resolved: false,
        })
    }

    // --- Purchase-side entry points ---

    /// Mint `count` entries for `player` during Setup. Payment is collected
    /// up front; the proceeds (minus any affiliate cut) accrue to the next
    /// pool and each entry grants one map ticket.
    pub fn mint_entries<T: TokenLedger, A: AffiliateProgram>(
        &mut self,
        player: &PlayerId,
        count: u32,
        tokens: &mut T,
        affiliates: &mut A,
    ) -> Result<(), EngineError> {
        self.check_phase(RoundPhase::Setup)?;
        if count == 0 {
            return Ok(());
        }
        let cost = self
            .round
            .price_unit
            .checked_mul(u64::from(count))
            .ok_or(EngineError::InvariantViolation("mint cost overflow"))?;
        let mut cut = affiliates.affiliate_cut(player, cost).min(cost);
        tokens.collect(player, cost)?;
        if cut > 0 {
            if let Err(err) = affiliates.pay_affiliate(player, cut) {
                // Keep the cut in the pool rather than stranding it.
                warn!(%err, "affiliate payout failed");
                cut = 0;
            }
        }
        self.round.next_pool += cost - cut;
        self.round.minted += count;
        for _ in 0..count {
            self.map_tickets.push(player.clone());
        }
        debug!(
            round = self.round.index,
            ?player,
            count,
            pool = self.round.next_pool,
            "minted entries"
        );
        Ok(())
    }

    /// Burn one entry of `trait_id` during Purchase. The burn buys a lottery
    /// ticket on that trait, enrolls the burner in the decimator at their
    /// current volume tier, and, if it depletes the trait, ends the round.
    pub fn burn_entry(&mut self, player: &PlayerId, trait_id: TraitId) -> Result<(), EngineError> {
        self.check_phase(RoundPhase::Purchase)?;
        let slot = &mut self.supplies[trait_id.0 as usize];
        if slot.remaining == 0 {
            return Err(EngineError::TraitDepleted(trait_id.0));
        }
        slot.remaining -= 1;
        let depleted = slot.remaining == 0;

        self.burn_stats.record(trait_id);
        self.tickets.add(trait_id, player.clone());
        let burned = self.burned_by_player.entry(player.clone()).or_insert(0);
        *burned += 1;
        let tier = self.config.schedule.tier_for(*burned);
        self.decimator_entries.push((player.clone(), tier));

        if depleted {
            info!(
                round = self.round.index,
                trait_id = trait_id.0,
                ?player,
                "trait exterminated, round moving to burn phase"
            );
            self.round.exterminator = Some(player.clone());
            self.round.exterminated_trait = Some(trait_id);
            self.enter_burn();
        }
        Ok(())
    }

    /// Withdraw claimable winnings to the token ledger. The debit is undone
    /// if the transfer is refused.
    pub fn claim<T: TokenLedger>(
        &mut self,
        player: &PlayerId,
        amount: u64,
        tokens: &mut T,
    ) -> Result<(), EngineError> {
        self.ledger.debit(player, amount)?;
        if let Err(err) = tokens.pay(player, amount) {
            self.ledger.credit(player, amount)?;
            return Err(err.into());
        }
        Ok(())
    }

    // --- Randomness round trip ---

    /// Ask for a randomness word out of band (the scheduler requests its own
    /// when a jackpot is due).
    pub fn request_random_word(&mut self, now_ms: u64) -> Result<u64, EngineError> {
        self.rng.request_next(now_ms)
    }

    /// Oracle fulfillment callback. Returns `false` for stale or mismatched
    /// ids.
    pub fn on_random_word(&mut self, request_id: u64, word: Word) -> bool {
        self.rng.on_fulfilled(request_id, word)
    }

    /// Abandon a stalled request and reissue under a fresh id.
    pub fn recover_stalled_randomness(&mut self, now_ms: u64) -> Result<u64, EngineError> {
        self.rng
            .recover_stalled(now_ms, self.config.stall_threshold_ms)
    }

    // --- The scheduler ---

    /// Perform at most one unit of lifecycle progress (see module docs for
    /// the priority order). `work_budget` caps batch items per call.
    pub fn advance<T: TokenLedger, A: AffiliateProgram, R: TrophyRegistry>(
        &mut self,
        now_ms: u64,
        work_budget: usize,
        tokens: &mut T,
        affiliates: &mut A,
        trophies: &mut R,
    ) -> Result<StepResult, EngineError> {
        if self.round.phase == RoundPhase::GameOver {
            return Ok(self.step(false, StepOutcome::GameOver));
        }
        if self.rng.is_stalled(now_ms, self.config.stall_threshold_ms) {
            return Ok(self.step(false, StepOutcome::RandomnessStalled));
        }
        match self.round.phase {
            RoundPhase::Setup => Ok(self.try_open_purchase(now_ms)),
            RoundPhase::Purchase => {
                if self.daily_due(now_ms) {
                    return self.step_daily(now_ms, trophies);
                }
                if self.purchase_spent() {
                    self.enter_burn();
                    return Ok(self.step(true, StepOutcome::BurnEntered));
                }
                self.drain(work_budget, tokens, affiliates)
            }
            RoundPhase::Burn => {
                if !self.finale_resolved {
                    return self.step_finale(now_ms, trophies);
                }
                let result = self.drain(work_budget, tokens, affiliates)?;
                if self.burn_work_done() {
                    return Ok(self.finalize(now_ms));
                }
                Ok(result)
            }
            RoundPhase::GameOver => Ok(self.step(false, StepOutcome::GameOver)),
        }
    }

    // --- Read-only queries ---

    pub fn phase(&self) -> RoundPhase {
        self.round.phase
    }

    pub fn round_index(&self) -> u32 {
        self.round.index
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn claimable(&self, player: &PlayerId) -> u64 {
        self.ledger.balance(player)
    }

    pub fn claimable_total(&self) -> u64 {
        self.ledger.total()
    }

    pub fn randomness_pending(&self) -> bool {
        self.rng.is_pending()
    }

    pub fn randomness_stalled(&self, now_ms: u64) -> bool {
        self.rng.is_stalled(now_ms, self.config.stall_threshold_ms)
    }

    pub fn jackpots_run(&self) -> u8 {
        self.round.jackpots_run
    }

    pub fn pool_totals(&self) -> PoolTotals {
        PoolTotals {
            current: self.round.current_pool,
            next: self.round.next_pool,
            last: self.round.last_pool,
        }
    }

    pub fn supply(&self, trait_id: TraitId) -> TraitSupply {
        self.supplies[trait_id.0 as usize]
    }

    /// Full solvency audit of the claimable ledger.
    pub fn check_invariants(&self) -> Result<(), EngineError> {
        self.ledger.check_invariant()?;
        if self.supplies.iter().any(|s| !s.consistent()) {
            return Err(EngineError::InvariantViolation(
                "trait supply exceeds its start snapshot",
            ));
        }
        Ok(())
    }

    // --- Internals ---

    fn step(&self, progressed: bool, outcome: StepOutcome) -> StepResult {
        StepResult {
            progressed,
            phase: self.round.phase,
            outcome,
        }
    }

    fn check_phase(&self, want: RoundPhase) -> Result<(), EngineError> {
        match self.round.phase {
            RoundPhase::GameOver => Err(EngineError::GameOver),
            phase if phase == want => Ok(()),
            phase => Err(EngineError::PhaseMismatch { phase }),
        }
    }

    fn day_index(&self, now_ms: u64) -> u64 {
        now_ms / self.config.day_ms
    }

    /// Whether the purchase phase has nothing left to give: the jackpot cap
    /// or schedule is exhausted, or the pool drained to the early-close
    /// target.
    fn purchase_spent(&self) -> bool {
        self.round.jackpots_run >= self.config.jackpot_cap
            || usize::from(self.round.daily_index) >= self.config.schedule.daily_bps.len()
            || self
                .config
                .early_close_pool_target
                .is_some_and(|target| self.round.current_pool <= target)
    }

    fn daily_due(&self, now_ms: u64) -> bool {
        !self.purchase_spent() && self.round.last_jackpot_day != Some(self.day_index(now_ms))
    }

    fn try_open_purchase(&mut self, now_ms: u64) -> StepResult {
        let elapsed = now_ms.saturating_sub(self.round.started_at_ms);
        let count_gate = self.round.minted >= self.config.mint_target;
        let time_gate = elapsed >= self.config.setup_window_ms && self.round.minted > 0;
        if !(count_gate || time_gate) {
            return self.step(false, StepOutcome::Idle);
        }
        self.round.current_pool = self.round.next_pool;
        self.round.next_pool = 0;
        self.round.phase = RoundPhase::Purchase;
        info!(
            round = self.round.index,
            pool = self.round.current_pool,
            minted = self.round.minted,
            "purchase phase open"
        );
        self.step(
            true,
            StepOutcome::PurchaseOpened {
                pool: self.round.current_pool,
            },
        )
    }

    /// Daily jackpot step: request randomness, wait, or resolve.
    fn step_daily<R: TrophyRegistry>(
        &mut self,
        now_ms: u64,
        trophies: &mut R,
    ) -> Result<StepResult, EngineError> {
        if self.rng.is_pending() {
            return Ok(self.step(false, StepOutcome::Idle));
        }
        if !self.rng.is_fulfilled() {
            let request_id = self.rng.request_next(now_ms)?;
            debug!(request_id, "requested randomness for daily jackpot");
            return Ok(self.step(true, StepOutcome::RandomnessRequested { request_id }));
        }

        let entropy = Entropy::new(self.rng.consume()?);
        let bps = self.config.schedule.daily_bps[usize::from(self.round.daily_index)];
        let slice = bps_share(self.round.current_pool, bps);
        let draw = daily::resolve(
            slice,
            &self.burn_stats,
            &self.tickets,
            &entropy,
            &self.config.schedule,
            self.config.winners_per_bucket,
        );
        self.round.current_pool -= draw.outcome.consumed;
        self.queue_outcome(&draw.outcome, JackpotKind::Daily, trophies);
        self.round.jackpots_run += 1;
        self.round.daily_index += 1;
        self.round.last_jackpot_day = Some(self.day_index(now_ms));
        self.round.last_winning_trait = Some(draw.winning_traits[0]);
        self.burn_stats.reset();
        info!(
            round = self.round.index,
            slice,
            consumed = draw.outcome.consumed,
            leftover = draw.outcome.leftover,
            jackpots_run = self.round.jackpots_run,
            "daily jackpot resolved"
        );
        Ok(self.step(
            true,
            StepOutcome::DailyResolved {
                slice,
                consumed: draw.outcome.consumed,
                leftover: draw.outcome.leftover,
                winning_traits: draw.winning_traits,
            },
        ))
    }

    /// End-of-round jackpots: decimator (on cadence), exterminator share,
    /// holder draws, map mints, carryover.
    fn step_finale<R: TrophyRegistry>(
        &mut self,
        now_ms: u64,
        trophies: &mut R,
    ) -> Result<StepResult, EngineError> {
        if self.rng.is_pending() {
            return Ok(self.step(false, StepOutcome::Idle));
        }
        if !self.rng.is_fulfilled() {
            let request_id = self.rng.request_next(now_ms)?;
            debug!(request_id, "requested randomness for round finale");
            return Ok(self.step(true, StepOutcome::RandomnessRequested { request_id }));
        }

        let entropy = Entropy::new(self.rng.consume()?);
        let pool = self.round.current_pool;
        let mut remaining = pool;
        let mut paid = 0u64;

        if self.config.schedule.decimator_runs(self.round.index) {
            let share = bps_share(pool, self.config.schedule.decimator_pool_bps).min(remaining);
            let outcome = decimator::resolve(
                share,
                &self.decimator_entries,
                &self.config.schedule.decimator_tiers,
                &entropy,
                self.config.winners_per_bucket,
            );
            remaining -= outcome.consumed;
            paid += outcome.consumed;
            self.queue_outcome(&outcome, JackpotKind::Decimator, trophies);
        }

        let carried;
        match (self.round.exterminator.clone(), self.round.exterminated_trait) {
            (Some(exterminator), Some(dead_trait)) => {
                let bps = self
                    .config
                    .schedule
                    .exterminator_bps_for_round(self.round.index);
                let share = bps_share(pool, bps).min(remaining);
                let outcome = extermination::resolve(share, Some(&exterminator));
                remaining -= outcome.consumed;
                paid += outcome.consumed;
                self.queue_outcome(&outcome, JackpotKind::Extermination, trophies);

                // The later the round ended, the more of the rest carries.
                let carry = self.scaled_carry(remaining);
                let holders = extermination::resolve_holders(
                    remaining - carry,
                    dead_trait,
                    &self.tickets,
                    &entropy,
                );
                remaining -= holders.consumed;
                paid += holders.consumed;
                self.queue_outcome(&holders, JackpotKind::Extermination, trophies);
                carried = remaining;
            }
            _ => {
                // No exterminator: the schedule ran out. A reduced prize
                // rolls forward; the rest leaves the economy.
                carried = self.scaled_carry(remaining);
            }
        }

        let rewards = map::resolve(
            self.round.index,
            &self.map_tickets,
            &entropy,
            self.config.schedule.map_draws,
        );
        for reward in rewards {
            self.award_trophy(&reward.player, JackpotKind::Map, trophies);
            self.mints.push(reward);
        }

        self.round.next_pool += carried;
        self.round.last_pool = pool;
        self.round.current_pool = 0;
        self.finale_resolved = true;
        info!(
            round = self.round.index,
            pool, paid, carried, "round finale resolved"
        );
        Ok(self.step(true, StepOutcome::FinaleResolved { paid, carried }))
    }

    fn scaled_carry(&self, remaining: u64) -> u64 {
        (u128::from(remaining) * u128::from(self.round.jackpots_run)
            / u128::from(self.config.jackpot_cap)) as u64
    }

    fn queue_outcome<R: TrophyRegistry>(
        &mut self,
        outcome: &JackpotOutcome,
        kind: JackpotKind,
        trophies: &mut R,
    ) {
        for (player, amount) in &outcome.winners {
            self.payouts.push(PendingPayout {
                player: player.clone(),
                amount: *amount,
            });
            self.award_trophy(player, kind, trophies);
        }
    }

    fn award_trophy<R: TrophyRegistry>(
        &self,
        player: &PlayerId,
        kind: JackpotKind,
        trophies: &mut R,
    ) {
        // Trophies are cosmetic; a registry failure never unwinds a payout.
        if let Err(err) = trophies.award(player, kind, self.round.index) {
            warn!(%err, %kind, "trophy award failed");
        }
    }

    fn enter_burn(&mut self) {
        self.round.phase = RoundPhase::Burn;
        self.finale_resolved = false;
        self.rebuild.restart();
    }

    fn burn_work_done(&self) -> bool {
        self.payouts.is_drained() && self.mints.is_drained() && self.rebuild.is_finished()
    }

    /// Drain queued work, at most `work_budget` items across the payout
    /// queue, the mint queue, and (during Burn) the supply rebuild. Winners
    /// with a referrer share their credit with the affiliate.
    fn drain<T: TokenLedger, A: AffiliateProgram>(
        &mut self,
        work_budget: usize,
        tokens: &mut T,
        affiliates: &mut A,
    ) -> Result<StepResult, EngineError> {
        let mut budget = work_budget;

        let batch = self.payouts.take_batch(budget)?;
        let paid = batch.len();
        for payout in batch {
            let mut cut = affiliates
                .affiliate_cut(&payout.player, payout.amount)
                .min(payout.amount);
            if cut > 0 {
                if let Err(err) = affiliates.pay_affiliate(&payout.player, cut) {
                    // The winner keeps the cut rather than stranding it.
                    warn!(%err, "affiliate payout failed");
                    cut = 0;
                }
            }
            self.ledger.credit(&payout.player, payout.amount - cut)?;
        }
        budget -= paid;

        let batch = self.mints.take_batch(budget)?;
        let minted = batch.len();
        for reward in batch {
            // Best effort, like trophies: a refused mint is not retried.
            if let Err(err) = tokens.mint_entry(&reward.player, reward.trait_id) {
                warn!(%err, round = reward.round, "reward mint failed");
            }
        }
        budget -= minted;

        let mut rebuilt = 0;
        if self.round.phase == RoundPhase::Burn && budget > 0 {
            let before = self.rebuild.position();
            self.rebuild
                .step(&mut self.supplies, self.config.trait_start_supply, budget)?;
            rebuilt = self.rebuild.position() - before;
        }

        let processed = paid + minted + rebuilt;
        if processed > 0 {
            debug!(paid, minted, rebuilt, "drained batch work");
        }
        Ok(self.step(
            processed > 0,
            if processed > 0 {
                StepOutcome::Drained {
                    payouts: paid,
                    mints: minted,
                    rebuilt,
                }
            } else {
                StepOutcome::Idle
            },
        ))
    }

    /// Close the round: clear per-round state and open the next Setup, or
    /// end the game at the terminal round.
    fn finalize(&mut self, now_ms: u64) -> StepResult {
        self.payouts.clear();
        self.mints.clear();
        self.tickets.clear_all();
        self.map_tickets.clear();
        self.decimator_entries.clear();
        self.burned_by_player.clear();
        self.burn_stats.reset();
        self.finale_resolved = false;

        if self.round.index >= self.config.max_level {
            self.round.phase = RoundPhase::GameOver;
            info!(round = self.round.index, "terminal round closed, game over");
            return self.step(true, StepOutcome::GameOver);
        }

        self.round.index += 1;
        self.round.started_at_ms = now_ms;
        self.round.phase = RoundPhase::Setup;
        self.round.jackpots_run = 0;
        self.round.daily_index = 0;
        self.round.minted = 0;
        self.round.last_jackpot_day = None;
        self.round.exterminator = None;
        self.round.exterminated_trait = None;
        info!(round = self.round.index, "next round open in setup");
        self.step(
            true,
            StepOutcome::RoundFinalized {
                next_round: self.round.index,
            },
        )
    }
}
