//! Local game loop: drives a pyre engine with simulated players and an
//! instantly-fulfilling randomness oracle, then prints a JSON summary.
//!
//! Useful for eyeballing the economy under different configurations:
//!
//! ```text
//! cargo run -p pyre-simulator -- --rounds 10 --players 32 --seed 7
//! RUST_LOG=pyre_engine=debug cargo run -p pyre-simulator
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use pyre_engine::mocks::{player, MockAffiliates, MockTokens, MockTrophies};
use pyre_engine::{Engine, EngineError, StepOutcome};
use pyre_types::{GameConfig, PlayerId, RoundPhase, TraitId};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pyre-simulator", about = "Run a simulated pyre game locally")]
struct Args {
    /// Rounds to play before stopping.
    #[arg(long, default_value_t = 5)]
    rounds: u32,

    /// Number of simulated players.
    #[arg(long, default_value_t = 16)]
    players: u64,

    /// Seed for simulated activity and oracle words.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Burn attempts per scheduler step during the purchase phase.
    #[arg(long, default_value_t = 40)]
    burns_per_step: u32,

    /// Batch work budget per `advance` call.
    #[arg(long, default_value_t = 64)]
    work_budget: usize,

    /// Optional JSON game configuration; defaults otherwise.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Abort if a single round takes more scheduler steps than this.
    #[arg(long, default_value_t = 10_000)]
    max_steps_per_round: u32,
}

struct Simulation {
    engine: Engine,
    config: GameConfig,
    tokens: MockTokens,
    affiliates: MockAffiliates,
    trophies: MockTrophies,
    rng: ChaCha8Rng,
    ids: Vec<PlayerId>,
    now_ms: u64,
    jackpots: u64,
    rounds_completed: u32,
    game_over: bool,
}

impl Simulation {
    fn new(args: &Args, config: GameConfig) -> Result<Self> {
        Ok(Self {
            engine: Engine::new(config.clone(), 0)?,
            config,
            tokens: MockTokens::default(),
            affiliates: MockAffiliates::default(),
            trophies: MockTrophies::default(),
            rng: ChaCha8Rng::seed_from_u64(args.seed),
            ids: (0..args.players).map(player).collect(),
            now_ms: 0,
            jackpots: 0,
            rounds_completed: 0,
            game_over: false,
        })
    }

    /// Play one round from Setup through finalization.
    fn play_round(&mut self, args: &Args) -> Result<()> {
        for id in self.ids.clone() {
            let count = self.rng.gen_range(1..4);
            self.engine
                .mint_entries(&id, count, &mut self.tokens, &mut self.affiliates)?;
        }
        // Satisfy the time gate; the mint-count gate may or may not be met.
        self.now_ms += self.config.setup_window_ms;

        for _ in 0..args.max_steps_per_round {
            if self.engine.phase() == RoundPhase::Purchase {
                self.burn_some(args.burns_per_step)?;
            }
            let result = self.engine.advance(
                self.now_ms,
                args.work_budget,
                &mut self.tokens,
                &mut self.affiliates,
                &mut self.trophies,
            )?;
            debug!(now_ms = self.now_ms, outcome = ?result.outcome, "step");
            match result.outcome {
                StepOutcome::RandomnessRequested { request_id } => {
                    let mut word = [0u8; 32];
                    self.rng.fill_bytes(&mut word);
                    self.engine.on_random_word(request_id, word);
                }
                StepOutcome::DailyResolved { slice, consumed, .. } => {
                    self.jackpots += 1;
                    info!(round = self.engine.round_index(), slice, consumed, "daily");
                    self.now_ms += self.config.day_ms;
                }
                StepOutcome::RoundFinalized { next_round } => {
                    self.rounds_completed += 1;
                    info!(next_round, "round finalized");
                    return Ok(());
                }
                StepOutcome::GameOver => {
                    self.rounds_completed += 1;
                    self.game_over = true;
                    info!("game over");
                    return Ok(());
                }
                _ if !result.progressed => {
                    // Nothing due yet; let a day pass.
                    self.now_ms += self.config.day_ms;
                }
                _ => {}
            }
        }
        bail!("round {} never finalized", self.engine.round_index());
    }

    fn burn_some(&mut self, attempts: u32) -> Result<()> {
        for _ in 0..attempts {
            let id = self.ids[self.rng.gen_range(0..self.ids.len())].clone();
            let trait_id = TraitId(self.rng.gen::<u8>());
            match self.engine.burn_entry(&id, trait_id) {
                Ok(()) => {}
                // An extermination mid-loop flips the phase to Burn.
                Err(EngineError::PhaseMismatch { .. }) => break,
                Err(EngineError::TraitDepleted(_)) => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    /// Withdraw every claimable balance through the token ledger.
    fn settle_claims(&mut self) -> Result<u64> {
        let mut settled = 0;
        for id in self.ids.clone() {
            let balance = self.engine.claimable(&id);
            if balance > 0 {
                self.engine.claim(&id, balance, &mut self.tokens)?;
                settled += balance;
            }
        }
        Ok(settled)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();
    let config: GameConfig = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&raw).context("parsing config")?
        }
        None => GameConfig::default(),
    };

    let mut sim = Simulation::new(&args, config)?;
    for _ in 0..args.rounds {
        sim.play_round(&args)?;
        if sim.game_over {
            break;
        }
    }
    let settled = sim.settle_claims()?;
    sim.engine.check_invariants()?;

    let collected: u64 = sim.tokens.collected.iter().map(|(_, amount)| amount).sum();
    let summary = json!({
        "rounds_completed": sim.rounds_completed,
        "game_over": sim.game_over,
        "final_round": sim.engine.round_index(),
        "daily_jackpots": sim.jackpots,
        "tokens_collected": collected,
        "winnings_settled": settled,
        "winnings_unclaimed": sim.engine.claimable_total(),
        "reward_mints": sim.tokens.minted.len(),
        "trophies_awarded": sim.trophies.awards.len(),
        "pools": {
            "current": sim.engine.pool_totals().current,
            "next": sim.engine.pool_totals().next,
            "last": sim.engine.pool_totals().last,
        },
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
