//! Persisted engine state records and their canonical binary encodings.

use crate::primitives::{PlayerId, RoundPhase, TraitId};
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};

fn write_opt_trait(value: &Option<TraitId>, writer: &mut impl BufMut) {
    match value {
        Some(id) => {
            true.write(writer);
            id.write(writer);
        }
        None => false.write(writer),
    }
}

fn read_opt_trait(reader: &mut impl Buf) -> Result<Option<TraitId>, Error> {
    Ok(if bool::read(reader)? {
        Some(TraitId::read(reader)?)
    } else {
        None
    })
}

fn write_opt_player(value: &Option<PlayerId>, writer: &mut impl BufMut) {
    match value {
        Some(player) => {
            true.write(writer);
            player.write(writer);
        }
        None => false.write(writer),
    }
}

fn read_opt_player(reader: &mut impl Buf) -> Result<Option<PlayerId>, Error> {
    Ok(if bool::read(reader)? {
        Some(PlayerId::read(reader)?)
    } else {
        None
    })
}

/// The current round ("level"). Exactly one exists at a time; prior rounds
/// survive only through snapshots (`last_pool`, exterminator-of-record).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Round {
    /// Monotonic round index, starting at 1.
    pub index: u32,
    /// Deterministic timestamp at which this round opened.
    pub started_at_ms: u64,
    /// Current lifecycle phase.
    pub phase: RoundPhase,
    /// Price of one minted entry for this round.
    pub price_unit: u64,
    /// Prize pool being distributed this round.
    pub current_pool: u64,
    /// Pool accruing for the next round.
    pub next_pool: u64,
    /// Snapshot of the previous round's pool at finalization.
    pub last_pool: u64,
    /// Jackpots resolved so far this round; capped, monotonic.
    pub jackpots_run: u8,
    /// Index into the escalating daily schedule.
    pub daily_index: u8,
    /// Entries minted this round.
    pub minted: u32,
    /// Day index (now_ms / day_ms) of the last daily jackpot, if any.
    pub last_jackpot_day: Option<u64>,
    /// Hottest trait of the most recent daily jackpot.
    pub last_winning_trait: Option<TraitId>,
    /// Player whose burn depleted a trait to zero this round, if any.
    pub exterminator: Option<PlayerId>,
    /// Trait that was exterminated this round, if any.
    pub exterminated_trait: Option<TraitId>,
}

impl Round {
    /// Open the first round.
    pub fn genesis(price_unit: u64, started_at_ms: u64) -> Self {
        Self {
            index: 1,
            started_at_ms,
            phase: RoundPhase::Setup,
            price_unit,
            current_pool: 0,
            next_pool: 0,
            last_pool: 0,
            jackpots_run: 0,
            daily_index: 0,
            minted: 0,
            last_jackpot_day: None,
            last_winning_trait: None,
            exterminator: None,
            exterminated_trait: None,
        }
    }
}

/// Per-trait supply within the current round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TraitSupply {
    /// Current remaining supply. Never exceeds `start_remaining`.
    pub remaining: u32,
    /// Supply snapshot taken at round open.
    pub start_remaining: u32,
}

impl TraitSupply {
    pub fn fresh(start: u32) -> Self {
        Self {
            remaining: start,
            start_remaining: start,
        }
    }

    /// Whether the supply invariant holds.
    pub fn consistent(&self) -> bool {
        self.remaining <= self.start_remaining
    }
}

impl Write for TraitSupply {
    fn write(&self, writer: &mut impl BufMut) {
        self.remaining.write(writer);
        self.start_remaining.write(writer);
    }
}

impl Read for TraitSupply {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            remaining: u32::read(reader)?,
            start_remaining: u32::read(reader)?,
        })
    }
}

impl FixedSize for TraitSupply {
    const SIZE: usize = u32::SIZE * 2;
}

/// Burn-count statistics for one day, feeding winning-trait selection.
///
/// Burns are tallied three ways: by symbol, by color, and by full combo.
/// The daily jackpot picks its four buckets from the hottest entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BurnStats {
    pub symbol: [u32; 8],
    pub color: [u32; 8],
    pub combo: [u32; 64],
}

impl Default for BurnStats {
    fn default() -> Self {
        Self {
            symbol: [0; 8],
            color: [0; 8],
            combo: [0; 64],
        }
    }
}

impl BurnStats {
    /// Tally one burned entry.
    pub fn record(&mut self, trait_id: TraitId) {
        self.symbol[trait_id.symbol() as usize] += 1;
        self.color[trait_id.color() as usize] += 1;
        self.combo[trait_id.combo() as usize] += 1;
    }

    /// Index of the maximum count, ties broken toward the lower index.
    pub fn hottest(counts: &[u32]) -> u8 {
        let mut best = 0usize;
        for (i, &count) in counts.iter().enumerate().skip(1) {
            if count > counts[best] {
                best = i;
            }
        }
        best as u8
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A queued non-monetary mint reward (map jackpot prize), drained in bounded
/// batches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingReward {
    pub player: PlayerId,
    pub trait_id: TraitId,
    pub round: u32,
}

impl Write for PendingReward {
    fn write(&self, writer: &mut impl BufMut) {
        self.player.write(writer);
        self.trait_id.write(writer);
        self.round.write(writer);
    }
}

impl Read for PendingReward {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            player: PlayerId::read(reader)?,
            trait_id: TraitId::read(reader)?,
            round: u32::read(reader)?,
        })
    }
}

impl FixedSize for PendingReward {
    const SIZE: usize = PlayerId::SIZE + TraitId::SIZE + u32::SIZE;
}

/// A queued prize-pool credit awaiting the resumable payout drain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingPayout {
    pub player: PlayerId,
    pub amount: u64,
}

impl Write for PendingPayout {
    fn write(&self, writer: &mut impl BufMut) {
        self.player.write(writer);
        self.amount.write(writer);
    }
}

impl Read for PendingPayout {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            player: PlayerId::read(reader)?,
            amount: u64::read(reader)?,
        })
    }
}

impl FixedSize for PendingPayout {
    const SIZE: usize = PlayerId::SIZE + u64::SIZE;
}

impl Write for Round {
    fn write(&self, writer: &mut impl BufMut) {
        self.index.write(writer);
        self.started_at_ms.write(writer);
        self.phase.write(writer);
        self.price_unit.write(writer);
        self.current_pool.write(writer);
        self.next_pool.write(writer);
        self.last_pool.write(writer);
        self.jackpots_run.write(writer);
        self.daily_index.write(writer);
        self.minted.write(writer);
        match self.last_jackpot_day {
            Some(day) => {
                true.write(writer);
                day.write(writer);
            }
            None => false.write(writer),
        }
        write_opt_trait(&self.last_winning_trait, writer);
        write_opt_player(&self.exterminator, writer);
        write_opt_trait(&self.exterminated_trait, writer);
    }
}

impl Read for Round {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            index: u32::read(reader)?,
            started_at_ms: u64::read(reader)?,
            phase: RoundPhase::read(reader)?,
            price_unit: u64::read(reader)?,
            current_pool: u64::read(reader)?,
            next_pool: u64::read(reader)?,
            last_pool: u64::read(reader)?,
            jackpots_run: u8::read(reader)?,
            daily_index: u8::read(reader)?,
            minted: u32::read(reader)?,
            last_jackpot_day: if bool::read(reader)? {
                Some(u64::read(reader)?)
            } else {
                None
            },
            last_winning_trait: read_opt_trait(reader)?,
            exterminator: read_opt_player(reader)?,
            exterminated_trait: read_opt_trait(reader)?,
        })
    }
}

impl EncodeSize for Round {
    fn encode_size(&self) -> usize {
        u32::SIZE
            + u64::SIZE
            + RoundPhase::SIZE
            + u64::SIZE * 4
            + u8::SIZE * 2
            + u32::SIZE
            + bool::SIZE
            + self.last_jackpot_day.map_or(0, |_| u64::SIZE)
            + bool::SIZE
            + self.last_winning_trait.map_or(0, |_| TraitId::SIZE)
            + bool::SIZE
            + self.exterminator.as_ref().map_or(0, |_| PlayerId::SIZE)
            + bool::SIZE
            + self.exterminated_trait.map_or(0, |_| TraitId::SIZE)
    }
}
