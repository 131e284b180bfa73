//! Core identifiers and enumerations.

use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::ed25519::PublicKey;
use serde::{Deserialize, Serialize};

/// Identity of a participant. Ed25519 public keys double as ledger keys and
/// ticket entries.
pub type PlayerId = PublicKey;

/// Size of the trait id-space. Trait ids are structured as four quadrants of
/// 64 combos each; a combo packs a color (3 bits) and a symbol (3 bits).
pub const TRAIT_COUNT: usize = 256;

/// A categorical attribute with a finite, depleting supply per round.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct TraitId(pub u8);

impl TraitId {
    /// Which of the four 64-wide quadrants this trait belongs to.
    pub fn quadrant(self) -> u8 {
        self.0 >> 6
    }

    /// The low six bits: color and symbol packed together.
    pub fn combo(self) -> u8 {
        self.0 & 0x3f
    }

    /// Color component (bits 3..6 of the combo).
    pub fn color(self) -> u8 {
        (self.0 >> 3) & 0x7
    }

    /// Symbol component (bits 0..3 of the combo).
    pub fn symbol(self) -> u8 {
        self.0 & 0x7
    }

    /// Build a trait id from quadrant and combo parts.
    pub fn from_parts(quadrant: u8, combo: u8) -> Self {
        Self(((quadrant & 0x3) << 6) | (combo & 0x3f))
    }
}

impl From<u8> for TraitId {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for TraitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Write for TraitId {
    fn write(&self, writer: &mut impl BufMut) {
        self.0.write(writer);
    }
}

impl Read for TraitId {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self(u8::read(reader)?))
    }
}

impl FixedSize for TraitId {
    const SIZE: usize = 1;
}

/// Lifecycle phase of the current round.
///
/// `Setup` admits entries, `Purchase` admits burns and runs the scheduled
/// jackpots, `Burn` drains the round's batch jobs before finalization.
/// `GameOver` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RoundPhase {
    Setup = 0,
    Purchase = 1,
    Burn = 2,
    GameOver = 3,
}

impl Default for RoundPhase {
    fn default() -> Self {
        Self::Setup
    }
}

impl Write for RoundPhase {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for RoundPhase {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        match value {
            0 => Ok(Self::Setup),
            1 => Ok(Self::Purchase),
            2 => Ok(Self::Burn),
            3 => Ok(Self::GameOver),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl FixedSize for RoundPhase {
    const SIZE: usize = 1;
}

impl std::fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Setup => "setup",
            Self::Purchase => "purchase",
            Self::Burn => "burn",
            Self::GameOver => "game-over",
        };
        f.write_str(name)
    }
}

/// The jackpot variant family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum JackpotKind {
    /// Scheduled once per day during the purchase phase.
    Daily = 0,
    /// Fires when a trait's supply is depleted to zero.
    Extermination = 1,
    /// Pays queued non-monetary mint rewards to map-ticket holders.
    Map = 2,
    /// Burn-volume-tiered jackpot on its own round cadence.
    Decimator = 3,
}

impl Write for JackpotKind {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for JackpotKind {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        match value {
            0 => Ok(Self::Daily),
            1 => Ok(Self::Extermination),
            2 => Ok(Self::Map),
            3 => Ok(Self::Decimator),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl FixedSize for JackpotKind {
    const SIZE: usize = 1;
}

impl std::fmt::Display for JackpotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Daily => "daily",
            Self::Extermination => "extermination",
            Self::Map => "map",
            Self::Decimator => "decimator",
        };
        f.write_str(name)
    }
}
