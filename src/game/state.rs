//! Per-player mutable advantage records.
//!
//! One variant per advantage so that a field only exists while the matching
//! advantage is held. The variants are assembled from four small usage
//! machines: [`UseLatch`], [`BoundedCounter`], [`ToggleLatch`] and
//! [`Countdown`].

use serde::{Deserialize, Serialize};

use super::catalog::AdvantageId;
use super::identity::PieceUid;
use crate::error::MoveError;

/// Unused -> Used, terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseLatch {
    pub used: bool,
}

impl UseLatch {
    pub fn is_available(&self) -> bool {
        !self.used
    }

    pub fn consume(&mut self) -> Result<(), MoveError> {
        if self.used {
            return Err(MoveError::precondition("Advantage already used"));
        }
        self.used = true;
        Ok(())
    }
}

/// Usable while `used < limit`; only ever counts up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundedCounter {
    pub used: u8,
    pub limit: u8,
}

impl BoundedCounter {
    pub fn new(limit: u8) -> Self {
        BoundedCounter { used: 0, limit }
    }

    pub fn remaining(&self) -> u8 {
        self.limit.saturating_sub(self.used)
    }

    pub fn is_available(&self) -> bool {
        self.used < self.limit
    }

    pub fn record(&mut self) -> Result<(), MoveError> {
        if !self.is_available() {
            return Err(MoveError::precondition(format!(
                "Advantage limit of {} reached",
                self.limit
            )));
        }
        self.used += 1;
        Ok(())
    }
}

/// Inactive <-> Active until the effect fires, then Consumed for good.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleLatch {
    #[default]
    Inactive,
    Active,
    Consumed,
}

impl ToggleLatch {
    pub fn toggle(&mut self) -> Result<ToggleLatch, MoveError> {
        *self = match self {
            ToggleLatch::Inactive => ToggleLatch::Active,
            ToggleLatch::Active => ToggleLatch::Inactive,
            ToggleLatch::Consumed => {
                return Err(MoveError::precondition("Advantage already consumed"))
            }
        };
        Ok(*self)
    }

    pub fn is_active(&self) -> bool {
        *self == ToggleLatch::Active
    }

    pub fn consume(&mut self) {
        *self = ToggleLatch::Consumed;
    }
}

/// Turns remaining on a timed effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub remaining: u8,
}

impl Countdown {
    pub fn new(turns: u8) -> Self {
        Countdown { remaining: turns }
    }

    /// Count one elapsed turn; returns true once the effect has run out.
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }
}

/// An enemy piece held in place by `freeze`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrozenPiece {
    pub uid: PieceUid,
    pub turns: Countdown,
}

pub const FREEZE_TURNS: u8 = 2;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "advantage", rename_all = "snake_case")]
pub enum AdvantageState {
    PawnRush,
    PawnSidestep { uses: BoundedCounter },
    PawnRetreat { uses: BoundedCounter },
    SpearPawns { uses: BoundedCounter },
    CamelKnights { uses: BoundedCounter },
    PhasingBishops { uses: BoundedCounter },
    GhostRooks { uses: BoundedCounter },
    ChameleonBishop { latch: UseLatch },
    ShieldWall { deflections: u32 },
    /// UIDs of rooks that already vaulted.
    CornerVault { vaulted: Vec<PieceUid> },
    AmazonQueen { uses: BoundedCounter },
    BishopHop { uses: BoundedCounter },
    KingsDash { latch: UseLatch },
    ShadowStep { latch: UseLatch },
    Switcheroo { latch: UseLatch },
    TwinPawns { latch: UseLatch },
    FieldPromotion { latch: UseLatch },
    KnightWard { deflections: u32 },
    Vengeance { toggle: ToggleLatch },
    Freeze {
        latch: UseLatch,
        frozen: Option<FrozenPiece>,
    },
    DoubleStrike { latch: UseLatch },
    TimeRewind { latch: UseLatch },
    SecondWind { latch: UseLatch },
}

impl AdvantageState {
    /// Fresh record created when the advantage is assigned.
    pub fn initial(id: AdvantageId) -> Self {
        use AdvantageId as Id;
        match id {
            Id::PawnRush => AdvantageState::PawnRush,
            Id::PawnSidestep => AdvantageState::PawnSidestep { uses: BoundedCounter::new(3) },
            Id::PawnRetreat => AdvantageState::PawnRetreat { uses: BoundedCounter::new(2) },
            Id::SpearPawns => AdvantageState::SpearPawns { uses: BoundedCounter::new(2) },
            Id::CamelKnights => AdvantageState::CamelKnights { uses: BoundedCounter::new(3) },
            Id::PhasingBishops => AdvantageState::PhasingBishops { uses: BoundedCounter::new(3) },
            Id::GhostRooks => AdvantageState::GhostRooks { uses: BoundedCounter::new(3) },
            Id::ChameleonBishop => AdvantageState::ChameleonBishop { latch: UseLatch::default() },
            Id::ShieldWall => AdvantageState::ShieldWall { deflections: 0 },
            Id::CornerVault => AdvantageState::CornerVault { vaulted: Vec::new() },
            Id::AmazonQueen => AdvantageState::AmazonQueen { uses: BoundedCounter::new(2) },
            Id::BishopHop => AdvantageState::BishopHop { uses: BoundedCounter::new(2) },
            Id::KingsDash => AdvantageState::KingsDash { latch: UseLatch::default() },
            Id::ShadowStep => AdvantageState::ShadowStep { latch: UseLatch::default() },
            Id::Switcheroo => AdvantageState::Switcheroo { latch: UseLatch::default() },
            Id::TwinPawns => AdvantageState::TwinPawns { latch: UseLatch::default() },
            Id::FieldPromotion => AdvantageState::FieldPromotion { latch: UseLatch::default() },
            Id::KnightWard => AdvantageState::KnightWard { deflections: 0 },
            Id::Vengeance => AdvantageState::Vengeance { toggle: ToggleLatch::Inactive },
            Id::Freeze => AdvantageState::Freeze {
                latch: UseLatch::default(),
                frozen: None,
            },
            Id::DoubleStrike => AdvantageState::DoubleStrike { latch: UseLatch::default() },
            Id::TimeRewind => AdvantageState::TimeRewind { latch: UseLatch::default() },
            Id::SecondWind => AdvantageState::SecondWind { latch: UseLatch::default() },
        }
    }

    pub fn id(&self) -> AdvantageId {
        use AdvantageId as Id;
        match self {
            AdvantageState::PawnRush => Id::PawnRush,
            AdvantageState::PawnSidestep { .. } => Id::PawnSidestep,
            AdvantageState::PawnRetreat { .. } => Id::PawnRetreat,
            AdvantageState::SpearPawns { .. } => Id::SpearPawns,
            AdvantageState::CamelKnights { .. } => Id::CamelKnights,
            AdvantageState::PhasingBishops { .. } => Id::PhasingBishops,
            AdvantageState::GhostRooks { .. } => Id::GhostRooks,
            AdvantageState::ChameleonBishop { .. } => Id::ChameleonBishop,
            AdvantageState::ShieldWall { .. } => Id::ShieldWall,
            AdvantageState::CornerVault { .. } => Id::CornerVault,
            AdvantageState::AmazonQueen { .. } => Id::AmazonQueen,
            AdvantageState::BishopHop { .. } => Id::BishopHop,
            AdvantageState::KingsDash { .. } => Id::KingsDash,
            AdvantageState::ShadowStep { .. } => Id::ShadowStep,
            AdvantageState::Switcheroo { .. } => Id::Switcheroo,
            AdvantageState::TwinPawns { .. } => Id::TwinPawns,
            AdvantageState::FieldPromotion { .. } => Id::FieldPromotion,
            AdvantageState::KnightWard { .. } => Id::KnightWard,
            AdvantageState::Vengeance { .. } => Id::Vengeance,
            AdvantageState::Freeze { .. } => Id::Freeze,
            AdvantageState::DoubleStrike { .. } => Id::DoubleStrike,
            AdvantageState::TimeRewind { .. } => Id::TimeRewind,
            AdvantageState::SecondWind { .. } => Id::SecondWind,
        }
    }

    fn counter(&self) -> Option<&BoundedCounter> {
        match self {
            AdvantageState::PawnSidestep { uses }
            | AdvantageState::PawnRetreat { uses }
            | AdvantageState::SpearPawns { uses }
            | AdvantageState::CamelKnights { uses }
            | AdvantageState::PhasingBishops { uses }
            | AdvantageState::GhostRooks { uses }
            | AdvantageState::AmazonQueen { uses }
            | AdvantageState::BishopHop { uses } => Some(uses),
            _ => None,
        }
    }

    fn counter_mut(&mut self) -> Option<&mut BoundedCounter> {
        match self {
            AdvantageState::PawnSidestep { uses }
            | AdvantageState::PawnRetreat { uses }
            | AdvantageState::SpearPawns { uses }
            | AdvantageState::CamelKnights { uses }
            | AdvantageState::PhasingBishops { uses }
            | AdvantageState::GhostRooks { uses }
            | AdvantageState::AmazonQueen { uses }
            | AdvantageState::BishopHop { uses } => Some(uses),
            _ => None,
        }
    }

    fn latch(&self) -> Option<&UseLatch> {
        match self {
            AdvantageState::ChameleonBishop { latch }
            | AdvantageState::KingsDash { latch }
            | AdvantageState::ShadowStep { latch }
            | AdvantageState::Switcheroo { latch }
            | AdvantageState::TwinPawns { latch }
            | AdvantageState::FieldPromotion { latch }
            | AdvantageState::Freeze { latch, .. }
            | AdvantageState::DoubleStrike { latch }
            | AdvantageState::TimeRewind { latch }
            | AdvantageState::SecondWind { latch } => Some(latch),
            _ => None,
        }
    }

    fn latch_mut(&mut self) -> Option<&mut UseLatch> {
        match self {
            AdvantageState::ChameleonBishop { latch }
            | AdvantageState::KingsDash { latch }
            | AdvantageState::ShadowStep { latch }
            | AdvantageState::Switcheroo { latch }
            | AdvantageState::TwinPawns { latch }
            | AdvantageState::FieldPromotion { latch }
            | AdvantageState::Freeze { latch, .. }
            | AdvantageState::DoubleStrike { latch }
            | AdvantageState::TimeRewind { latch }
            | AdvantageState::SecondWind { latch } => Some(latch),
            _ => None,
        }
    }

    /// Fail with a precondition error when the usage machine is exhausted.
    pub fn ensure_available(&self) -> Result<(), MoveError> {
        if let Some(counter) = self.counter() {
            if !counter.is_available() {
                return Err(MoveError::precondition(format!(
                    "{} has no uses left",
                    self.id().definition().name
                )));
            }
        }
        if let Some(latch) = self.latch() {
            if !latch.is_available() {
                return Err(MoveError::precondition(format!(
                    "{} was already used",
                    self.id().definition().name
                )));
            }
        }
        Ok(())
    }

    /// Advance the usage machine by one successful application.
    pub fn record_use(&mut self) -> Result<(), MoveError> {
        if let Some(counter) = self.counter_mut() {
            return counter.record();
        }
        if let Some(latch) = self.latch_mut() {
            return latch.consume();
        }
        Ok(())
    }

    /// Remaining uses for counters, 0/1 for latches, `None` when unlimited.
    pub fn remaining_uses(&self) -> Option<u8> {
        if let Some(counter) = self.counter() {
            return Some(counter.remaining());
        }
        self.latch().map(|latch| u8::from(latch.is_available()))
    }

    /// Count a deflection on passive veto advantages.
    pub fn record_deflection(&mut self) {
        if let AdvantageState::ShieldWall { deflections } | AdvantageState::KnightWard { deflections } =
            self
        {
            *deflections += 1;
        }
    }
}
