//! Static advantage table and weighted-random assignment.

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Every advantage a player can be dealt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvantageId {
    PawnRush,
    PawnSidestep,
    PawnRetreat,
    SpearPawns,
    CamelKnights,
    PhasingBishops,
    GhostRooks,
    ChameleonBishop,
    ShieldWall,
    CornerVault,
    AmazonQueen,
    BishopHop,
    KingsDash,
    ShadowStep,
    Switcheroo,
    TwinPawns,
    FieldPromotion,
    KnightWard,
    Vengeance,
    Freeze,
    DoubleStrike,
    TimeRewind,
    SecondWind,
}

impl AdvantageId {
    pub fn definition(self) -> &'static AdvantageDefinition {
        CATALOG
            .iter()
            .find(|def| def.id == self)
            .unwrap_or(&CATALOG[0])
    }

    /// Wire name, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        self.definition().key
    }

    pub fn from_key(key: &str) -> Option<AdvantageId> {
        CATALOG.iter().find(|def| def.key == key).map(|def| def.id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
    Legendary,
}

impl Rarity {
    pub const ALL: [Rarity; 3] = [Rarity::Common, Rarity::Rare, Rarity::Legendary];
}

/// Whether an advantage is exercised through a special move or only reacts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdvantageKind {
    Active,
    Passive,
}

#[derive(Debug)]
pub struct AdvantageDefinition {
    pub id: AdvantageId,
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub rarity: Rarity,
    pub kind: AdvantageKind,
}

macro_rules! advantage {
    ($id:ident, $key:literal, $name:literal, $rarity:ident, $kind:ident, $desc:literal) => {
        AdvantageDefinition {
            id: AdvantageId::$id,
            key: $key,
            name: $name,
            description: $desc,
            rarity: Rarity::$rarity,
            kind: AdvantageKind::$kind,
        }
    };
}

pub static CATALOG: &[AdvantageDefinition] = &[
    advantage!(PawnRush, "pawn_rush", "Pawn Rush", Common, Active,
        "Pawns may advance two squares from any rank."),
    advantage!(PawnSidestep, "pawn_sidestep", "Sidestep", Common, Active,
        "Three times per game a pawn may step sideways onto an empty square."),
    advantage!(PawnRetreat, "pawn_retreat", "Tactical Retreat", Common, Active,
        "Twice per game a pawn may step back onto an empty square."),
    advantage!(SpearPawns, "spear_pawns", "Spear Pawns", Common, Active,
        "Twice per game a pawn may capture the piece directly in front of it."),
    advantage!(CamelKnights, "camel_knights", "Camel Knights", Common, Active,
        "Three times per game a knight may leap three squares by one."),
    advantage!(PhasingBishops, "phasing_bishops", "Phasing Bishops", Common, Active,
        "Three times per game a bishop may slide through your own pieces."),
    advantage!(GhostRooks, "ghost_rooks", "Ghost Rooks", Common, Active,
        "Three times per game a rook may slide through your own pieces."),
    advantage!(ChameleonBishop, "chameleon_bishop", "Chameleon Bishop", Common, Active,
        "Once per game a bishop may step one square orthogonally, changing color."),
    advantage!(ShieldWall, "shield_wall", "Shield Wall", Common, Passive,
        "Your pawns cannot be captured during the first five moves."),
    advantage!(CornerVault, "corner_vault", "Corner Vault", Rare, Active,
        "Each rook may once vault from its corner over the pawn in front of it."),
    advantage!(AmazonQueen, "amazon_queen", "Amazon Queen", Rare, Active,
        "Twice per game your queen may move like a knight."),
    advantage!(BishopHop, "bishop_hop", "Bishop Hop", Rare, Active,
        "Twice per game a bishop may jump over one adjacent diagonal piece."),
    advantage!(KingsDash, "kings_dash", "King's Dash", Rare, Active,
        "Once per game your king may move two squares in a straight line."),
    advantage!(ShadowStep, "shadow_step", "Shadow Step", Rare, Active,
        "Once per game your king may swap places with an adjacent piece."),
    advantage!(Switcheroo, "switcheroo", "Switcheroo", Rare, Active,
        "Once per game two of your adjacent pieces may trade squares."),
    advantage!(TwinPawns, "twin_pawns", "Twin Pawns", Rare, Active,
        "Once per game two pawns may each advance one square in the same turn."),
    advantage!(FieldPromotion, "field_promotion", "Field Promotion", Rare, Active,
        "Once per game a pawn on its seventh rank may promote without moving."),
    advantage!(KnightWard, "knight_ward", "Knight Ward", Rare, Passive,
        "Enemy knights cannot give check to your king."),
    advantage!(Vengeance, "vengeance", "Vengeance", Rare, Passive,
        "While armed, the first piece to capture one of yours is destroyed too."),
    advantage!(Freeze, "freeze", "Freeze", Rare, Active,
        "Once per game, alongside a move, freeze an enemy piece for two turns."),
    advantage!(DoubleStrike, "double_strike", "Double Strike", Legendary, Active,
        "Once per game, after a capture the same piece moves again."),
    advantage!(TimeRewind, "time_rewind", "Time Rewind", Legendary, Active,
        "Once per game a piece returns to where it stood three turns ago."),
    advantage!(SecondWind, "second_wind", "Second Wind", Legendary, Passive,
        "When your queen falls, a rook appears on the queen's home square."),
];

/// Probability mass per rarity tier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RarityWeights {
    pub common: u32,
    pub rare: u32,
    pub legendary: u32,
}

impl Default for RarityWeights {
    fn default() -> Self {
        RarityWeights {
            common: 60,
            rare: 30,
            legendary: 10,
        }
    }
}

impl RarityWeights {
    pub fn weight(&self, rarity: Rarity) -> u32 {
        match rarity {
            Rarity::Common => self.common,
            Rarity::Rare => self.rare,
            Rarity::Legendary => self.legendary,
        }
    }
}

/// One player's dealt advantage. Immutable once created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvantageAssignment {
    pub id: AdvantageId,
    pub rarity: Rarity,
}

impl From<AdvantageId> for AdvantageAssignment {
    fn from(id: AdvantageId) -> Self {
        AdvantageAssignment {
            id,
            rarity: id.definition().rarity,
        }
    }
}

/// Pick a rarity tier by weight, then an advantage uniformly inside it.
///
/// Tiers with zero weight or no entries are never chosen; if every weight is
/// zero the tiers are treated as equally likely.
pub fn assign_advantage<R: Rng>(
    rng: &mut R,
    weights: &RarityWeights,
) -> AdvantageAssignment {
    let tiers: Vec<(Rarity, Vec<AdvantageId>)> = Rarity::ALL
        .iter()
        .map(|rarity| {
            let ids = CATALOG
                .iter()
                .filter(|def| def.rarity == *rarity)
                .map(|def| def.id)
                .collect::<Vec<_>>();
            (*rarity, ids)
        })
        .filter(|(_, ids)| !ids.is_empty())
        .collect();

    let tier_weights: Vec<u32> = tiers.iter().map(|(r, _)| weights.weight(*r)).collect();
    let tier = match WeightedIndex::new(&tier_weights) {
        Ok(dist) => dist.sample(rng),
        Err(_) => rng.gen_range(0..tiers.len()),
    };

    let (_, ids) = &tiers[tier];
    let id = ids.choose(rng).copied().unwrap_or(AdvantageId::PawnRush);
    AdvantageAssignment::from(id)
}
