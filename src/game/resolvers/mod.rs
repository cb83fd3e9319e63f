//! Built-in advantage resolvers, one unit struct per active advantage.

mod pawns;
mod pieces;
mod royal;
mod tactics;

pub use pawns::{FieldPromotion, PawnRetreat, PawnRush, PawnSidestep, SpearPawns, TwinPawns};
pub use pieces::{
    AmazonQueen, BishopHop, CamelKnights, ChameleonBishop, CornerVault, GhostRooks,
    PhasingBishops,
};
pub use royal::{KingsDash, ShadowStep, Switcheroo};
pub use tactics::{DoubleStrike, Freeze, TimeRewind};

use chess::{Color, Piece, Square};

use super::draft::Draft;
use super::resolver::{AdvantageResolver, MoveIntent, ResolveContext, Resolution};
use super::state::AdvantageState;
use crate::board::{file_of, piece_name, rank_of, relative_rank, Position};
use crate::error::MoveError;

pub fn all() -> Vec<Box<dyn AdvantageResolver>> {
    vec![
        Box::new(PawnRush),
        Box::new(PawnSidestep),
        Box::new(PawnRetreat),
        Box::new(SpearPawns),
        Box::new(CamelKnights),
        Box::new(PhasingBishops),
        Box::new(GhostRooks),
        Box::new(ChameleonBishop),
        Box::new(CornerVault),
        Box::new(AmazonQueen),
        Box::new(BishopHop),
        Box::new(KingsDash),
        Box::new(ShadowStep),
        Box::new(Switcheroo),
        Box::new(TwinPawns),
        Box::new(FieldPromotion),
        Box::new(Freeze),
        Box::new(DoubleStrike),
        Box::new(TimeRewind),
    ]
}

/// The mover's piece on `square`, which must be one of `allowed`.
fn own_piece(
    position: &Position,
    square: Square,
    color: Color,
    allowed: &[Piece],
) -> Result<Piece, MoveError> {
    match position.get(square) {
        Some((piece, c)) if c == color && allowed.contains(&piece) => Ok(piece),
        Some((piece, c)) if c == color => Err(MoveError::precondition(format!(
            "A {} cannot use this advantage",
            piece_name(piece)
        ))),
        Some(_) => Err(MoveError::precondition("Not your piece")),
        None => Err(MoveError::precondition(format!("No piece on {}", square))),
    }
}

fn require_empty(position: &Position, square: Square) -> Result<(), MoveError> {
    if position.is_empty(square) {
        Ok(())
    } else {
        Err(MoveError::geometry(format!("{} is not empty", square)))
    }
}

/// Destination must be empty or hold an enemy piece other than the king.
fn require_open_or_enemy(position: &Position, square: Square, color: Color) -> Result<(), MoveError> {
    match position.get(square) {
        None => Ok(()),
        Some((_, c)) if c == color => Err(MoveError::geometry(format!(
            "{} is occupied by your own piece",
            square
        ))),
        Some((Piece::King, _)) => Err(MoveError::geometry("The king cannot be captured")),
        Some(_) => Ok(()),
    }
}

/// (file, rank) displacement from `from` to `to`.
fn delta(from: Square, to: Square) -> (i32, i32) {
    (file_of(to) - file_of(from), rank_of(to) - rank_of(from))
}

fn is_knight_leap(from: Square, to: Square) -> bool {
    let (df, dr) = delta(from, to);
    matches!((df.abs(), dr.abs()), (1, 2) | (2, 1))
}

fn is_adjacent(a: Square, b: Square) -> bool {
    let (df, dr) = delta(a, b);
    a != b && df.abs() <= 1 && dr.abs() <= 1
}

/// Promote a pawn that ended up on its last rank.
fn promote_on_last_rank(
    draft: &mut Draft,
    square: Square,
    color: Color,
    promotion: Option<Piece>,
) -> Result<(), MoveError> {
    if matches!(draft.position().get(square), Some((Piece::Pawn, c)) if c == color)
        && relative_rank(square, color) == 7
    {
        draft.promote(square, promotion.unwrap_or(Piece::Queen))?;
    }
    Ok(())
}

/// Copy of the mover's record with one use counted.
fn used_state(ctx: &ResolveContext<'_>) -> Result<AdvantageState, MoveError> {
    let mut state = ctx.state.clone();
    state.record_use()?;
    Ok(state)
}

fn conclude(
    ctx: &ResolveContext<'_>,
    intent: &MoveIntent,
    draft: Draft,
    state: AdvantageState,
    piece: Piece,
    effect: Option<String>,
) -> Result<Resolution, MoveError> {
    let special = ctx.state.id();
    let finished = draft.finish(intent.color)?;
    Ok(Resolution {
        finished,
        state: Some(state),
        piece,
        special: Some(special),
        effect: effect.or_else(|| Some(special.as_str().to_string())),
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::game::catalog::AdvantageId;
    use crate::game::identity::PieceTracker;

    /// Run the named resolver with a fresh advantage record.
    pub fn run(fen: &str, id: AdvantageId, intent: MoveIntent) -> Result<Resolution, MoveError> {
        let state = AdvantageState::initial(id);
        run_with(fen, &state, intent)
    }

    pub fn run_with(
        fen: &str,
        state: &AdvantageState,
        intent: MoveIntent,
    ) -> Result<Resolution, MoveError> {
        let position = Position::from_fen(fen).unwrap();
        let tracker = PieceTracker::from_position(&position, 12);
        run_tracked(&position, &tracker, state, intent)
    }

    pub fn run_tracked(
        position: &Position,
        tracker: &PieceTracker,
        state: &AdvantageState,
        intent: MoveIntent,
    ) -> Result<Resolution, MoveError> {
        let registry = crate::game::resolver::ResolverRegistry::standard();
        let resolver = registry.get(state.id()).unwrap();
        let ctx = ResolveContext {
            position,
            state,
            tracker,
        };
        resolver.resolve(&ctx, &intent.special(state.id()))
    }

    pub fn fen_after(resolution: &Resolution) -> String {
        resolution.finished.after.to_fen()
    }
}
