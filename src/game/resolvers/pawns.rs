use chess::Piece;

use super::{conclude, delta, own_piece, promote_on_last_rank, require_empty, used_state};
use crate::board::{forward, offset, relative_rank};
use crate::error::MoveError;
use crate::game::catalog::AdvantageId;
use crate::game::draft::Draft;
use crate::game::resolver::{AdvantageResolver, MoveIntent, ResolveContext, Resolution};

/// Two squares straight ahead from any rank.
pub struct PawnRush;

impl AdvantageResolver for PawnRush {
    fn advantage(&self) -> AdvantageId {
        AdvantageId::PawnRush
    }

    fn resolve(&self, ctx: &ResolveContext<'_>, intent: &MoveIntent) -> Result<Resolution, MoveError> {
        let position = ctx.position;
        let color = intent.color;
        let piece = own_piece(position, intent.from, color, &[Piece::Pawn])?;
        let dir = forward(color);
        if offset(intent.from, 0, 2 * dir) != Some(intent.to) {
            return Err(MoveError::geometry("A rushing pawn moves two squares straight ahead"));
        }
        if relative_rank(intent.to, color) == 7 {
            return Err(MoveError::geometry("A rushing pawn cannot reach the last rank"));
        }
        let middle = offset(intent.from, 0, dir)
            .ok_or_else(|| MoveError::geometry("Off-board square"))?;
        require_empty(position, middle)?;
        require_empty(position, intent.to)?;

        let mut draft = Draft::begin(position);
        draft.relocate(intent.from, intent.to)?;
        if relative_rank(intent.from, color) == 1 {
            draft.set_en_passant(middle);
        }
        conclude(ctx, intent, draft, used_state(ctx)?, piece, None)
    }
}

/// One square sideways onto an empty square.
pub struct PawnSidestep;

impl AdvantageResolver for PawnSidestep {
    fn advantage(&self) -> AdvantageId {
        AdvantageId::PawnSidestep
    }

    fn resolve(&self, ctx: &ResolveContext<'_>, intent: &MoveIntent) -> Result<Resolution, MoveError> {
        let piece = own_piece(ctx.position, intent.from, intent.color, &[Piece::Pawn])?;
        let (df, dr) = delta(intent.from, intent.to);
        if dr != 0 || df.abs() != 1 {
            return Err(MoveError::geometry("A sidestep moves one square left or right"));
        }
        require_empty(ctx.position, intent.to)?;

        let mut draft = Draft::begin(ctx.position);
        draft.relocate(intent.from, intent.to)?;
        conclude(ctx, intent, draft, used_state(ctx)?, piece, None)
    }
}

/// One square backwards, never onto the pawn's own back rank.
pub struct PawnRetreat;

impl AdvantageResolver for PawnRetreat {
    fn advantage(&self) -> AdvantageId {
        AdvantageId::PawnRetreat
    }

    fn resolve(&self, ctx: &ResolveContext<'_>, intent: &MoveIntent) -> Result<Resolution, MoveError> {
        let color = intent.color;
        let piece = own_piece(ctx.position, intent.from, color, &[Piece::Pawn])?;
        if offset(intent.from, 0, -forward(color)) != Some(intent.to) {
            return Err(MoveError::geometry("A retreating pawn moves one square straight back"));
        }
        if relative_rank(intent.to, color) == 0 {
            return Err(MoveError::geometry("A pawn cannot retreat onto its back rank"));
        }
        require_empty(ctx.position, intent.to)?;

        let mut draft = Draft::begin(ctx.position);
        draft.relocate(intent.from, intent.to)?;
        conclude(ctx, intent, draft, used_state(ctx)?, piece, None)
    }
}

/// Capture the enemy piece standing directly in front.
pub struct SpearPawns;

impl AdvantageResolver for SpearPawns {
    fn advantage(&self) -> AdvantageId {
        AdvantageId::SpearPawns
    }

    fn resolve(&self, ctx: &ResolveContext<'_>, intent: &MoveIntent) -> Result<Resolution, MoveError> {
        let color = intent.color;
        let piece = own_piece(ctx.position, intent.from, color, &[Piece::Pawn])?;
        if offset(intent.from, 0, forward(color)) != Some(intent.to) {
            return Err(MoveError::geometry("A spear strikes the square directly ahead"));
        }
        match ctx.position.get(intent.to) {
            Some((Piece::King, _)) => {
                return Err(MoveError::geometry("The king cannot be captured"))
            }
            Some((_, c)) if c != color => {}
            _ => return Err(MoveError::geometry(format!("No enemy piece on {}", intent.to))),
        }

        let mut draft = Draft::begin(ctx.position);
        draft.relocate(intent.from, intent.to)?;
        promote_on_last_rank(&mut draft, intent.to, color, intent.promotion)?;
        conclude(ctx, intent, draft, used_state(ctx)?, piece, None)
    }
}

/// Two different pawns each advance one square.
pub struct TwinPawns;

impl AdvantageResolver for TwinPawns {
    fn advantage(&self) -> AdvantageId {
        AdvantageId::TwinPawns
    }

    fn resolve(&self, ctx: &ResolveContext<'_>, intent: &MoveIntent) -> Result<Resolution, MoveError> {
        let color = intent.color;
        let (second_from, second_to) = match (intent.second_from, intent.second_to) {
            (Some(from), Some(to)) => (from, to),
            _ => return Err(MoveError::precondition("Twin pawns needs a second pawn move")),
        };
        if second_from == intent.from || second_from == intent.to {
            return Err(MoveError::precondition("Twin pawns needs two different pawns"));
        }
        let piece = own_piece(ctx.position, intent.from, color, &[Piece::Pawn])?;
        own_piece(ctx.position, second_from, color, &[Piece::Pawn])?;

        let mut draft = Draft::begin(ctx.position);
        for (from, to) in [(intent.from, intent.to), (second_from, second_to)] {
            if offset(from, 0, forward(color)) != Some(to) {
                return Err(MoveError::geometry(format!(
                    "Pawn on {} can only advance one square",
                    from
                )));
            }
            require_empty(draft.position(), to)?;
            draft.relocate(from, to)?;
            promote_on_last_rank(&mut draft, to, color, intent.promotion)?;
        }
        conclude(ctx, intent, draft, used_state(ctx)?, piece, None)
    }
}

/// A pawn on its seventh rank promotes without moving.
pub struct FieldPromotion;

impl AdvantageResolver for FieldPromotion {
    fn advantage(&self) -> AdvantageId {
        AdvantageId::FieldPromotion
    }

    fn resolve(&self, ctx: &ResolveContext<'_>, intent: &MoveIntent) -> Result<Resolution, MoveError> {
        let color = intent.color;
        let piece = own_piece(ctx.position, intent.from, color, &[Piece::Pawn])?;
        if intent.from != intent.to {
            return Err(MoveError::geometry("A field promotion happens in place"));
        }
        if relative_rank(intent.from, color) != 6 {
            return Err(MoveError::geometry("Only a pawn on its seventh rank can be promoted"));
        }
        let promoted = intent.promotion.unwrap_or(Piece::Queen);
        if matches!(promoted, Piece::Pawn | Piece::King) {
            return Err(MoveError::precondition("Invalid promotion piece"));
        }

        let mut draft = Draft::begin(ctx.position);
        draft.promote(intent.from, promoted)?;
        conclude(ctx, intent, draft, used_state(ctx)?, piece, None)
    }
}
