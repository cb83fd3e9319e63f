use chess::Piece;

use super::{conclude, own_piece, promote_on_last_rank, require_empty, used_state};
use crate::board::rules::{pseudo_legal_targets, standard_move};
use crate::board::{file_of, piece_name};
use crate::error::MoveError;
use crate::game::catalog::AdvantageId;
use crate::game::draft::Draft;
use crate::game::resolver::{AdvantageResolver, MoveIntent, ResolveContext, Resolution};
use crate::game::state::{AdvantageState, Countdown, FrozenPiece, FREEZE_TURNS};

const ANY_PIECE: [Piece; 6] = [
    Piece::Pawn,
    Piece::Knight,
    Piece::Bishop,
    Piece::Rook,
    Piece::Queen,
    Piece::King,
];

/// How far back a rewind reaches, in half-moves.
pub const REWIND_HALF_MOVES: usize = 6;

/// A legal capture followed by a second move of the same piece.
pub struct DoubleStrike;

impl AdvantageResolver for DoubleStrike {
    fn advantage(&self) -> AdvantageId {
        AdvantageId::DoubleStrike
    }

    fn resolve(&self, ctx: &ResolveContext<'_>, intent: &MoveIntent) -> Result<Resolution, MoveError> {
        let color = intent.color;
        let (second_from, second_to) = match (intent.second_from, intent.second_to) {
            (Some(from), Some(to)) => (from, to),
            _ => return Err(MoveError::precondition("Double strike needs a second move")),
        };
        if second_from != intent.to {
            return Err(MoveError::precondition(
                "The second strike must continue with the same piece",
            ));
        }
        let piece = own_piece(ctx.position, intent.from, color, &ANY_PIECE)?;
        let first = standard_move(ctx.position, intent.from, intent.to, intent.promotion)?;

        let mut draft = Draft::begin(ctx.position);
        draft.apply_standard(first)?;
        if draft.captured().is_empty() {
            return Err(MoveError::geometry("The first strike must capture"));
        }

        let mid = draft.position().clone();
        let (striker, _) = mid
            .get(second_from)
            .ok_or_else(|| MoveError::reconstruction("Striking piece vanished"))?;
        if !pseudo_legal_targets(&mid, second_from).contains(&second_to) {
            return Err(MoveError::geometry(format!(
                "The {} cannot reach {}",
                piece_name(striker),
                second_to
            )));
        }
        if matches!(mid.get(second_to), Some((Piece::King, _))) {
            return Err(MoveError::geometry("The king cannot be captured"));
        }
        if striker == Piece::Pawn
            && file_of(second_from) != file_of(second_to)
            && mid.is_empty(second_to)
        {
            return Err(MoveError::geometry("No en passant on the second strike"));
        }

        draft.relocate(second_from, second_to)?;
        promote_on_last_rank(&mut draft, second_to, color, intent.promotion)?;
        conclude(ctx, intent, draft, used_state(ctx)?, piece, None)
    }
}

/// Return a piece to where it stood three turns ago.
pub struct TimeRewind;

impl AdvantageResolver for TimeRewind {
    fn advantage(&self) -> AdvantageId {
        AdvantageId::TimeRewind
    }

    fn resolve(&self, ctx: &ResolveContext<'_>, intent: &MoveIntent) -> Result<Resolution, MoveError> {
        let piece = own_piece(ctx.position, intent.from, intent.color, &ANY_PIECE)?;
        let uid = ctx.tracker.uid_at(intent.from).ok_or_else(|| {
            MoveError::reconstruction(format!("No identity for the piece on {}", intent.from))
        })?;
        let past = ctx
            .tracker
            .square_ago(uid, REWIND_HALF_MOVES)
            .ok_or_else(|| MoveError::precondition("This piece has no position three turns ago"))?;
        if past == intent.from {
            return Err(MoveError::geometry("The piece stood here three turns ago"));
        }
        if past != intent.to {
            return Err(MoveError::geometry(format!(
                "Three turns ago this piece stood on {}",
                past
            )));
        }
        require_empty(ctx.position, intent.to)?;

        let mut draft = Draft::begin(ctx.position);
        draft.relocate(intent.from, intent.to)?;
        conclude(ctx, intent, draft, used_state(ctx)?, piece, None)
    }
}

/// A standard move that also pins down one enemy piece for two turns.
pub struct Freeze;

impl AdvantageResolver for Freeze {
    fn advantage(&self) -> AdvantageId {
        AdvantageId::Freeze
    }

    fn resolve(&self, ctx: &ResolveContext<'_>, intent: &MoveIntent) -> Result<Resolution, MoveError> {
        let color = intent.color;
        let target = intent
            .target
            .ok_or_else(|| MoveError::precondition("Freeze needs a target piece"))?;
        let piece = own_piece(ctx.position, intent.from, color, &ANY_PIECE)?;
        let chess_move = standard_move(ctx.position, intent.from, intent.to, intent.promotion)?;

        let mut draft = Draft::begin(ctx.position);
        draft.apply_standard(chess_move)?;
        let frozen_piece = match draft.position().get(target) {
            Some((Piece::King, _)) => return Err(MoveError::geometry("The king cannot be frozen")),
            Some((frozen, c)) if c != color => frozen,
            _ => return Err(MoveError::geometry(format!("No enemy piece on {} to freeze", target))),
        };
        let uid = ctx.tracker.uid_at(target).ok_or_else(|| {
            MoveError::reconstruction(format!("No identity for the piece on {}", target))
        })?;

        let mut state = used_state(ctx)?;
        if let AdvantageState::Freeze { frozen, .. } = &mut state {
            *frozen = Some(FrozenPiece {
                uid,
                turns: Countdown::new(FREEZE_TURNS),
            });
        }
        let effect = format!("The {} on {} is frozen", piece_name(frozen_piece), target);
        conclude(ctx, intent, draft, state, piece, Some(effect))
    }
}
