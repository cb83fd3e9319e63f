//! Passive advantages that react to a move someone else just made.
//!
//! Vetoes inspect a tentatively resolved move and can deflect it before it is
//! committed. Triggers run after the commit and layer their own validated
//! mutation on top, without handing the turn over again.

use chess::{Color, Piece, Square};
use log::{debug, warn};

use super::catalog::AdvantageId;
use super::draft::{CapturedPiece, Draft, Finished};
use super::identity::{PieceTracker, PieceUid};
use super::state::AdvantageState;
use crate::board::rules::attackers_of;
use crate::board::{color_to_string, piece_name, Position};
use crate::error::MoveError;

/// Last fullmove number during which `shield_wall` protects pawns.
pub const SHIELD_WALL_MOVES: u32 = 5;

/// Everything a hook may look at about the move under review.
pub struct MoveContext<'a> {
    pub mover: Color,
    pub before: &'a Position,
    pub after: &'a Position,
    pub captured: &'a [CapturedPiece],
    pub tracker_before: &'a PieceTracker,
    /// Tracker with the move's edits replayed, before the half-move closes.
    pub tracker_after: &'a PieceTracker,
    /// Identity of the piece that started on the move's source square.
    pub moved_uid: Option<PieceUid>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Veto {
    pub holder: Color,
    pub advantage: AdvantageId,
    pub message: String,
}

/// A trigger's own mutation, already validated.
#[derive(Clone, Debug)]
pub struct Triggered {
    pub holder: Color,
    pub advantage: AdvantageId,
    pub finished: Finished,
    pub state: AdvantageState,
    pub effect: String,
}

/// Ask the opponent's advantage whether the move may stand.
pub fn veto(ctx: &MoveContext<'_>, holder: Color, state: &AdvantageState) -> Option<Veto> {
    if holder == ctx.mover {
        return None;
    }
    let refuse = |advantage: AdvantageId, message: String| {
        debug!(
            "{} {} deflects a move by {}",
            color_to_string(holder),
            advantage.as_str(),
            color_to_string(ctx.mover)
        );
        Some(Veto {
            holder,
            advantage,
            message,
        })
    };

    match state {
        AdvantageState::ShieldWall { .. } => {
            let fullmove = ctx.before.fullmove_number();
            let pawn_taken = ctx
                .captured
                .iter()
                .any(|c| c.piece == Piece::Pawn && c.color == holder);
            if pawn_taken && (1..=SHIELD_WALL_MOVES).contains(&fullmove) {
                refuse(
                    AdvantageId::ShieldWall,
                    "Shield Wall: those pawns cannot be captured yet".to_string(),
                )
            } else {
                None
            }
        }
        AdvantageState::KnightWard { .. } => {
            let king = ctx.after.king_square(holder)?;
            let knight_check = attackers_of(ctx.after, king, ctx.mover)
                .iter()
                .any(|(_, piece)| *piece == Piece::Knight);
            if knight_check {
                refuse(
                    AdvantageId::KnightWard,
                    "Knight Ward: knights cannot give check to that king".to_string(),
                )
            } else {
                None
            }
        }
        AdvantageState::Freeze {
            frozen: Some(frozen),
            ..
        } => {
            let before = ctx.tracker_before.record(frozen.uid)?;
            let after = ctx.tracker_after.record(frozen.uid)?;
            if before.alive && after.alive && before.square != after.square {
                refuse(
                    AdvantageId::Freeze,
                    format!(
                        "The {} on {} is frozen",
                        piece_name(before.piece),
                        before.square
                    ),
                )
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Run the opponent's trigger, if it fires, on the committed `current`
/// position. A trigger whose result is not a valid position is skipped.
pub fn trigger(
    ctx: &MoveContext<'_>,
    current: &Position,
    holder: Color,
    state: &AdvantageState,
) -> Option<Triggered> {
    if holder == ctx.mover {
        return None;
    }
    let lost = |piece: Option<Piece>| -> bool {
        ctx.captured
            .iter()
            .any(|c| c.color == holder && piece.map_or(true, |p| p == c.piece))
    };

    let outcome = match state {
        AdvantageState::Vengeance { toggle } if toggle.is_active() && lost(None) => {
            let record = ctx.moved_uid.and_then(|uid| ctx.tracker_after.record(uid))?;
            if !record.alive || record.piece == Piece::King {
                return None;
            }
            let square = record.square;
            let mut next = state.clone();
            if let AdvantageState::Vengeance { toggle } = &mut next {
                toggle.consume();
            }
            strike_back(current, square).map(|finished| Triggered {
                holder,
                advantage: AdvantageId::Vengeance,
                finished,
                state: next,
                effect: format!(
                    "Vengeance: the capturing {} on {} was destroyed",
                    piece_name(record.piece),
                    square
                ),
            })
        }
        AdvantageState::SecondWind { latch } if latch.is_available() && lost(Some(Piece::Queen)) => {
            let home = queen_home(holder);
            if !current.is_empty(home) {
                debug!("second_wind blocked on {}", home);
                return None;
            }
            let mut next = state.clone();
            next.record_use()
                .and_then(|_| raise_rook(current, home, holder))
                .map(|finished| Triggered {
                    holder,
                    advantage: AdvantageId::SecondWind,
                    finished,
                    state: next,
                    effect: format!("Second Wind: a rook rises on {}", home),
                })
        }
        _ => return None,
    };

    match outcome {
        Ok(triggered) => Some(triggered),
        Err(e) => {
            warn!("Skipping {} trigger: {}", state.id().as_str(), e);
            None
        }
    }
}

fn queen_home(color: Color) -> Square {
    match color {
        Color::White => Square::D1,
        Color::Black => Square::D8,
    }
}

fn strike_back(current: &Position, square: Square) -> Result<Finished, MoveError> {
    let mut draft = Draft::begin(current);
    draft.remove(square)?;
    draft.finish_in_place()
}

fn raise_rook(current: &Position, home: Square, holder: Color) -> Result<Finished, MoveError> {
    let mut draft = Draft::begin(current);
    draft.spawn(home, Piece::Rook, holder)?;
    draft.finish_in_place()
}

/// Advance the `freeze` countdown held by `holder` after `mover` finished a
/// turn. Returns true when the freeze ended.
pub fn advance_countdowns(
    state: &mut AdvantageState,
    holder: Color,
    mover: Color,
    tracker: &PieceTracker,
) -> bool {
    let frozen = match state {
        AdvantageState::Freeze { frozen, .. } => frozen,
        _ => return false,
    };
    let piece = match frozen.as_mut() {
        Some(piece) => piece,
        None => return false,
    };
    let alive = tracker.record(piece.uid).map_or(false, |r| r.alive);
    let expired = if !alive {
        true
    } else if mover != holder {
        piece.turns.tick()
    } else {
        false
    };
    if expired {
        *frozen = None;
    }
    expired
}
