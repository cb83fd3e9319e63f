//! Routes a move intent to standard chess or to the resolver of the mover's
//! advantage.

use chess::{BoardStatus, Color, Piece, Square};
use log::debug;
use serde::Serialize;
use std::collections::HashMap;

use super::catalog::{AdvantageAssignment, AdvantageId, AdvantageKind};
use super::draft::{Draft, Finished, MoveFlags};
use super::identity::PieceTracker;
use super::resolvers;
use super::state::AdvantageState;
use crate::board::rules::{standard_move, to_engine_board};
use crate::board::{color_to_string, file_of, piece_letter, Position};
use crate::error::MoveError;

/// What a player asked for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveIntent {
    pub color: Color,
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Piece>,
    pub second_from: Option<Square>,
    pub second_to: Option<Square>,
    /// Designated square for advantages that single out a piece.
    pub target: Option<Square>,
    pub special: Option<AdvantageId>,
    /// Ply the client believed current when it submitted.
    pub expected_ply: Option<usize>,
}

impl MoveIntent {
    pub fn new(color: Color, from: Square, to: Square) -> Self {
        MoveIntent {
            color,
            from,
            to,
            promotion: None,
            second_from: None,
            second_to: None,
            target: None,
            special: None,
            expected_ply: None,
        }
    }

    pub fn special(mut self, advantage: AdvantageId) -> Self {
        self.special = Some(advantage);
        self
    }

    pub fn second_leg(mut self, from: Square, to: Square) -> Self {
        self.second_from = Some(from);
        self.second_to = Some(to);
        self
    }

    pub fn target(mut self, square: Square) -> Self {
        self.target = Some(square);
        self
    }

    pub fn promotion(mut self, piece: Piece) -> Self {
        self.promotion = Some(piece);
        self
    }

    fn has_extras(&self) -> bool {
        self.second_from.is_some() || self.second_to.is_some() || self.target.is_some()
    }
}

/// Read-only inputs handed to a resolver.
pub struct ResolveContext<'a> {
    pub position: &'a Position,
    pub state: &'a AdvantageState,
    pub tracker: &'a PieceTracker,
}

/// A validated move, not yet committed to the room.
#[derive(Clone, Debug)]
pub struct Resolution {
    pub finished: Finished,
    /// Mover's advantage record after this move (unchanged for standard moves).
    pub state: Option<AdvantageState>,
    pub piece: Piece,
    pub special: Option<AdvantageId>,
    /// Short tag clients may show as a toast.
    pub effect: Option<String>,
}

/// Validation and mutation routine of one advantage.
pub trait AdvantageResolver: Send + Sync {
    fn advantage(&self) -> AdvantageId;

    fn resolve(
        &self,
        ctx: &ResolveContext<'_>,
        intent: &MoveIntent,
    ) -> Result<Resolution, MoveError>;
}

/// Advantage id -> resolver.
pub struct ResolverRegistry {
    resolvers: HashMap<AdvantageId, Box<dyn AdvantageResolver>>,
}

impl ResolverRegistry {
    /// Registry with every built-in resolver.
    pub fn standard() -> Self {
        let mut registry = ResolverRegistry {
            resolvers: HashMap::new(),
        };
        for resolver in resolvers::all() {
            registry.register(resolver);
        }
        registry
    }

    pub fn register(&mut self, resolver: Box<dyn AdvantageResolver>) {
        self.resolvers.insert(resolver.advantage(), resolver);
    }

    pub fn get(&self, id: AdvantageId) -> Option<&dyn AdvantageResolver> {
        self.resolvers.get(&id).map(|r| r.as_ref())
    }

    /// Decide which rule set governs `intent` and run it.
    pub fn resolve(
        &self,
        position: &Position,
        tracker: &PieceTracker,
        advantage: Option<(&AdvantageAssignment, &AdvantageState)>,
        intent: &MoveIntent,
    ) -> Result<Resolution, MoveError> {
        if intent.color != position.side_to_move() {
            return Err(MoveError::precondition("Not your turn"));
        }
        match position.get(intent.from) {
            Some((_, color)) if color == intent.color => {}
            Some(_) => return Err(MoveError::precondition("Not your piece")),
            None => {
                return Err(MoveError::precondition(format!(
                    "No piece on {}",
                    intent.from
                )))
            }
        }

        let special = match intent.special {
            None => {
                if intent.has_extras() {
                    return Err(MoveError::precondition(
                        "Extra move legs require an advantage",
                    ));
                }
                return resolve_standard(position, intent);
            }
            Some(special) => special,
        };

        let (assignment, state) = advantage
            .ok_or_else(|| MoveError::precondition("You hold no advantage"))?;
        if assignment.id != special {
            return Err(MoveError::precondition(format!(
                "{} is not your advantage",
                special.as_str()
            )));
        }
        if special.definition().kind != AdvantageKind::Active {
            return Err(MoveError::precondition(format!(
                "{} has no special move",
                special.as_str()
            )));
        }
        state.ensure_available()?;
        let resolver = self.get(special).ok_or_else(|| {
            MoveError::precondition(format!("No resolver for {}", special.as_str()))
        })?;

        debug!("Resolving {} move {}{}", special.as_str(), intent.from, intent.to);
        let ctx = ResolveContext {
            position,
            state,
            tracker,
        };
        resolver.resolve(&ctx, intent)
    }
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        ResolverRegistry::standard()
    }
}

fn resolve_standard(position: &Position, intent: &MoveIntent) -> Result<Resolution, MoveError> {
    let chess_move = standard_move(position, intent.from, intent.to, intent.promotion)?;
    let piece = position
        .get(intent.from)
        .map(|(piece, _)| piece)
        .ok_or_else(|| MoveError::precondition(format!("No piece on {}", intent.from)))?;
    let mut draft = Draft::begin(position);
    draft.apply_standard(chess_move)?;
    Ok(Resolution {
        finished: draft.finish(intent.color)?,
        state: None,
        piece,
        special: None,
        effect: None,
    })
}

/// Move Result as recorded in history and broadcast to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MoveRecord {
    pub ply: usize,
    pub color: String,
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_to: Option<String>,
    pub piece: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured: Option<String>,
    pub notation: String,
    pub fen_before: String,
    pub fen_after: String,
    pub flags: MoveFlags,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special: Option<AdvantageId>,
}

impl MoveRecord {
    pub fn new(ply: usize, intent: &MoveIntent, resolution: &Resolution) -> Self {
        let finished = &resolution.finished;
        MoveRecord {
            ply,
            color: color_to_string(intent.color),
            from: intent.from.to_string(),
            to: intent.to.to_string(),
            second_from: intent.second_from.map(|sq| sq.to_string()),
            second_to: intent.second_to.map(|sq| sq.to_string()),
            piece: piece_letter(resolution.piece).to_string(),
            captured: finished
                .captured
                .first()
                .map(|c| piece_letter(c.piece).to_string()),
            notation: notation(intent, resolution),
            fen_before: finished.before.to_fen(),
            fen_after: finished.after.to_fen(),
            flags: finished.flags,
            special: resolution.special,
        }
    }
}

/// Coordinate notation, e.g. `Ng1-f3`, `e5xd6`, `O-O`, `e7-e8=Q+`, with the
/// governing advantage appended in brackets.
pub fn notation(intent: &MoveIntent, resolution: &Resolution) -> String {
    let flags = resolution.finished.flags;
    let mut text = if flags.castle && resolution.special.is_none() {
        if file_of(intent.to) > file_of(intent.from) {
            "O-O".to_string()
        } else {
            "O-O-O".to_string()
        }
    } else {
        let prefix = match resolution.piece {
            Piece::Pawn => String::new(),
            other => piece_letter(other).to_ascii_uppercase().to_string(),
        };
        let joint = if flags.capture { 'x' } else { '-' };
        format!("{}{}{}{}", prefix, intent.from, joint, intent.to)
    };
    if let (Some(from), Some(to)) = (intent.second_from, intent.second_to) {
        text.push_str(&format!(", {}-{}", from, to));
    }
    if flags.promotion {
        let promoted = resolution
            .finished
            .after
            .get(intent.to)
            .map(|(piece, _)| piece)
            .unwrap_or(Piece::Queen);
        text.push('=');
        text.push(piece_letter(promoted).to_ascii_uppercase());
    }
    if let Ok(board) = to_engine_board(&resolution.finished.after) {
        match board.status() {
            BoardStatus::Checkmate => text.push('#'),
            _ if board.checkers().popcnt() > 0 => text.push('+'),
            _ => {}
        }
    }
    if let Some(special) = resolution.special {
        text.push_str(&format!(" [{}]", special.as_str()));
    }
    text
}
