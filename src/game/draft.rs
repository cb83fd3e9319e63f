//! Snapshot, raw mutation, FEN recipe and validation as one transaction.
//!
//! A [`Draft`] works on a private copy of the position. Nothing reaches the
//! room until [`Draft::finish`] succeeds, so dropping a draft (or returning
//! an error from it) is the rollback.

use chess::{ChessMove, Color, Piece, Square};
use serde::Serialize;

use super::identity::Edit;
use crate::board::rules::{in_check, to_engine_board};
use crate::board::{file_of, forward, offset, rank_of, square_at, Position, TurnRecipe};
use crate::error::MoveError;

/// Classification flags attached to every committed move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MoveFlags {
    pub capture: bool,
    pub promotion: bool,
    pub castle: bool,
    pub en_passant: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CapturedPiece {
    pub piece: Piece,
    pub color: Color,
    pub square: Square,
}

#[derive(Clone, Debug)]
pub struct Draft {
    before: Position,
    position: Position,
    edits: Vec<Edit>,
    recipe: TurnRecipe,
    captured: Vec<CapturedPiece>,
    flags: MoveFlags,
}

/// A validated mutation ready to be committed.
#[derive(Clone, Debug)]
pub struct Finished {
    pub before: Position,
    pub after: Position,
    pub edits: Vec<Edit>,
    pub captured: Vec<CapturedPiece>,
    pub flags: MoveFlags,
}

impl Draft {
    pub fn begin(base: &Position) -> Self {
        Draft {
            before: base.clone(),
            position: base.clone(),
            edits: Vec::new(),
            recipe: TurnRecipe::default(),
            captured: Vec::new(),
            flags: MoveFlags::default(),
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn before(&self) -> &Position {
        &self.before
    }

    pub fn captured(&self) -> &[CapturedPiece] {
        &self.captured
    }

    /// Move the piece on `from` to `to`, capturing an enemy piece there.
    pub fn relocate(&mut self, from: Square, to: Square) -> Result<Option<CapturedPiece>, MoveError> {
        let (piece, color) = self
            .position
            .get(from)
            .ok_or_else(|| MoveError::precondition(format!("No piece on {}", from)))?;
        if from == to {
            return Err(MoveError::geometry("Source and destination are the same square"));
        }
        let captured = match self.position.get(to) {
            Some((_, c)) if c == color => {
                return Err(MoveError::geometry(format!("{} is occupied by your own piece", to)))
            }
            Some(_) => Some(self.capture(to)?),
            None => None,
        };
        self.position.remove(from);
        self.position.put(to, piece, color);
        self.edits.push(Edit::Move { from, to });
        self.recipe.touched.push(from);
        if piece == Piece::Pawn {
            self.recipe.pawn_moved = true;
        }
        Ok(captured)
    }

    /// Take the piece on `square` off the board as a capture.
    pub fn capture(&mut self, square: Square) -> Result<CapturedPiece, MoveError> {
        let (piece, color) = self
            .position
            .remove(square)
            .ok_or_else(|| MoveError::geometry(format!("Nothing to capture on {}", square)))?;
        if piece == Piece::King {
            return Err(MoveError::geometry("The king cannot be captured"));
        }
        let captured = CapturedPiece {
            piece,
            color,
            square,
        };
        self.edits.push(Edit::Capture { square });
        self.recipe.touched.push(square);
        self.recipe.capture = true;
        self.flags.capture = true;
        self.captured.push(captured);
        Ok(captured)
    }

    /// Take a piece off the board without it counting as a capture.
    pub fn remove(&mut self, square: Square) -> Result<(Piece, Color), MoveError> {
        let removed = self
            .position
            .remove(square)
            .ok_or_else(|| MoveError::geometry(format!("Nothing to remove on {}", square)))?;
        self.edits.push(Edit::Remove { square });
        self.recipe.touched.push(square);
        // material left the board, so the fifty-move count restarts
        self.recipe.capture = true;
        Ok(removed)
    }

    pub fn promote(&mut self, square: Square, piece: Piece) -> Result<(), MoveError> {
        match self.position.get(square) {
            Some((Piece::Pawn, color)) => {
                self.position.put(square, piece, color);
                self.edits.push(Edit::Promote { square, piece });
                self.flags.promotion = true;
                self.recipe.pawn_moved = true;
                Ok(())
            }
            _ => Err(MoveError::precondition(format!("No pawn to promote on {}", square))),
        }
    }

    pub fn spawn(&mut self, square: Square, piece: Piece, color: Color) -> Result<(), MoveError> {
        if !self.position.is_empty(square) {
            return Err(MoveError::geometry(format!("{} is occupied", square)));
        }
        self.position.put(square, piece, color);
        self.edits.push(Edit::Spawn {
            square,
            piece,
            color,
        });
        Ok(())
    }

    /// Exchange two occupied squares.
    pub fn swap(&mut self, a: Square, b: Square) -> Result<(), MoveError> {
        let first = self
            .position
            .get(a)
            .ok_or_else(|| MoveError::precondition(format!("No piece on {}", a)))?;
        let second = self
            .position
            .get(b)
            .ok_or_else(|| MoveError::precondition(format!("No piece on {}", b)))?;
        self.position.put(a, second.0, second.1);
        self.position.put(b, first.0, first.1);
        self.edits.push(Edit::Swap { a, b });
        self.recipe.touched.push(a);
        self.recipe.touched.push(b);
        if first.0 == Piece::Pawn || second.0 == Piece::Pawn {
            self.recipe.pawn_moved = true;
        }
        Ok(())
    }

    /// Mark the square a pawn skipped over as the en-passant target.
    pub fn set_en_passant(&mut self, square: Square) {
        self.recipe.en_passant = Some(square);
    }

    /// Apply a move the rules engine already accepted, including the rook of
    /// a castle, the pawn taken en passant, and promotion.
    pub fn apply_standard(&mut self, chess_move: ChessMove) -> Result<(), MoveError> {
        let from = chess_move.get_source();
        let to = chess_move.get_dest();
        let (piece, color) = self
            .position
            .get(from)
            .ok_or_else(|| MoveError::precondition(format!("No piece on {}", from)))?;

        if piece == Piece::Pawn
            && file_of(from) != file_of(to)
            && self.position.is_empty(to)
            && self.position.en_passant() == Some(to)
        {
            let victim = offset(to, 0, -forward(color))
                .ok_or_else(|| MoveError::geometry("Invalid en passant capture"))?;
            self.capture(victim)?;
            self.flags.en_passant = true;
        }

        if piece == Piece::King && (file_of(to) - file_of(from)).abs() == 2 {
            let rank = rank_of(from);
            let (rook_from, rook_to) = if file_of(to) > file_of(from) {
                (square_at(7, rank), square_at(5, rank))
            } else {
                (square_at(0, rank), square_at(3, rank))
            };
            if let (Some(rook_from), Some(rook_to)) = (rook_from, rook_to) {
                self.relocate(rook_from, rook_to)?;
            }
            self.flags.castle = true;
        }

        self.relocate(from, to)?;
        if let Some(promotion) = chess_move.get_promotion() {
            self.promote(to, promotion)?;
        }
        if piece == Piece::Pawn && (rank_of(to) - rank_of(from)).abs() == 2 {
            if let Some(skipped) = offset(from, 0, forward(color)) {
                self.set_en_passant(skipped);
            }
        }
        Ok(())
    }

    /// Run the shared recipe for `mover`, then validate the result.
    pub fn finish(mut self, mover: Color) -> Result<Finished, MoveError> {
        let recipe = std::mem::take(&mut self.recipe);
        self.position.finish_turn(mover, &recipe);
        if in_check(&self.position, mover) {
            return Err(MoveError::geometry("Move would leave your king in check"));
        }
        self.validate()
    }

    /// Validate a mutation layered on an already committed move; the side to
    /// move and the counters stay as they are.
    pub fn finish_in_place(mut self) -> Result<Finished, MoveError> {
        self.position.drop_incoherent_castling();
        self.validate()
    }

    fn validate(self) -> Result<Finished, MoveError> {
        if let Some(square) = self.position.stranded_pawn() {
            return Err(MoveError::reconstruction(format!(
                "A pawn cannot stand on {}",
                square
            )));
        }
        let fen = self.position.to_fen();
        let reparsed = Position::from_fen(&fen)
            .map_err(|e| MoveError::reconstruction(format!("Unparseable state {}: {}", fen, e)))?;
        if reparsed != self.position {
            return Err(MoveError::reconstruction(format!("State drifted on reload: {}", fen)));
        }
        to_engine_board(&self.position)?;
        Ok(Finished {
            before: self.before,
            after: self.position,
            edits: self.edits,
            captured: self.captured,
            flags: self.flags,
        })
    }
}
