//! Canonical board state and the thin adapter over the `chess` rules engine.

pub mod position;
pub mod rules;

pub use position::{CastleSide, CastlingRights, Position, TurnRecipe, STARTING_FEN};

use chess::{Color, File, Piece, Rank, Square};
use std::str::FromStr;

use crate::error::MoveError;

/// Square at (file, rank) with both coordinates in 0..8, if on the board.
pub fn square_at(file: i32, rank: i32) -> Option<Square> {
    if (0..8).contains(&file) && (0..8).contains(&rank) {
        Some(Square::make_square(
            Rank::from_index(rank as usize),
            File::from_index(file as usize),
        ))
    } else {
        None
    }
}

/// Square reached by shifting `square` by (df, dr), if still on the board.
pub fn offset(square: Square, df: i32, dr: i32) -> Option<Square> {
    square_at(file_of(square) + df, rank_of(square) + dr)
}

pub fn file_of(square: Square) -> i32 {
    square.get_file().to_index() as i32
}

pub fn rank_of(square: Square) -> i32 {
    square.get_rank().to_index() as i32
}

/// Rank counted from the given side's back rank (0 = back rank, 7 = last rank).
pub fn relative_rank(square: Square, color: Color) -> i32 {
    match color {
        Color::White => rank_of(square),
        Color::Black => 7 - rank_of(square),
    }
}

/// +1 for White, -1 for Black.
pub fn forward(color: Color) -> i32 {
    match color {
        Color::White => 1,
        Color::Black => -1,
    }
}

pub fn parse_square(text: &str) -> Result<Square, MoveError> {
    Square::from_str(&text.trim().to_lowercase())
        .map_err(|_| MoveError::geometry(format!("Off-board square: {}", text)))
}

pub fn piece_from_char(c: char) -> Option<Piece> {
    match c.to_ascii_lowercase() {
        'p' => Some(Piece::Pawn),
        'n' => Some(Piece::Knight),
        'b' => Some(Piece::Bishop),
        'r' => Some(Piece::Rook),
        'q' => Some(Piece::Queen),
        'k' => Some(Piece::King),
        _ => None,
    }
}

/// Lowercase letter for a piece (`'n'` for a knight).
pub fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    }
}

pub fn piece_name(piece: Piece) -> &'static str {
    match piece {
        Piece::Pawn => "pawn",
        Piece::Knight => "knight",
        Piece::Bishop => "bishop",
        Piece::Rook => "rook",
        Piece::Queen => "queen",
        Piece::King => "king",
    }
}

pub fn parse_promotion(text: &str) -> Result<Piece, MoveError> {
    let mut chars = text.trim().chars();
    match (chars.next().and_then(piece_from_char), chars.next()) {
        (Some(piece), None) if piece != Piece::Pawn && piece != Piece::King => Ok(piece),
        _ => Err(MoveError::precondition(format!(
            "Invalid promotion piece: {}",
            text
        ))),
    }
}

/// Convert a chess color to a string
pub fn color_to_string(color: Color) -> String {
    match color {
        Color::White => "white".to_string(),
        Color::Black => "black".to_string(),
    }
}

pub fn parse_color(text: &str) -> Option<Color> {
    match text.trim().to_lowercase().as_str() {
        "white" | "w" => Some(Color::White),
        "black" | "b" => Some(Color::Black),
        _ => None,
    }
}
