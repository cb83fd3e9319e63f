use chess::{BoardStatus, Color, Piece};
use serde::Serialize;

use crate::board::rules::board_status;
use crate::board::{color_to_string, Position};
use crate::error::MoveError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
}

impl GameResult {
    pub fn win_for(color: Color) -> Self {
        match color {
            Color::White => GameResult::WhiteWins,
            Color::Black => GameResult::BlackWins,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    Resignation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GameOutcome {
    pub result: GameResult,
    pub reason: EndReason,
}

/// Get the game status as a string
pub fn get_game_status(position: &Position, outcome: Option<GameOutcome>) -> String {
    if let Some(outcome) = outcome {
        return match outcome.result {
            GameResult::WhiteWins => "white_wins".to_string(),
            GameResult::BlackWins => "black_wins".to_string(),
            GameResult::Draw => "draw".to_string(),
        };
    }
    match board_status(position) {
        Ok(BoardStatus::Ongoing) => "in_progress".to_string(),
        Ok(BoardStatus::Checkmate) => "checkmate".to_string(),
        Ok(BoardStatus::Stalemate) => "stalemate".to_string(),
        Err(_) => "unknown".to_string(),
    }
}

/// End-of-game detection after a committed move.
pub fn detect_outcome(position: &Position) -> Result<Option<GameOutcome>, MoveError> {
    let outcome = match board_status(position)? {
        BoardStatus::Checkmate => Some(GameOutcome {
            result: GameResult::win_for(!position.side_to_move()),
            reason: EndReason::Checkmate,
        }),
        BoardStatus::Stalemate => Some(GameOutcome {
            result: GameResult::Draw,
            reason: EndReason::Stalemate,
        }),
        _ if has_insufficient_material(position) => Some(GameOutcome {
            result: GameResult::Draw,
            reason: EndReason::InsufficientMaterial,
        }),
        _ => None,
    };
    if let Some(outcome) = outcome {
        log::info!(
            "Game over ({:?}), {} to move",
            outcome.reason,
            color_to_string(position.side_to_move())
        );
    }
    Ok(outcome)
}

/// Check if the board has insufficient material for checkmate
pub fn has_insufficient_material(position: &Position) -> bool {
    let heavy = [Piece::Pawn, Piece::Rook, Piece::Queen];
    for color in [Color::White, Color::Black] {
        if heavy.iter().any(|p| position.material_count(color, *p) > 0) {
            return false;
        }
    }

    let minors = |color| {
        position.material_count(color, Piece::Knight) + position.material_count(color, Piece::Bishop)
    };
    let (white, black) = (minors(Color::White), minors(Color::Black));

    // bare kings, or a single minor piece against a bare king
    if white + black <= 1 {
        return true;
    }

    // one bishop each, both on the same square color
    if white == 1
        && black == 1
        && position.material_count(Color::White, Piece::Bishop) == 1
        && position.material_count(Color::Black, Piece::Bishop) == 1
    {
        let shades: Vec<bool> = position
            .occupied()
            .filter(|(_, piece, _)| *piece == Piece::Bishop)
            .map(|(square, _, _)| Position::is_light_square(square))
            .collect();
        return shades.len() == 2 && shades[0] == shades[1];
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    #[test]
    fn insufficient_material_cases() {
        assert!(has_insufficient_material(&pos("4k3/8/8/8/8/8/8/4K3 w - - 0 1")));
        assert!(has_insufficient_material(&pos("4k3/8/8/8/8/8/8/2B1K3 w - - 0 1")));
        assert!(has_insufficient_material(&pos("4k3/8/8/8/8/8/8/1N2K3 w - - 0 1")));
        // c1 and f8 are both dark squares
        assert!(has_insufficient_material(&pos("4kb2/8/8/8/8/8/8/2B1K3 w - - 0 1")));
        assert!(!has_insufficient_material(&pos("4k1b1/8/8/8/8/8/8/2B1K3 w - - 0 1")));
        assert!(!has_insufficient_material(&pos("4k3/8/8/8/8/8/8/R3K3 w - - 0 1")));
        assert!(!has_insufficient_material(&Position::default()));
    }

    #[test]
    fn checkmate_is_detected() {
        // fool's mate
        let mated = pos("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        let outcome = detect_outcome(&mated).unwrap().unwrap();
        assert_eq!(outcome.result, GameResult::BlackWins);
        assert_eq!(outcome.reason, EndReason::Checkmate);
        assert_eq!(get_game_status(&mated, None), "checkmate");
    }

    #[test]
    fn stalemate_is_a_draw() {
        let stale = pos("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        let outcome = detect_outcome(&stale).unwrap().unwrap();
        assert_eq!(outcome.result, GameResult::Draw);
        assert_eq!(outcome.reason, EndReason::Stalemate);
    }

    #[test]
    fn ongoing_game_has_no_outcome() {
        assert_eq!(detect_outcome(&Position::default()).unwrap(), None);
        assert_eq!(get_game_status(&Position::default(), None), "in_progress");
    }
}
