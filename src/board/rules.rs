//! Adapter over the `chess` crate, the consumed rules engine.
//!
//! Standard legality and the final "is this still a chess position" check go
//! through `chess::Board`; geometry queries that must ignore whose turn it is
//! (attacks, pseudo-legal targets) use the crate's magic lookup tables over
//! our own [`Position`].

use chess::{
    get_bishop_moves, get_king_moves, get_knight_moves, get_pawn_attacks, get_rook_moves,
    BitBoard, Board, BoardStatus, ChessMove, Color, MoveGen, Piece, Square, ALL_SQUARES,
};

use super::{forward, offset, relative_rank, Position};
use crate::error::MoveError;

/// Load a position into the rules engine; refusal means the placement or
/// auxiliary fields are not a representable chess position.
pub fn to_engine_board(position: &Position) -> Result<Board, MoveError> {
    Board::try_from(&position.to_builder()).map_err(|e| {
        MoveError::reconstruction(format!("Rules engine rejected {}: {:?}", position, e))
    })
}

/// Whether moving from `from` to `to` is a pawn reaching its last rank.
pub fn is_promotion_move(position: &Position, from: Square, to: Square) -> bool {
    matches!(position.get(from), Some((Piece::Pawn, color)) if relative_rank(to, color) == 7)
}

/// Standard legal move lookup; a pawn reaching the last rank without an
/// explicit promotion piece promotes to a queen.
pub fn standard_move(
    position: &Position,
    from: Square,
    to: Square,
    promotion: Option<Piece>,
) -> Result<ChessMove, MoveError> {
    let board = to_engine_board(position)?;
    let promotion = if is_promotion_move(position, from, to) {
        Some(promotion.unwrap_or(Piece::Queen))
    } else {
        None
    };
    let chess_move = ChessMove::new(from, to, promotion);
    if board.legal(chess_move) {
        Ok(chess_move)
    } else {
        Err(MoveError::geometry(format!("Invalid move {}{}", from, to)))
    }
}

/// Legal standard destinations of the piece on `from`.
pub fn legal_destinations(position: &Position, from: Square) -> Result<Vec<Square>, MoveError> {
    let board = to_engine_board(position)?;
    let mut destinations: Vec<Square> = MoveGen::new_legal(&board)
        .filter(|m| m.get_source() == from)
        .map(|m| m.get_dest())
        .collect();
    destinations.dedup();
    Ok(destinations)
}

pub fn board_status(position: &Position) -> Result<BoardStatus, MoveError> {
    Ok(to_engine_board(position)?.status())
}

fn occupancy(position: &Position) -> BitBoard {
    let bits = position
        .occupied()
        .fold(0u64, |acc, (sq, _, _)| acc | (1u64 << sq.to_index()));
    BitBoard::new(bits)
}

fn color_occupancy(position: &Position, color: Color) -> u64 {
    position
        .pieces_of(color)
        .fold(0u64, |acc, (sq, _)| acc | (1u64 << sq.to_index()))
}

/// Squares a piece attacks from `square` given the board's blockers.
pub fn attack_set(piece: Piece, color: Color, square: Square, blockers: BitBoard) -> BitBoard {
    match piece {
        Piece::Pawn => get_pawn_attacks(square, color, BitBoard::new(!0u64)),
        Piece::Knight => get_knight_moves(square),
        Piece::Bishop => get_bishop_moves(square, blockers),
        Piece::Rook => get_rook_moves(square, blockers),
        Piece::Queen => BitBoard::new(
            get_bishop_moves(square, blockers).0 | get_rook_moves(square, blockers).0,
        ),
        Piece::King => get_king_moves(square),
    }
}

pub fn is_square_attacked(position: &Position, target: Square, by: Color) -> bool {
    let blockers = occupancy(position);
    let mask = 1u64 << target.to_index();
    position
        .pieces_of(by)
        .any(|(sq, piece)| attack_set(piece, by, sq, blockers).0 & mask != 0)
}

/// Pieces of color `by` attacking `target`.
pub fn attackers_of(position: &Position, target: Square, by: Color) -> Vec<(Square, Piece)> {
    let blockers = occupancy(position);
    let mask = 1u64 << target.to_index();
    position
        .pieces_of(by)
        .filter(|(sq, piece)| attack_set(*piece, by, *sq, blockers).0 & mask != 0)
        .collect()
}

pub fn in_check(position: &Position, color: Color) -> bool {
    match position.king_square(color) {
        Some(king) => is_square_attacked(position, king, !color),
        None => false,
    }
}

/// Geometry-only targets of the piece on `from`, regardless of whose turn it
/// is and of self-check. Castling is not included.
pub fn pseudo_legal_targets(position: &Position, from: Square) -> Vec<Square> {
    let (piece, color) = match position.get(from) {
        Some(found) => found,
        None => return Vec::new(),
    };
    let own = color_occupancy(position, color);
    let enemy = color_occupancy(position, !color);

    let bits = if piece == Piece::Pawn {
        let dir = forward(color);
        let mut bits = get_pawn_attacks(from, color, BitBoard::new(!0u64)).0 & enemy;
        if let Some(ep) = position.en_passant() {
            if position.side_to_move() == color {
                bits |= get_pawn_attacks(from, color, BitBoard::new(!0u64)).0
                    & (1u64 << ep.to_index());
            }
        }
        if let Some(one) = offset(from, 0, dir).filter(|sq| position.is_empty(*sq)) {
            bits |= 1u64 << one.to_index();
            if relative_rank(from, color) == 1 {
                if let Some(two) = offset(from, 0, 2 * dir).filter(|sq| position.is_empty(*sq)) {
                    bits |= 1u64 << two.to_index();
                }
            }
        }
        bits
    } else {
        attack_set(piece, color, from, occupancy(position)).0 & !own
    };

    ALL_SQUARES
        .iter()
        .copied()
        .filter(|sq| bits & (1u64 << sq.to_index()) != 0)
        .collect()
}
