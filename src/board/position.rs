use chess::{BoardBuilder, CastleRights, Color, Piece, Square, ALL_SQUARES};
use std::fmt;
use std::str::FromStr;

use super::{file_of, rank_of, relative_rank};
use crate::error::FenError;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CastleSide {
    King,
    Queen,
}

/// The four castling flags of a FEN string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    pub fn all() -> Self {
        CastlingRights {
            white_kingside: true,
            white_queenside: true,
            black_kingside: true,
            black_queenside: true,
        }
    }

    pub fn has(&self, color: Color, side: CastleSide) -> bool {
        match (color, side) {
            (Color::White, CastleSide::King) => self.white_kingside,
            (Color::White, CastleSide::Queen) => self.white_queenside,
            (Color::Black, CastleSide::King) => self.black_kingside,
            (Color::Black, CastleSide::Queen) => self.black_queenside,
        }
    }

    pub fn revoke(&mut self, color: Color, side: CastleSide) {
        match (color, side) {
            (Color::White, CastleSide::King) => self.white_kingside = false,
            (Color::White, CastleSide::Queen) => self.white_queenside = false,
            (Color::Black, CastleSide::King) => self.black_kingside = false,
            (Color::Black, CastleSide::Queen) => self.black_queenside = false,
        }
    }

    /// Drop every right that depends on a piece standing on `square`.
    pub fn revoke_square(&mut self, square: Square) {
        for color in [Color::White, Color::Black] {
            if square == king_home(color) {
                self.revoke(color, CastleSide::King);
                self.revoke(color, CastleSide::Queen);
            }
            for side in [CastleSide::King, CastleSide::Queen] {
                if square == rook_home(color, side) {
                    self.revoke(color, side);
                }
            }
        }
    }

    fn from_engine(white: CastleRights, black: CastleRights) -> Self {
        CastlingRights {
            white_kingside: white.has_kingside(),
            white_queenside: white.has_queenside(),
            black_kingside: black.has_kingside(),
            black_queenside: black.has_queenside(),
        }
    }

    /// The rules engine's view of one side's rights.
    pub fn to_engine(self, color: Color) -> CastleRights {
        let kingside = self.has(color, CastleSide::King) as usize;
        let queenside = self.has(color, CastleSide::Queen) as usize;
        CastleRights::from_index(kingside | queenside << 1)
    }
}

pub fn king_home(color: Color) -> Square {
    match color {
        Color::White => Square::E1,
        Color::Black => Square::E8,
    }
}

pub fn rook_home(color: Color, side: CastleSide) -> Square {
    match (color, side) {
        (Color::White, CastleSide::King) => Square::H1,
        (Color::White, CastleSide::Queen) => Square::A1,
        (Color::Black, CastleSide::King) => Square::H8,
        (Color::Black, CastleSide::Queen) => Square::A8,
    }
}

/// Eight ranks of exactly eight files each.
fn placement_is_well_formed(field: &str) -> bool {
    let ranks: Vec<&str> = field.split('/').collect();
    ranks.len() == 8
        && ranks.iter().all(|row| {
            row.chars()
                .map(|c| c.to_digit(10).unwrap_or(1))
                .sum::<u32>()
                == 8
        })
}

/// Inputs of the single post-mutation FEN recipe.
///
/// Every board change, standard or advantage-originated, finishes through
/// [`Position::finish_turn`] with one of these.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TurnRecipe {
    /// A piece left the board (capture or removal).
    pub capture: bool,
    /// A pawn moved; resets the halfmove clock like a capture.
    pub pawn_moved: bool,
    /// Target square of a genuine double pawn push.
    pub en_passant: Option<Square>,
    /// Squares vacated, captured on, or removed; castling rights anchored on
    /// any of them are revoked.
    pub touched: Vec<Square>,
}

/// Canonical chess position: placement plus every FEN auxiliary field.
#[derive(Clone, PartialEq, Eq)]
pub struct Position {
    squares: [Option<(Piece, Color)>; 64],
    side_to_move: Color,
    castling: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl Default for Position {
    fn default() -> Self {
        let mut squares = [None; 64];
        let back = [
            Piece::Rook,
            Piece::Knight,
            Piece::Bishop,
            Piece::Queen,
            Piece::King,
            Piece::Bishop,
            Piece::Knight,
            Piece::Rook,
        ];
        for (file, piece) in back.iter().enumerate() {
            squares[file] = Some((*piece, Color::White));
            squares[8 + file] = Some((Piece::Pawn, Color::White));
            squares[48 + file] = Some((Piece::Pawn, Color::Black));
            squares[56 + file] = Some((*piece, Color::Black));
        }
        Position {
            squares,
            side_to_move: Color::White,
            castling: CastlingRights::all(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }
}

impl Position {
    /// Parse a FEN string. Placement, side, castling and en passant go through
    /// the engine's `BoardBuilder`; the move counters are ours.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 && fields.len() != 4 {
            return Err(FenError::FieldCount(fields.len()));
        }
        // the builder wraps overlong ranks and skips unknown castling letters
        if !placement_is_well_formed(fields[0]) {
            return Err(FenError::Placement(fields[0].to_string()));
        }
        if fields[1] != "w" && fields[1] != "b" {
            return Err(FenError::SideToMove(fields[1].to_string()));
        }
        let castling_ok = fields[2] == "-"
            || (!fields[2].is_empty() && fields[2].chars().all(|c| "KQkq".contains(c)));
        if !castling_ok {
            return Err(FenError::Castling(fields[2].to_string()));
        }

        let builder = BoardBuilder::from_str(&fields[..4].join(" "))
            .map_err(|_| FenError::Placement(fields[0].to_string()))?;
        let side_to_move = builder.get_side_to_move();

        let mut squares = [None; 64];
        for square in ALL_SQUARES.iter() {
            squares[square.to_index()] = builder[*square];
        }

        // the builder keeps a file only; rebuild the target square behind the pawn
        let en_passant = match fields[3] {
            "-" => None,
            text => match builder
                .get_en_passant()
                .and_then(|pawn| pawn.backward(!side_to_move))
            {
                Some(target) if target.to_string() == text => Some(target),
                _ => return Err(FenError::EnPassant(text.to_string())),
            },
        };

        let (halfmove_clock, fullmove_number) = if fields.len() == 6 {
            (
                fields[4]
                    .parse()
                    .map_err(|_| FenError::Counter(fields[4].to_string()))?,
                fields[5]
                    .parse()
                    .map_err(|_| FenError::Counter(fields[5].to_string()))?,
            )
        } else {
            (0, 1)
        };
        if fullmove_number == 0 {
            return Err(FenError::Counter("0".to_string()));
        }

        let position = Position {
            squares,
            side_to_move,
            castling: CastlingRights::from_engine(
                builder.get_castle_rights(Color::White),
                builder.get_castle_rights(Color::Black),
            ),
            en_passant,
            halfmove_clock,
            fullmove_number,
        };
        if let Some(square) = position.stranded_pawn() {
            return Err(FenError::Placement(format!("pawn on {}", square)));
        }
        Ok(position)
    }

    /// The placement and auxiliary fields as the rules engine's builder.
    pub fn to_builder(&self) -> BoardBuilder {
        let mut builder = BoardBuilder::new();
        for (square, piece, color) in self.occupied() {
            builder.piece(square, piece, color);
        }
        builder
            .side_to_move(self.side_to_move)
            .castle_rights(Color::White, self.castling.to_engine(Color::White))
            .castle_rights(Color::Black, self.castling.to_engine(Color::Black))
            .en_passant(self.en_passant.map(|sq| sq.get_file()));
        builder
    }

    pub fn to_fen(&self) -> String {
        // the builder prints the pawn's square for en passant and fixed
        // counters, so only its first three fields are used
        let shown = self.to_builder().to_string();
        let head: Vec<&str> = shown.split(' ').take(3).collect();
        format!(
            "{} {} {} {}",
            head.join(" "),
            self.en_passant
                .map(|sq| sq.to_string())
                .unwrap_or_else(|| "-".to_string()),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// A pawn standing on the first or last rank, which no move can produce.
    pub fn stranded_pawn(&self) -> Option<Square> {
        self.occupied()
            .find(|(sq, piece, color)| {
                *piece == Piece::Pawn && matches!(relative_rank(*sq, *color), 0 | 7)
            })
            .map(|(sq, _, _)| sq)
    }

    pub fn get(&self, square: Square) -> Option<(Piece, Color)> {
        self.squares[square.to_index()]
    }

    pub fn put(&mut self, square: Square, piece: Piece, color: Color) {
        self.squares[square.to_index()] = Some((piece, color));
    }

    pub fn remove(&mut self, square: Square) -> Option<(Piece, Color)> {
        self.squares[square.to_index()].take()
    }

    pub fn is_empty(&self, square: Square) -> bool {
        self.get(square).is_none()
    }

    pub fn color_on(&self, square: Square) -> Option<Color> {
        self.get(square).map(|(_, color)| color)
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        ALL_SQUARES
            .iter()
            .copied()
            .find(|sq| self.get(*sq) == Some((Piece::King, color)))
    }

    /// Every (square, piece) owned by `color`, in a1..h8 order.
    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        ALL_SQUARES.iter().filter_map(move |sq| match self.get(*sq) {
            Some((piece, c)) if c == color => Some((*sq, piece)),
            _ => None,
        })
    }

    /// Every occupied square with its piece and color, in a1..h8 order.
    pub fn occupied(&self) -> impl Iterator<Item = (Square, Piece, Color)> + '_ {
        ALL_SQUARES
            .iter()
            .filter_map(move |sq| self.get(*sq).map(|(piece, color)| (*sq, piece, color)))
    }

    /// Apply the shared FEN recipe after `mover` changed the placement.
    pub fn finish_turn(&mut self, mover: Color, recipe: &TurnRecipe) {
        for square in &recipe.touched {
            self.castling.revoke_square(*square);
        }
        self.drop_incoherent_castling();

        self.en_passant = recipe.en_passant;
        if recipe.capture || recipe.pawn_moved {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if mover == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = !mover;
    }

    /// Remove castling rights whose king or rook is no longer at home.
    pub fn drop_incoherent_castling(&mut self) {
        for color in [Color::White, Color::Black] {
            let king_home_ok = self.get(king_home(color)) == Some((Piece::King, color));
            for side in [CastleSide::King, CastleSide::Queen] {
                let rook_ok = self.get(rook_home(color, side)) == Some((Piece::Rook, color));
                if !(king_home_ok && rook_ok) {
                    self.castling.revoke(color, side);
                }
            }
        }
    }

    pub fn material_count(&self, color: Color, piece: Piece) -> usize {
        self.pieces_of(color).filter(|(_, p)| *p == piece).count()
    }

    /// Whether `square` has the same color as a1's complement (light square).
    pub fn is_light_square(square: Square) -> bool {
        (file_of(square) + rank_of(square)) % 2 == 1
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({})", self.to_fen())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fen())
    }
}
