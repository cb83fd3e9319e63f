//! Stable piece identities that survive moves and promotion.

use chess::{Color, Piece, Square};
use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::board::Position;

pub type PieceUid = u32;

/// Minimum number of half-moves of history that must stay retrievable.
pub const MIN_HISTORY_DEPTH: usize = 6;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PieceRecord {
    pub uid: PieceUid,
    pub piece: Piece,
    pub color: Color,
    /// Current square, or the square it was last seen on once captured.
    pub square: Square,
    pub alive: bool,
}

/// One placement change, in the order it happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edit {
    Move { from: Square, to: Square },
    Swap { a: Square, b: Square },
    Capture { square: Square },
    Remove { square: Square },
    Promote { square: Square, piece: Piece },
    Spawn { square: Square, piece: Piece, color: Color },
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Snapshot {
    ply: usize,
    squares: HashMap<PieceUid, Square>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PieceTracker {
    records: BTreeMap<PieceUid, PieceRecord>,
    by_square: HashMap<Square, PieceUid>,
    next_uid: PieceUid,
    ply: usize,
    history: VecDeque<Snapshot>,
    history_depth: usize,
}

impl PieceTracker {
    /// Assign UIDs 1.. to every piece of `position` in a1..h8 order.
    pub fn from_position(position: &Position, history_depth: usize) -> Self {
        let mut tracker = PieceTracker {
            records: BTreeMap::new(),
            by_square: HashMap::new(),
            next_uid: 1,
            ply: 0,
            history: VecDeque::new(),
            history_depth: history_depth.max(MIN_HISTORY_DEPTH),
        };
        for (square, piece, color) in position.occupied() {
            tracker.spawn(square, piece, color);
        }
        tracker.push_snapshot();
        tracker
    }

    fn spawn(&mut self, square: Square, piece: Piece, color: Color) -> PieceUid {
        let uid = self.next_uid;
        self.next_uid += 1;
        self.records.insert(
            uid,
            PieceRecord {
                uid,
                piece,
                color,
                square,
                alive: true,
            },
        );
        self.by_square.insert(square, uid);
        uid
    }

    fn kill(&mut self, square: Square) {
        if let Some(uid) = self.by_square.remove(&square) {
            if let Some(record) = self.records.get_mut(&uid) {
                record.alive = false;
            }
        }
    }

    fn relocate(&mut self, uid: PieceUid, to: Square) {
        if let Some(record) = self.records.get_mut(&uid) {
            record.square = to;
        }
        self.by_square.insert(to, uid);
    }

    /// Replay committed edits onto the ledger.
    pub fn apply(&mut self, edits: &[Edit]) {
        for edit in edits {
            match *edit {
                Edit::Move { from, to } => {
                    if let Some(uid) = self.by_square.remove(&from) {
                        self.kill(to);
                        self.relocate(uid, to);
                    }
                }
                Edit::Swap { a, b } => {
                    let first = self.by_square.remove(&a);
                    let second = self.by_square.remove(&b);
                    if let Some(uid) = first {
                        self.relocate(uid, b);
                    }
                    if let Some(uid) = second {
                        self.relocate(uid, a);
                    }
                }
                Edit::Capture { square } | Edit::Remove { square } => self.kill(square),
                Edit::Promote { square, piece } => {
                    if let Some(record) = self
                        .by_square
                        .get(&square)
                        .and_then(|uid| self.records.get_mut(uid))
                    {
                        record.piece = piece;
                    }
                }
                Edit::Spawn {
                    square,
                    piece,
                    color,
                } => {
                    self.kill(square);
                    self.spawn(square, piece, color);
                }
            }
        }
    }

    /// Close the current half-move and keep a snapshot of the whole table.
    pub fn end_half_move(&mut self) {
        self.ply += 1;
        self.push_snapshot();
    }

    fn push_snapshot(&mut self) {
        let squares = self
            .records
            .values()
            .filter(|r| r.alive)
            .map(|r| (r.uid, r.square))
            .collect();
        self.history.push_back(Snapshot {
            ply: self.ply,
            squares,
        });
        // current snapshot plus `history_depth` earlier ones
        while self.history.len() > self.history_depth + 1 {
            self.history.pop_front();
        }
    }

    pub fn ply(&self) -> usize {
        self.ply
    }

    pub fn uid_at(&self, square: Square) -> Option<PieceUid> {
        self.by_square.get(&square).copied()
    }

    pub fn record(&self, uid: PieceUid) -> Option<&PieceRecord> {
        self.records.get(&uid)
    }

    pub fn records(&self) -> impl Iterator<Item = &PieceRecord> {
        self.records.values()
    }

    pub fn live_count(&self) -> usize {
        self.by_square.len()
    }

    /// Where `uid` stood `half_moves` half-moves ago, if it was alive then
    /// and that far back is still retained.
    pub fn square_ago(&self, uid: PieceUid, half_moves: usize) -> Option<Square> {
        let ply = self.ply.checked_sub(half_moves)?;
        self.history
            .iter()
            .find(|snap| snap.ply == ply)
            .and_then(|snap| snap.squares.get(&uid).copied())
    }

    /// Whether every live record matches `position` and vice versa.
    pub fn matches(&self, position: &Position) -> bool {
        let occupied = position.occupied().count();
        occupied == self.by_square.len()
            && position.occupied().all(|(square, piece, color)| {
                self.uid_at(square)
                    .and_then(|uid| self.records.get(&uid))
                    .map_or(false, |r| r.alive && r.piece == piece && r.color == color)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> PieceTracker {
        PieceTracker::from_position(&Position::default(), 12)
    }

    #[test]
    fn uids_follow_square_order() {
        let tracker = tracker();
        assert_eq!(tracker.uid_at(Square::A1), Some(1));
        assert_eq!(tracker.uid_at(Square::H8), Some(32));
        assert_eq!(tracker.live_count(), 32);
        assert!(tracker.matches(&Position::default()));
    }

    #[test]
    fn uid_survives_moves_and_promotion() {
        let mut tracker = tracker();
        let uid = tracker.uid_at(Square::E2).unwrap();
        tracker.apply(&[Edit::Move {
            from: Square::E2,
            to: Square::E4,
        }]);
        tracker.end_half_move();
        tracker.apply(&[
            Edit::Move {
                from: Square::E4,
                to: Square::E8,
            },
            Edit::Promote {
                square: Square::E8,
                piece: Piece::Queen,
            },
        ]);
        tracker.end_half_move();

        assert_eq!(tracker.uid_at(Square::E8), Some(uid));
        let record = tracker.record(uid).unwrap();
        assert_eq!(record.piece, Piece::Queen);
        assert!(record.alive);
    }

    #[test]
    fn captured_uid_is_dead_forever() {
        let mut tracker = tracker();
        let victim = tracker.uid_at(Square::D7).unwrap();
        tracker.apply(&[
            Edit::Capture { square: Square::D7 },
            Edit::Move {
                from: Square::D2,
                to: Square::D7,
            },
        ]);
        tracker.apply(&[Edit::Spawn {
            square: Square::D4,
            piece: Piece::Rook,
            color: Color::Black,
        }]);
        assert!(!tracker.record(victim).unwrap().alive);
        assert_eq!(tracker.uid_at(Square::D4), Some(33));
        assert_ne!(tracker.uid_at(Square::D7), Some(victim));
    }

    #[test]
    fn move_onto_occupied_square_kills_occupant() {
        let mut tracker = tracker();
        let victim = tracker.uid_at(Square::B8).unwrap();
        tracker.apply(&[Edit::Move {
            from: Square::B1,
            to: Square::B8,
        }]);
        assert!(!tracker.record(victim).unwrap().alive);
    }

    #[test]
    fn swap_exchanges_squares() {
        let mut tracker = tracker();
        let king = tracker.uid_at(Square::E1).unwrap();
        let queen = tracker.uid_at(Square::D1).unwrap();
        tracker.apply(&[Edit::Swap {
            a: Square::E1,
            b: Square::D1,
        }]);
        assert_eq!(tracker.uid_at(Square::D1), Some(king));
        assert_eq!(tracker.uid_at(Square::E1), Some(queen));
    }

    #[test]
    fn history_answers_six_half_moves_back() {
        let mut tracker = PieceTracker::from_position(&Position::default(), 0);
        let knight = tracker.uid_at(Square::G1).unwrap();
        let path = [
            (Square::G1, Square::F3),
            (Square::F3, Square::G5),
            (Square::G5, Square::H3),
            (Square::H3, Square::G1),
            (Square::G1, Square::F3),
            (Square::F3, Square::E5),
            (Square::E5, Square::D3),
        ];
        for (from, to) in path {
            tracker.apply(&[Edit::Move { from, to }]);
            tracker.end_half_move();
        }
        assert_eq!(tracker.ply(), 7);
        assert_eq!(tracker.square_ago(knight, 6), Some(Square::F3));
        assert_eq!(tracker.square_ago(knight, 0), Some(Square::D3));
        // depth is clamped to the minimum, so 7 back is gone
        assert_eq!(tracker.square_ago(knight, 7), None);
    }
}
