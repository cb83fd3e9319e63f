#![allow(dead_code)]

use advantage_chess::error::MoveError;
use advantage_chess::game::catalog::{AdvantageId, RarityWeights};
use advantage_chess::game::resolver::{MoveIntent, ResolverRegistry};
use advantage_chess::models::room::{Committed, MoveOutcome, Room};
use chess::{Color, Square};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

pub const WHITE: &str = "white-session";
pub const BLACK: &str = "black-session";

/// Room at `fen` with both seats taken and fixed advantages.
pub fn room(fen: &str, white: AdvantageId, black: AdvantageId) -> Room {
    let mut room = Room::from_fen("test-room", fen, 12).unwrap();
    room.assign(Color::White, white.into());
    room.assign(Color::Black, black.into());
    let mut rng = StdRng::seed_from_u64(1);
    let weights = RarityWeights::default();
    room.join(WHITE, &mut rng, &weights).unwrap();
    room.join(BLACK, &mut rng, &weights).unwrap();
    room
}

fn session(color: Color) -> &'static str {
    match color {
        Color::White => WHITE,
        Color::Black => BLACK,
    }
}

pub fn submit(room: &mut Room, intent: MoveIntent) -> Result<MoveOutcome, MoveError> {
    let registry = ResolverRegistry::standard();
    room.submit_move(session(intent.color), &intent, &registry)
}

/// Submit and insist that the move committed.
pub fn play(room: &mut Room, intent: MoveIntent) -> Committed {
    match submit(room, intent) {
        Ok(MoveOutcome::Committed(done)) => *done,
        other => panic!("expected a committed move, got {:?}", other),
    }
}

pub fn standard(room: &mut Room, color: Color, from: Square, to: Square) -> Committed {
    play(room, MoveIntent::new(color, from, to))
}

pub fn special(
    room: &mut Room,
    id: AdvantageId,
    color: Color,
    from: Square,
    to: Square,
) -> Result<MoveOutcome, MoveError> {
    submit(room, MoveIntent::new(color, from, to).special(id))
}
