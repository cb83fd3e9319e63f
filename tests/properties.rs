mod common;

use advantage_chess::error::MoveError;
use advantage_chess::game::catalog::AdvantageId;
use advantage_chess::game::resolver::MoveIntent;
use advantage_chess::game::state::{AdvantageState, ToggleLatch};
use advantage_chess::game::utils::{EndReason, GameResult};
use advantage_chess::models::messages::ServerMessage;
use advantage_chess::models::room::{MoveOutcome, Room};
use chess::{Color, Piece, Square};

use common::{play, room, special, standard, submit, START, WHITE};

fn remaining(room: &Room, color: Color) -> Option<u8> {
    room.seat(color)
        .state
        .as_ref()
        .and_then(|state| state.remaining_uses())
}

#[test]
fn bounded_advantage_never_exceeds_its_limit() {
    let mut room = room(
        "4k3/7p/8/8/8/8/P7/4K3 w - - 0 1",
        AdvantageId::PawnSidestep,
        AdvantageId::PawnRush,
    );
    assert_eq!(remaining(&room, Color::White), Some(3));

    let steps = [(Square::A2, Square::B2), (Square::B2, Square::C2), (Square::C2, Square::D2)];
    let replies = [(Square::H7, Square::H6), (Square::H6, Square::H5), (Square::H5, Square::H4)];
    for (i, ((from, to), (reply_from, reply_to))) in steps.iter().zip(replies.iter()).enumerate() {
        special(&mut room, AdvantageId::PawnSidestep, Color::White, *from, *to).unwrap();
        assert_eq!(remaining(&room, Color::White), Some(2 - i as u8));
        standard(&mut room, Color::Black, *reply_from, *reply_to);
    }

    let fourth = special(&mut room, AdvantageId::PawnSidestep, Color::White, Square::D2, Square::C2);
    assert!(matches!(fourth, Err(MoveError::Precondition(_))));
    assert_eq!(room.position().get(Square::D2), Some((Piece::Pawn, Color::White)));
}

#[test]
fn once_per_game_advantage_fires_once() {
    let mut room = room(
        "4k3/8/8/p2p3n/8/8/8/3RK3 w - - 0 1",
        AdvantageId::DoubleStrike,
        AdvantageId::PawnRush,
    );
    play(
        &mut room,
        MoveIntent::new(Color::White, Square::D1, Square::D5)
            .special(AdvantageId::DoubleStrike)
            .second_leg(Square::D5, Square::H5),
    );
    assert_eq!(remaining(&room, Color::White), Some(0));
    standard(&mut room, Color::Black, Square::E8, Square::E7);

    let again = submit(
        &mut room,
        MoveIntent::new(Color::White, Square::H5, Square::A5)
            .special(AdvantageId::DoubleStrike)
            .second_leg(Square::A5, Square::A1),
    );
    assert!(matches!(again, Err(MoveError::Precondition(_))));

    // the plain capture is still available
    standard(&mut room, Color::White, Square::H5, Square::A5);
}

#[test]
fn rejected_moves_leave_the_room_untouched() {
    let mut room = room(START, AdvantageId::PawnSidestep, AdvantageId::GhostRooks);
    standard(&mut room, Color::White, Square::E2, Square::E4);

    let position = room.position().clone();
    let tracker = room.tracker().clone();
    let white = room.seat(Color::White).state.clone();
    let black = room.seat(Color::Black).state.clone();

    let attempts = [
        // not black's piece
        MoveIntent::new(Color::Black, Square::E4, Square::E5),
        // knights do not move like that
        MoveIntent::new(Color::Black, Square::G8, Square::G6),
        // advantage belongs to the other seat
        MoveIntent::new(Color::Black, Square::E7, Square::D7).special(AdvantageId::PawnSidestep),
        // blocked ghost rook landing on its own pawn
        MoveIntent::new(Color::Black, Square::A8, Square::A7).special(AdvantageId::GhostRooks),
        // white is not to move
        MoveIntent::new(Color::White, Square::D2, Square::D4),
    ];
    for intent in attempts {
        assert!(submit(&mut room, intent).is_err());
        assert_eq!(room.position(), &position);
        assert_eq!(room.tracker(), &tracker);
        assert_eq!(room.seat(Color::White).state, white);
        assert_eq!(room.seat(Color::Black).state, black);
        assert_eq!(room.history().len(), 1);
        assert_eq!(room.fen_history().len(), 2);
    }
}

#[test]
fn identities_survive_moves_and_promotion() {
    let mut room = room("4k3/P7/8/8/8/8/8/4K3 w - - 0 1", AdvantageId::PawnRush, AdvantageId::PawnRush);
    let pawn = room.tracker().uid_at(Square::A7).unwrap();

    play(
        &mut room,
        MoveIntent::new(Color::White, Square::A7, Square::A8).promotion(Piece::Queen),
    );
    assert_eq!(room.tracker().uid_at(Square::A8), Some(pawn));
    assert_eq!(room.tracker().record(pawn).map(|r| r.piece), Some(Piece::Queen));

    standard(&mut room, Color::Black, Square::E8, Square::E7);
    standard(&mut room, Color::White, Square::A8, Square::A3);
    assert_eq!(room.tracker().uid_at(Square::A3), Some(pawn));
}

#[test]
fn captured_identities_stay_dead() {
    let mut room = room(
        "4k3/8/8/3p4/8/8/8/3QK3 w - - 0 9",
        AdvantageId::PawnRush,
        AdvantageId::PawnRush,
    );
    let queen = room.tracker().uid_at(Square::D1).unwrap();
    let victim = room.tracker().uid_at(Square::D5).unwrap();

    standard(&mut room, Color::White, Square::D1, Square::D5);
    assert_eq!(room.tracker().uid_at(Square::D5), Some(queen));
    assert!(!room.tracker().record(victim).unwrap().alive);

    standard(&mut room, Color::Black, Square::E8, Square::E7);
    standard(&mut room, Color::White, Square::D5, Square::D1);
    assert!(!room.tracker().record(victim).unwrap().alive);
    assert_eq!(room.tracker().records().count(), 4);
    assert_eq!(room.tracker().live_count(), 3);
}

#[test]
fn armed_vengeance_destroys_the_capturer() {
    let mut room = room(
        "4k3/8/8/3q4/8/8/3R3P/4K3 b - - 0 1",
        AdvantageId::Vengeance,
        AdvantageId::PawnRush,
    );
    assert_eq!(room.toggle_advantage(WHITE), Ok(ToggleLatch::Active));

    let done = standard(&mut room, Color::Black, Square::D5, Square::D2);
    assert!(room.position().is_empty(Square::D2));
    assert!(done.effects.iter().any(|e| e.starts_with("Vengeance")));
    assert_eq!(room.position().side_to_move(), Color::White);
    assert_eq!(
        room.seat(Color::White).state,
        Some(AdvantageState::Vengeance {
            toggle: ToggleLatch::Consumed
        })
    );
    assert!(room.toggle_advantage(WHITE).is_err());
}

#[test]
fn disarmed_vengeance_does_nothing() {
    let mut room = room(
        "4k3/8/8/3q4/8/8/3R3P/4K3 b - - 0 1",
        AdvantageId::Vengeance,
        AdvantageId::PawnRush,
    );
    standard(&mut room, Color::Black, Square::D5, Square::D2);
    assert_eq!(room.position().get(Square::D2), Some((Piece::Queen, Color::Black)));
}

#[test]
fn frozen_piece_cannot_move_until_the_freeze_ends() {
    let mut room = room(START, AdvantageId::Freeze, AdvantageId::PawnRush);
    play(
        &mut room,
        MoveIntent::new(Color::White, Square::E2, Square::E4)
            .special(AdvantageId::Freeze)
            .target(Square::G8),
    );

    let blocked = submit(&mut room, MoveIntent::new(Color::Black, Square::G8, Square::F6)).unwrap();
    match blocked {
        MoveOutcome::Deflected(veto) => assert_eq!(veto.advantage, AdvantageId::Freeze),
        other => panic!("expected a deflection, got {:?}", other),
    }

    standard(&mut room, Color::Black, Square::A7, Square::A6);
    standard(&mut room, Color::White, Square::A2, Square::A3);
    standard(&mut room, Color::Black, Square::A6, Square::A5);
    standard(&mut room, Color::White, Square::B2, Square::B3);
    standard(&mut room, Color::Black, Square::G8, Square::F6);
}

#[test]
fn checkmate_ends_the_game_and_reveals_both_advantages() {
    let mut room = room(START, AdvantageId::KnightWard, AdvantageId::TimeRewind);
    standard(&mut room, Color::White, Square::F2, Square::F3);
    standard(&mut room, Color::Black, Square::E7, Square::E5);
    standard(&mut room, Color::White, Square::G2, Square::G4);
    let done = standard(&mut room, Color::Black, Square::D8, Square::H4);

    let outcome = done.outcome.unwrap();
    assert_eq!(outcome.result, GameResult::BlackWins);
    assert_eq!(outcome.reason, EndReason::Checkmate);
    assert!(done.record.notation.ends_with('#'));
    assert_eq!(room.sync_payload(Color::White).status, "black_wins");

    let late = submit(&mut room, MoveIntent::new(Color::White, Square::A2, Square::A3));
    assert!(matches!(late, Err(MoveError::Precondition(_))));

    let reveal = room.reveal();
    assert_eq!(reveal[0].advantage.as_ref().map(|a| a.id), Some(AdvantageId::KnightWard));
    assert_eq!(reveal[1].advantage.as_ref().map(|a| a.id), Some(AdvantageId::TimeRewind));
}

#[test]
fn sync_payload_has_the_wire_shape() {
    let mut room = room(START, AdvantageId::PawnSidestep, AdvantageId::ShieldWall);
    standard(&mut room, Color::White, Square::E2, Square::E4);

    let json = serde_json::to_value(ServerMessage::Sync {
        sync: room.sync_payload(Color::White),
    })
    .unwrap();
    assert_eq!(json["type"], "sync");
    let sync = &json["sync"];
    assert_eq!(
        sync["fen"],
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
    );
    assert_eq!(sync["ply"], 1);
    assert_eq!(sync["status"], "in_progress");

    let states = sync["advantage_states"].as_array().unwrap();
    assert_eq!(states.len(), 2);
    assert_eq!(states[0]["color"], "white");
    assert_eq!(states[0]["state"]["advantage"], "pawn_sidestep");
    assert_eq!(states[0]["hidden"], false);
    assert_eq!(states[1]["color"], "black");
    assert!(states[1]["state"].is_null());
    assert_eq!(states[1]["hidden"], true);
    assert!(!json.to_string().contains("shield_wall"));

    let pieces = sync["pieces"].as_array().unwrap();
    assert_eq!(pieces.len(), 32);
    let moved = pieces.iter().find(|p| p["square"] == "e4").unwrap();
    assert_eq!(moved["piece"], "p");
    assert_eq!(moved["color"], "white");
    assert_eq!(moved["alive"], true);
    assert!(moved["uid"].is_u64());
}

#[test]
fn each_player_sees_only_their_own_advantage() {
    let mut room = room(START, AdvantageId::GhostRooks, AdvantageId::TimeRewind);
    standard(&mut room, Color::White, Square::E2, Square::E4);

    for (session, sync) in room.sync_views() {
        let text = serde_json::to_string(&sync).unwrap();
        if session == WHITE {
            assert!(text.contains("ghost_rooks"));
            assert!(!text.contains("time_rewind"));
        } else {
            assert!(text.contains("time_rewind"));
            assert!(!text.contains("ghost_rooks"));
        }
    }

    room.resign(WHITE).unwrap();
    let text = serde_json::to_string(&room.sync_payload(Color::White)).unwrap();
    assert!(text.contains("ghost_rooks"));
    assert!(text.contains("time_rewind"));
}

#[test]
fn second_wind_raises_a_rook_when_the_queen_falls() {
    let mut room = room(
        "4k3/8/8/3q4/8/8/8/3QK3 w - - 0 1",
        AdvantageId::PawnRush,
        AdvantageId::SecondWind,
    );
    let done = standard(&mut room, Color::White, Square::D1, Square::D5);

    assert!(done.effects.iter().any(|e| e.starts_with("Second Wind")));
    assert_eq!(room.position().to_fen(), "3rk3/8/8/3Q4/8/8/8/4K3 b - - 0 1");
    assert_eq!(done.record.fen_after, room.position().to_fen());
    let rook = room.tracker().uid_at(Square::D8).unwrap();
    assert_eq!(room.tracker().record(rook).map(|r| r.piece), Some(Piece::Rook));
    assert_eq!(remaining(&room, Color::Black), Some(0));

    // the rook is a real piece for black's reply
    standard(&mut room, Color::Black, Square::D8, Square::D5);
    assert_eq!(room.position().get(Square::D5), Some((Piece::Rook, Color::Black)));
}

#[test]
fn knight_ward_deflects_a_knight_check() {
    let fen = "4k3/8/8/8/4N3/8/8/4K3 w - - 0 1";
    let mut room = room(fen, AdvantageId::PawnRush, AdvantageId::KnightWard);

    match submit(&mut room, MoveIntent::new(Color::White, Square::E4, Square::F6)).unwrap() {
        MoveOutcome::Deflected(veto) => {
            assert_eq!(veto.advantage, AdvantageId::KnightWard);
            assert_eq!(veto.holder, Color::Black);
        }
        other => panic!("expected a deflection, got {:?}", other),
    }
    assert_eq!(room.position().to_fen(), fen);
    assert_eq!(room.ply(), 0);
    assert_eq!(
        room.seat(Color::Black).state,
        Some(AdvantageState::KnightWard { deflections: 1 })
    );

    // a quiet knight move is fine
    standard(&mut room, Color::White, Square::E4, Square::C5);
}

#[test]
fn side_with_only_vetoed_moves_is_not_stalemated() {
    let mut room = room(
        "k7/2Q5/7p/8/8/8/8/4K3 w - - 0 1",
        AdvantageId::Freeze,
        AdvantageId::PawnRush,
    );
    play(
        &mut room,
        MoveIntent::new(Color::White, Square::E1, Square::E2)
            .special(AdvantageId::Freeze)
            .target(Square::H6),
    );

    // the king is boxed in and the only pawn is frozen
    let outcome = submit(&mut room, MoveIntent::new(Color::Black, Square::H6, Square::H5)).unwrap();
    assert!(matches!(outcome, MoveOutcome::Deflected(_)));
    assert_eq!(room.outcome(), None);
    assert_eq!(room.sync_payload(Color::Black).status, "in_progress");
}
