//! One match: two seats, one board, and everything needed to replay a move
//! atomically.

use chess::{Color, Square};
use log::{debug, info, warn};
use rand::Rng;

use super::messages::{AdvantageStateView, AdvantageView, PieceView, RevealEntry, SyncPayload};
use crate::board::rules::legal_destinations;
use crate::board::{color_to_string, piece_letter, Position};
use crate::error::{FenError, MoveError, RoomError};
use crate::game::catalog::{assign_advantage, AdvantageAssignment, RarityWeights};
use crate::game::hooks::{self, MoveContext, Veto};
use crate::game::identity::PieceTracker;
use crate::game::resolver::{MoveIntent, MoveRecord, ResolverRegistry};
use crate::game::state::{AdvantageState, ToggleLatch};
use crate::game::utils::{detect_outcome, get_game_status, EndReason, GameOutcome, GameResult};

#[derive(Clone, Debug, Default)]
pub struct Seat {
    pub session: Option<String>,
    /// Dealt on first occupation and kept for whoever sits here next.
    pub assignment: Option<AdvantageAssignment>,
    pub state: Option<AdvantageState>,
}

impl Seat {
    fn held(&self) -> Option<(&AdvantageAssignment, &AdvantageState)> {
        match (&self.assignment, &self.state) {
            (Some(assignment), Some(state)) => Some((assignment, state)),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoinOutcome {
    pub color: Color,
    pub assignment: AdvantageAssignment,
    /// The seat had been occupied before and its advantage was kept.
    pub inherited: bool,
}

#[derive(Clone, Debug)]
pub struct Committed {
    pub record: MoveRecord,
    pub effects: Vec<String>,
    pub outcome: Option<GameOutcome>,
}

#[derive(Clone, Debug)]
pub enum MoveOutcome {
    Committed(Box<Committed>),
    Deflected(Veto),
}

#[derive(Clone, Debug)]
pub struct Room {
    pub id: String,
    white: Seat,
    black: Seat,
    position: Position,
    tracker: PieceTracker,
    history: Vec<MoveRecord>,
    fen_history: Vec<String>,
    outcome: Option<GameOutcome>,
}

impl Room {
    pub fn new(id: impl Into<String>, history_depth: usize) -> Self {
        Room::with_position(id, Position::default(), history_depth)
    }

    /// Room starting from an arbitrary position.
    pub fn from_fen(id: impl Into<String>, fen: &str, history_depth: usize) -> Result<Self, FenError> {
        Ok(Room::with_position(id, Position::from_fen(fen)?, history_depth))
    }

    fn with_position(id: impl Into<String>, position: Position, history_depth: usize) -> Self {
        Room {
            id: id.into(),
            white: Seat::default(),
            black: Seat::default(),
            tracker: PieceTracker::from_position(&position, history_depth),
            fen_history: vec![position.to_fen()],
            position,
            history: Vec::new(),
            outcome: None,
        }
    }

    pub fn seat(&self, color: Color) -> &Seat {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    fn seat_mut(&mut self, color: Color) -> &mut Seat {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    /// Give a seat a fixed advantage instead of a random one.
    pub fn assign(&mut self, color: Color, assignment: AdvantageAssignment) {
        let seat = self.seat_mut(color);
        seat.assignment = Some(assignment);
        seat.state = Some(AdvantageState::initial(assignment.id));
    }

    /// Seat `session` on the first free seat, white first.
    pub fn join<R: Rng>(
        &mut self,
        session: &str,
        rng: &mut R,
        weights: &RarityWeights,
    ) -> Result<JoinOutcome, RoomError> {
        if self.color_of(session).is_some() {
            return Err(RoomError::AlreadySeated);
        }
        let color = [Color::White, Color::Black]
            .into_iter()
            .find(|c| self.seat(*c).session.is_none())
            .ok_or(RoomError::RoomFull)?;

        let inherited = self.seat(color).assignment.is_some();
        if !inherited {
            let assignment = assign_advantage(rng, weights);
            self.assign(color, assignment);
        }
        let seat = self.seat_mut(color);
        seat.session = Some(session.to_string());
        let assignment = seat.assignment.ok_or(RoomError::NotSeated)?;
        info!(
            "Session {} sits {} in room {} with {}",
            session,
            color_to_string(color),
            self.id,
            assignment.id.as_str()
        );
        Ok(JoinOutcome {
            color,
            assignment,
            inherited,
        })
    }

    /// Vacate the seat held by `session`.
    pub fn leave(&mut self, session: &str) -> Option<Color> {
        let color = self.color_of(session)?;
        self.seat_mut(color).session = None;
        info!("Session {} left room {}", session, self.id);
        Some(color)
    }

    pub fn color_of(&self, session: &str) -> Option<Color> {
        [Color::White, Color::Black]
            .into_iter()
            .find(|c| self.seat(*c).session.as_deref() == Some(session))
    }

    pub fn sessions(&self) -> Vec<String> {
        [&self.white, &self.black]
            .iter()
            .filter_map(|seat| seat.session.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.white.session.is_none() && self.black.session.is_none()
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn tracker(&self) -> &PieceTracker {
        &self.tracker
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn fen_history(&self) -> &[String] {
        &self.fen_history
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    /// Committed half-moves so far.
    pub fn ply(&self) -> usize {
        self.tracker.ply()
    }

    /// Validate, resolve, vet and commit one move for `session`.
    ///
    /// On any error the room is left exactly as it was. End-of-game detection
    /// sees only standard legality, so a side whose every legal move would be
    /// deflected is still in progress and has to wait the veto out or resign.
    pub fn submit_move(
        &mut self,
        session: &str,
        intent: &MoveIntent,
        registry: &ResolverRegistry,
    ) -> Result<MoveOutcome, MoveError> {
        let color = self
            .color_of(session)
            .ok_or_else(|| MoveError::precondition("You are not seated in this room"))?;
        if self.outcome.is_some() {
            return Err(MoveError::precondition("The game is over"));
        }
        if intent.color != color {
            return Err(MoveError::precondition(format!(
                "You are playing {}",
                color_to_string(color)
            )));
        }
        if let Some(expected) = intent.expected_ply {
            if expected != self.ply() {
                return Err(MoveError::ConcurrencyConflict(format!(
                    "Move was made against ply {} but the game is at ply {}",
                    expected,
                    self.ply()
                )));
            }
        }

        let resolution =
            registry.resolve(&self.position, &self.tracker, self.seat(color).held(), intent)?;
        let opponent = !color;

        let mut tracker = self.tracker.clone();
        tracker.apply(&resolution.finished.edits);

        let (veto, triggered) = {
            let ctx = MoveContext {
                mover: color,
                before: &self.position,
                after: &resolution.finished.after,
                captured: &resolution.finished.captured,
                tracker_before: &self.tracker,
                tracker_after: &tracker,
                moved_uid: self.tracker.uid_at(intent.from),
            };
            let held = self.seat(opponent).state.as_ref();
            let veto = held.and_then(|state| hooks::veto(&ctx, opponent, state));
            let triggered = match veto {
                Some(_) => None,
                None => held.and_then(|state| {
                    hooks::trigger(&ctx, &resolution.finished.after, opponent, state)
                }),
            };
            (veto, triggered)
        };

        if let Some(veto) = veto {
            if let Some(state) = self.seat_mut(opponent).state.as_mut() {
                state.record_deflection();
            }
            info!(
                "Room {}: {} move {}{} deflected by {}",
                self.id,
                color_to_string(color),
                intent.from,
                intent.to,
                veto.advantage.as_str()
            );
            return Ok(MoveOutcome::Deflected(veto));
        }

        let mut record = MoveRecord::new(self.ply() + 1, intent, &resolution);
        let mut effects: Vec<String> = resolution.effect.into_iter().collect();
        let mut position = resolution.finished.after;
        let mut opponent_state = None;
        if let Some(fired) = triggered {
            tracker.apply(&fired.finished.edits);
            position = fired.finished.after;
            record.fen_after = position.to_fen();
            effects.push(fired.effect);
            opponent_state = Some(fired.state);
        }
        tracker.end_half_move();
        if !tracker.matches(&position) {
            warn!("Room {}: identity table diverged from {}", self.id, position);
            return Err(MoveError::reconstruction("Piece identities out of sync"));
        }
        let outcome = detect_outcome(&position)?;

        // commit
        if let Some(state) = resolution.state {
            self.seat_mut(color).state = Some(state);
        }
        if let Some(state) = opponent_state {
            self.seat_mut(opponent).state = Some(state);
        }
        self.position = position;
        self.tracker = tracker;
        for holder in [Color::White, Color::Black] {
            let seat = match holder {
                Color::White => &mut self.white,
                Color::Black => &mut self.black,
            };
            if let Some(state) = seat.state.as_mut() {
                if hooks::advance_countdowns(state, holder, color, &self.tracker) {
                    debug!("Room {}: {} freeze expired", self.id, color_to_string(holder));
                }
            }
        }
        self.fen_history.push(self.position.to_fen());
        self.history.push(record.clone());
        self.outcome = outcome;

        info!("Room {}: {}", self.id, record.notation);
        Ok(MoveOutcome::Committed(Box::new(Committed {
            record,
            effects,
            outcome,
        })))
    }

    /// Arm or disarm a toggleable advantage.
    pub fn toggle_advantage(&mut self, session: &str) -> Result<ToggleLatch, RoomError> {
        let color = self.color_of(session).ok_or(RoomError::NotSeated)?;
        if self.outcome.is_some() {
            return Err(RoomError::GameOver);
        }
        match self.seat_mut(color).state.as_mut() {
            Some(AdvantageState::Vengeance { toggle }) => toggle
                .toggle()
                .map_err(|e| RoomError::Advantage(e.to_string())),
            _ => Err(RoomError::Advantage(
                "Your advantage cannot be toggled".to_string(),
            )),
        }
    }

    pub fn resign(&mut self, session: &str) -> Result<GameOutcome, RoomError> {
        let color = self.color_of(session).ok_or(RoomError::NotSeated)?;
        if self.outcome.is_some() {
            return Err(RoomError::GameOver);
        }
        let outcome = GameOutcome {
            result: GameResult::win_for(!color),
            reason: EndReason::Resignation,
        };
        self.outcome = Some(outcome);
        info!("Room {}: {} resigned", self.id, color_to_string(color));
        Ok(outcome)
    }

    /// Standard legal destinations from `from`.
    pub fn legal_destinations(&self, from: Square) -> Result<Vec<String>, MoveError> {
        Ok(legal_destinations(&self.position, from)?
            .into_iter()
            .map(|sq| sq.to_string())
            .collect())
    }

    /// Room snapshot for the player seated as `viewer`.
    pub fn sync_payload(&self, viewer: Color) -> SyncPayload {
        SyncPayload {
            fen: self.position.to_fen(),
            ply: self.ply(),
            status: get_game_status(&self.position, self.outcome),
            advantage_states: [Color::White, Color::Black]
                .into_iter()
                .map(|color| {
                    let hidden = color != viewer && self.outcome.is_none();
                    AdvantageStateView {
                        color: color_to_string(color),
                        state: if hidden {
                            None
                        } else {
                            self.seat(color).state.clone()
                        },
                        hidden,
                    }
                })
                .collect(),
            pieces: self
                .tracker
                .records()
                .map(|r| PieceView {
                    uid: r.uid,
                    piece: piece_letter(r.piece).to_string(),
                    color: color_to_string(r.color),
                    square: r.square.to_string(),
                    alive: r.alive,
                })
                .collect(),
        }
    }

    /// One snapshot per seated session, each from that seat's side.
    pub fn sync_views(&self) -> Vec<(String, SyncPayload)> {
        [Color::White, Color::Black]
            .into_iter()
            .filter_map(|color| {
                self.seat(color)
                    .session
                    .clone()
                    .map(|session| (session, self.sync_payload(color)))
            })
            .collect()
    }

    /// Both assignments, for the end of the game.
    pub fn reveal(&self) -> Vec<RevealEntry> {
        [Color::White, Color::Black]
            .into_iter()
            .map(|color| RevealEntry {
                color: color_to_string(color),
                advantage: self.seat(color).assignment.map(AdvantageView::from),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::AdvantageId;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seated(fen: &str, white: AdvantageId, black: AdvantageId) -> Room {
        let mut room = Room::from_fen("r1", fen, 12).unwrap();
        room.assign(Color::White, white.into());
        room.assign(Color::Black, black.into());
        let mut rng = StdRng::seed_from_u64(3);
        room.join("w", &mut rng, &RarityWeights::default()).unwrap();
        room.join("b", &mut rng, &RarityWeights::default()).unwrap();
        room
    }

    #[test]
    fn join_fills_white_then_black() {
        let mut room = Room::new("r1", 12);
        let mut rng = StdRng::seed_from_u64(9);
        let weights = RarityWeights::default();
        assert_eq!(room.join("a", &mut rng, &weights).unwrap().color, Color::White);
        assert_eq!(room.join("b", &mut rng, &weights).unwrap().color, Color::Black);
        assert_eq!(room.join("c", &mut rng, &weights), Err(RoomError::RoomFull));
        assert_eq!(room.join("a", &mut rng, &weights), Err(RoomError::AlreadySeated));
    }

    #[test]
    fn vacated_seat_keeps_its_advantage() {
        let mut room = Room::new("r1", 12);
        let mut rng = StdRng::seed_from_u64(9);
        let weights = RarityWeights::default();
        let first = room.join("a", &mut rng, &weights).unwrap();
        room.join("b", &mut rng, &weights).unwrap();
        assert_eq!(room.leave("a"), Some(Color::White));
        let again = room.join("c", &mut rng, &weights).unwrap();
        assert_eq!(again.color, Color::White);
        assert!(again.inherited);
        assert_eq!(again.assignment, first.assignment);
    }

    #[test]
    fn wrong_seat_and_stale_ply_are_refused() {
        let mut room = seated(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            AdvantageId::PawnRush,
            AdvantageId::PawnRush,
        );
        let registry = ResolverRegistry::standard();
        let intent = MoveIntent::new(Color::White, Square::E2, Square::E4);
        assert!(matches!(
            room.submit_move("b", &intent, &registry),
            Err(MoveError::Precondition(_))
        ));

        let mut stale = intent.clone();
        stale.expected_ply = Some(3);
        assert!(matches!(
            room.submit_move("w", &stale, &registry),
            Err(MoveError::ConcurrencyConflict(_))
        ));
        assert_eq!(room.ply(), 0);
    }

    #[test]
    fn committed_move_updates_everything() {
        let mut room = seated(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            AdvantageId::PawnRush,
            AdvantageId::PawnRush,
        );
        let registry = ResolverRegistry::standard();
        let intent = MoveIntent::new(Color::White, Square::G1, Square::F3);
        match room.submit_move("w", &intent, &registry).unwrap() {
            MoveOutcome::Committed(done) => {
                assert_eq!(done.record.notation, "Ng1-f3");
                assert_eq!(done.record.ply, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(room.ply(), 1);
        assert_eq!(room.history().len(), 1);
        assert_eq!(room.fen_history().len(), 2);
        assert_eq!(room.tracker().uid_at(Square::F3), Some(7));
        assert_eq!(room.position().side_to_move(), Color::Black);
    }

    #[test]
    fn toggle_only_for_vengeance() {
        let mut room = seated(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            AdvantageId::Vengeance,
            AdvantageId::PawnRush,
        );
        assert_eq!(room.toggle_advantage("w"), Ok(ToggleLatch::Active));
        assert!(matches!(room.toggle_advantage("b"), Err(RoomError::Advantage(_))));
        assert_eq!(room.toggle_advantage("x"), Err(RoomError::NotSeated));
    }

    #[test]
    fn resignation_ends_the_game() {
        let mut room = seated(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            AdvantageId::PawnRush,
            AdvantageId::GhostRooks,
        );
        let outcome = room.resign("b").unwrap();
        assert_eq!(outcome.result, GameResult::WhiteWins);
        assert_eq!(room.resign("w"), Err(RoomError::GameOver));
        let registry = ResolverRegistry::standard();
        let intent = MoveIntent::new(Color::White, Square::E2, Square::E4);
        assert!(matches!(
            room.submit_move("w", &intent, &registry),
            Err(MoveError::Precondition(_))
        ));
        let reveal = room.reveal();
        assert_eq!(reveal[1].advantage.as_ref().map(|a| a.id), Some(AdvantageId::GhostRooks));
    }

    #[test]
    fn sync_payload_lists_every_piece() {
        let room = Room::new("r1", 12);
        let sync = room.sync_payload(Color::White);
        assert_eq!(sync.pieces.len(), 32);
        assert_eq!(sync.advantage_states.len(), 2);
        assert_eq!(sync.ply, 0);
        assert_eq!(sync.status, "in_progress");
    }

    #[test]
    fn opponent_record_is_withheld_until_game_over() {
        let mut room = seated(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            AdvantageId::PawnSidestep,
            AdvantageId::ShieldWall,
        );
        let white_view = room.sync_payload(Color::White);
        assert!(!white_view.advantage_states[0].hidden);
        assert!(white_view.advantage_states[0].state.is_some());
        assert!(white_view.advantage_states[1].hidden);
        assert_eq!(white_view.advantage_states[1].state, None);

        let views = room.sync_views();
        assert_eq!(views.len(), 2);
        assert_eq!(views[1].0, "b");
        assert!(views[1].1.advantage_states[0].hidden);
        assert_eq!(
            views[1].1.advantage_states[1].state,
            Some(AdvantageState::ShieldWall { deflections: 0 })
        );

        room.resign("w").unwrap();
        let white_view = room.sync_payload(Color::White);
        assert!(!white_view.advantage_states[1].hidden);
        assert_eq!(
            white_view.advantage_states[1].state,
            Some(AdvantageState::ShieldWall { deflections: 0 })
        );
    }
}
