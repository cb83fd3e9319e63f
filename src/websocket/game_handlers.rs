use actix_web_actors::ws;
use log::{error, info, warn};

use crate::board::{color_to_string, parse_square};
use crate::error::RoomError;
use crate::models::messages::{AdvantageView, ClientMessage, MovePayload, ServerMessage};
use crate::models::room::{MoveOutcome, Room};
use crate::websocket::handler::ChessWebSocket;

impl ChessWebSocket {
    pub fn handle_message(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match msg {
            ClientMessage::Create => self.handle_create(ctx),
            ClientMessage::Join { room_id } => self.handle_join(room_id, ctx),
            ClientMessage::Move(payload) => self.handle_move(payload, ctx),
            ClientMessage::GetMoves { from } => self.handle_get_moves(from, ctx),
            ClientMessage::ToggleAdvantage => self.handle_toggle(ctx),
            ClientMessage::Resync => self.handle_resync(ctx),
            ClientMessage::Resign => self.handle_resign(ctx),
        }
    }

    /// Run `f` against this connection's room while holding the registry lock.
    fn with_room<T>(&self, f: impl FnOnce(&mut Room) -> T) -> Result<T, String> {
        let room_id = self
            .room_id
            .as_deref()
            .ok_or_else(|| "You are not in a room".to_string())?;
        let mut rooms = self
            .app_state
            .rooms
            .lock()
            .map_err(|_| "Internal server error".to_string())?;
        let room = rooms.get_mut(room_id).map_err(|e| e.to_string())?;
        Ok(f(room))
    }

    pub fn handle_create(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        if self.room_id.is_some() {
            self.reply(ctx, &ServerMessage::error(RoomError::AlreadySeated.to_string()));
            return;
        }
        let room_id = match self.app_state.rooms.lock() {
            Ok(mut rooms) => rooms.create(),
            Err(_) => {
                error!("Room registry lock poisoned");
                self.reply(ctx, &ServerMessage::error("Internal server error"));
                return;
            }
        };
        info!("Session {} created room {}", self.id, room_id);
        self.handle_join(Some(room_id.clone()), ctx);

        if self.room_id.is_none() {
            if let Ok(mut rooms) = self.app_state.rooms.lock() {
                if rooms.discard_if_empty(&room_id) {
                    info!("Dropped room {} after a failed join", room_id);
                }
            }
        }
    }

    /// Join `room_id`, or any room with a free seat, or a fresh room.
    pub fn handle_join(&mut self, room_id: Option<String>, ctx: &mut ws::WebsocketContext<Self>) {
        if self.room_id.is_some() {
            self.reply(ctx, &ServerMessage::error(RoomError::AlreadySeated.to_string()));
            return;
        }

        let joined = {
            let mut rooms = match self.app_state.rooms.lock() {
                Ok(rooms) => rooms,
                Err(_) => {
                    error!("Room registry lock poisoned");
                    self.reply(ctx, &ServerMessage::error("Internal server error"));
                    return;
                }
            };
            let room_id = match room_id {
                Some(id) => id,
                None => rooms.find_open().unwrap_or_else(|| rooms.create()),
            };
            let weights = self.app_state.config.rarity_weights;
            let joined = match (rooms.get_mut(&room_id), self.app_state.rng.lock()) {
                (Ok(room), Ok(mut rng)) => room
                    .join(&self.id, &mut *rng, &weights)
                    .map(|outcome| {
                        let others: Vec<String> =
                            room.sessions().into_iter().filter(|s| s != &self.id).collect();
                        (room_id.clone(), outcome, room.sync_payload(outcome.color), others)
                    })
                    .map_err(|e| e.to_string()),
                (Err(e), _) => Err(e.to_string()),
                (_, Err(_)) => Err("Internal server error".to_string()),
            };
            joined
        };

        match joined {
            Ok((room_id, outcome, sync, others)) => {
                self.room_id = Some(room_id.clone());
                self.color = Some(outcome.color);
                let color = color_to_string(outcome.color);
                self.reply(
                    ctx,
                    &ServerMessage::Joined {
                        room_id,
                        color: color.clone(),
                        advantage: AdvantageView::from(outcome.assignment),
                        sync,
                    },
                );
                self.send_to(&others, &ServerMessage::PlayerJoined { color });
            }
            Err(message) => {
                warn!("Session {} could not join: {}", self.id, message);
                self.reply(ctx, &ServerMessage::error(message));
            }
        }
    }

    pub fn handle_move(&mut self, payload: MovePayload, ctx: &mut ws::WebsocketContext<Self>) {
        let intent = match payload.to_intent() {
            Ok(intent) => intent,
            Err(e) => {
                info!("Session {}: move rejected ({}): {}", self.id, e.kind(), e);
                self.reply(ctx, &ServerMessage::rejected(&e, Some(payload)));
                return;
            }
        };

        let resolvers = &self.app_state.resolvers;
        let session = self.id.clone();
        let result = self.with_room(|room| {
            room.submit_move(&session, &intent, resolvers).map(|outcome| {
                let reveal = room.reveal();
                (outcome, room.sync_views(), room.sessions(), reveal)
            })
        });

        match result {
            Ok(Ok((MoveOutcome::Committed(done), views, sessions, reveal))) => {
                let done = *done;
                let special_effect = if done.effects.is_empty() {
                    None
                } else {
                    Some(done.effects.join("; "))
                };
                let messages: Vec<(String, ServerMessage)> = views
                    .into_iter()
                    .map(|(session, sync)| {
                        let message = ServerMessage::MoveMade {
                            descriptor: done.record.clone(),
                            sync,
                            special_effect: special_effect.clone(),
                        };
                        (session, message)
                    })
                    .collect();
                self.send_each(&messages);
                if let Some(outcome) = done.outcome {
                    self.send_to(&sessions, &ServerMessage::GameOver { result: outcome, reveal });
                }
            }
            Ok(Ok((MoveOutcome::Deflected(veto), _, _, _))) => {
                self.reply(
                    ctx,
                    &ServerMessage::MoveDeflected {
                        message: veto.message,
                        original: payload,
                    },
                );
            }
            Ok(Err(e)) => {
                info!("Session {}: move rejected ({}): {}", self.id, e.kind(), e);
                self.reply(ctx, &ServerMessage::rejected(&e, Some(payload)));
            }
            Err(message) => self.reply(ctx, &ServerMessage::error(message)),
        }
    }

    pub fn handle_get_moves(&mut self, from: String, ctx: &mut ws::WebsocketContext<Self>) {
        let square = match parse_square(&from) {
            Ok(square) => square,
            Err(e) => {
                self.reply(ctx, &ServerMessage::error(e.to_string()));
                return;
            }
        };
        let message = match self.with_room(|room| room.legal_destinations(square)) {
            Ok(Ok(moves)) => ServerMessage::AvailableMoves { from, moves },
            Ok(Err(e)) => ServerMessage::error(e.to_string()),
            Err(message) => ServerMessage::error(message),
        };
        self.reply(ctx, &message);
    }

    pub fn handle_toggle(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let session = self.id.clone();
        let result = self.with_room(|room| {
            room.toggle_advantage(&session)
                .map(|latch| (latch, room.sync_views()))
        });
        match result {
            Ok(Ok((latch, views))) => {
                info!("Session {} toggled its advantage: {:?}", self.id, latch);
                let messages: Vec<(String, ServerMessage)> = views
                    .into_iter()
                    .map(|(session, sync)| (session, ServerMessage::AdvantageToggled { sync }))
                    .collect();
                self.send_each(&messages);
            }
            Ok(Err(e)) => self.reply(ctx, &ServerMessage::error(e.to_string())),
            Err(message) => self.reply(ctx, &ServerMessage::error(message)),
        }
    }

    pub fn handle_resync(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let session = self.id.clone();
        let view = self.with_room(|room| {
            room.color_of(&session)
                .map(|color| room.sync_payload(color))
        });
        let message = match view {
            Ok(Some(sync)) => ServerMessage::Sync { sync },
            Ok(None) => ServerMessage::error(RoomError::NotSeated.to_string()),
            Err(message) => ServerMessage::error(message),
        };
        self.reply(ctx, &message);
    }

    pub fn handle_resign(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let session = self.id.clone();
        let result = self.with_room(|room| {
            room.resign(&session)
                .map(|outcome| (outcome, room.reveal(), room.sessions()))
        });
        match result {
            Ok(Ok((outcome, reveal, sessions))) => {
                self.send_to(&sessions, &ServerMessage::GameOver { result: outcome, reveal });
            }
            Ok(Err(e)) => self.reply(ctx, &ServerMessage::error(e.to_string())),
            Err(message) => self.reply(ctx, &ServerMessage::error(message)),
        }
    }
}
