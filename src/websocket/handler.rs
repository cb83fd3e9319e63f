use actix::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use chess::Color;
use log::{error, info, warn};
use uuid::Uuid;

use crate::board::color_to_string;
use crate::models::{AppState, ChessWebSocketMessage, ClientMessage, ServerMessage};

/// WebSocket handler for advantage chess rooms
pub struct ChessWebSocket {
    pub id: String,
    pub app_state: web::Data<AppState>,
    pub room_id: Option<String>,
    pub color: Option<Color>,
}

impl ChessWebSocket {
    pub fn new(app_state: web::Data<AppState>) -> Self {
        ChessWebSocket {
            id: Uuid::new_v4().to_string(),
            app_state,
            room_id: None,
            color: None,
        }
    }

    /// Vacate the current seat, tell the opponent, and drop the room once empty.
    pub fn leave_room(&mut self) {
        let room_id = match self.room_id.take() {
            Some(id) => id,
            None => return,
        };
        self.color = None;

        let (left, remaining) = {
            let mut rooms = match self.app_state.rooms.lock() {
                Ok(rooms) => rooms,
                Err(_) => {
                    error!("Room registry lock poisoned");
                    return;
                }
            };
            let (left, remaining) = match rooms.get_mut(&room_id) {
                Ok(room) => (room.leave(&self.id), room.sessions()),
                Err(e) => {
                    warn!("{}", e);
                    return;
                }
            };
            if rooms.discard_if_empty(&room_id) {
                info!("No more players in room {}. Cleaning up.", room_id);
            }
            (left, remaining)
        };

        if let Some(color) = left {
            self.send_to(
                &remaining,
                &ServerMessage::PlayerLeft {
                    color: color_to_string(color),
                },
            );
        }
    }

    /// Deliver `message` to every listed session.
    pub fn send_to(&self, session_ids: &[String], message: &ServerMessage) {
        let message_str = match serde_json::to_string(message) {
            Ok(s) => s,
            Err(e) => {
                error!("Error serializing message: {}", e);
                return;
            }
        };
        let sessions = match self.app_state.sessions.lock() {
            Ok(sessions) => sessions,
            Err(_) => {
                error!("Session table lock poisoned");
                return;
            }
        };
        for session_id in session_ids {
            match sessions.get(session_id) {
                Some(addr) => addr.do_send(ChessWebSocketMessage(message_str.clone())),
                None => warn!("Session not found for connection ID: {}", session_id),
            }
        }
    }

    /// Deliver a separately built message to each session.
    pub fn send_each(&self, messages: &[(String, ServerMessage)]) {
        for (session_id, message) in messages {
            self.send_to(std::slice::from_ref(session_id), message);
        }
    }

    /// Reply to this connection only.
    pub fn reply(&self, ctx: &mut ws::WebsocketContext<Self>, message: &ServerMessage) {
        match serde_json::to_string(message) {
            Ok(text) => ctx.text(text),
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                ctx.text("{\"type\":\"error\",\"message\":\"Internal server error\"}");
            }
        }
    }
}

impl Actor for ChessWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let addr = ctx.address();
        let total_sessions = match self.app_state.sessions.lock() {
            Ok(mut sessions) => {
                sessions.insert(self.id.clone(), addr);
                sessions.len()
            }
            Err(_) => {
                error!("Session table lock poisoned");
                ctx.stop();
                return;
            }
        };
        info!("WebSocket connection started: {}", self.id);
        info!("Total active sessions: {}", total_sessions);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        self.leave_room();

        if let Ok(mut sessions) = self.app_state.sessions.lock() {
            sessions.remove(&self.id);
            info!("WebSocket connection closed: {}", self.id);
            info!("Total active sessions: {}", sessions.len());
        }
        Running::Stop
    }
}

impl Handler<ChessWebSocketMessage> for ChessWebSocket {
    type Result = ();

    fn handle(&mut self, msg: ChessWebSocketMessage, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChessWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Text(text)) => {
                match serde_json::from_str::<ClientMessage>(text.as_ref()) {
                    Ok(client_msg) => {
                        info!("Session {}: {:?}", self.id, client_msg);
                        self.handle_message(client_msg, ctx);
                    }
                    Err(e) => {
                        warn!("Error parsing client message: {}", e);
                        self.reply(
                            ctx,
                            &ServerMessage::error(format!("Invalid message format: {}", e)),
                        );
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
                self.reply(ctx, &ServerMessage::error("Binary messages are not supported"));
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            _ => {
                ctx.stop();
            }
        }
    }
}

/// WebSocket connection handler
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let ws = ChessWebSocket::new(app_state.clone());
    info!("New WebSocket connection: {}", ws.id);
    ws::start(ws, &req, stream)
}
