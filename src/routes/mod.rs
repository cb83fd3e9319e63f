use actix_web::{web, HttpResponse, Responder};
use log::error;
use serde::Serialize;

use crate::models::AppState;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub rooms: usize,
    pub sessions: usize,
}

/// HTTP handler for the index page
pub async fn index() -> impl Responder {
    HttpResponse::Ok().body("Advantage Chess server")
}

/// Live room and connection counts.
pub async fn stats(app_state: web::Data<AppState>) -> HttpResponse {
    let rooms = app_state.rooms.lock().map(|rooms| rooms.len());
    let sessions = app_state.sessions.lock().map(|sessions| sessions.len());
    match (rooms, sessions) {
        (Ok(rooms), Ok(sessions)) => HttpResponse::Ok().json(Stats { rooms, sessions }),
        _ => {
            error!("State lock poisoned while reading stats");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Configure the HTTP routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws").route(web::get().to(crate::websocket::ws_index)))
        .service(web::resource("/stats").route(web::get().to(stats)))
        .service(web::resource("/").route(web::get().to(index)));
}
