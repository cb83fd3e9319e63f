use actix::Addr;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::config::ServerConfig;
use crate::game::resolver::ResolverRegistry;
use crate::models::registry::RoomRegistry;
use crate::websocket::ChessWebSocket;

/// Application state shared between connections
///
/// Lock `rooms` before `sessions` whenever both are needed.
pub struct AppState {
    pub rooms: Mutex<RoomRegistry>,
    pub sessions: Mutex<HashMap<String, Addr<ChessWebSocket>>>,
    pub resolvers: ResolverRegistry,
    pub rng: Mutex<StdRng>,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        AppState {
            rooms: Mutex::new(RoomRegistry::new(config.history_depth)),
            sessions: Mutex::new(HashMap::new()),
            resolvers: ResolverRegistry::standard(),
            rng: Mutex::new(rng),
            config,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        AppState::new(ServerConfig::default())
    }
}
