pub mod app_state;
pub mod messages;
pub mod registry;
pub mod room;

// Re-export important types
pub use app_state::AppState;
pub use messages::*;
pub use registry::RoomRegistry;
pub use room::{Committed, JoinOutcome, MoveOutcome, Room, Seat};
