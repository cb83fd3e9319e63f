use std::collections::HashMap;
use uuid::Uuid;

use super::room::Room;
use crate::error::RoomError;

/// Every live room, keyed by id.
pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
    history_depth: usize,
}

impl RoomRegistry {
    pub fn new(history_depth: usize) -> Self {
        RoomRegistry {
            rooms: HashMap::new(),
            history_depth,
        }
    }

    /// Open a fresh room and return its id.
    pub fn create(&mut self) -> String {
        let id = Uuid::new_v4().to_string();
        self.rooms
            .insert(id.clone(), Room::new(id.clone(), self.history_depth));
        id
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut Room, RoomError> {
        self.rooms
            .get_mut(id)
            .ok_or_else(|| RoomError::UnknownRoom(id.to_string()))
    }

    /// Drop `id` if nobody is seated in it; true when it was dropped.
    pub fn discard_if_empty(&mut self, id: &str) -> bool {
        let empty = self.rooms.get(id).map(|room| room.is_empty()).unwrap_or(false);
        if empty {
            self.rooms.remove(id);
        }
        empty
    }

    /// A room with a free seat, if any, for quick pairing.
    pub fn find_open(&self) -> Option<String> {
        self.rooms
            .values()
            .find(|room| room.outcome().is_none() && room.sessions().len() == 1)
            .map(|room| room.id.clone())
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
