use thiserror::Error;

/// Why a move intent was refused.
///
/// No variant is ever returned after a partial mutation: the board is either
/// fully updated or left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    /// Wrong turn, wrong piece, exhausted usage, inactive advantage, or a
    /// `special` tag that does not match the mover's advantage.
    #[error("{0}")]
    Precondition(String),
    /// Illegal path, blocked destination, or off-board square.
    #[error("{0}")]
    Geometry(String),
    /// A raw placement mutation produced a position the rules engine refuses.
    #[error("{0}")]
    StateReconstruction(String),
    /// The client submitted against a stale view of the room.
    #[error("{0}")]
    ConcurrencyConflict(String),
}

impl MoveError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        MoveError::Precondition(msg.into())
    }

    pub fn geometry(msg: impl Into<String>) -> Self {
        MoveError::Geometry(msg.into())
    }

    pub fn reconstruction(msg: impl Into<String>) -> Self {
        MoveError::StateReconstruction(msg.into())
    }

    /// Stable label used on the wire next to the human readable message.
    pub fn kind(&self) -> &'static str {
        match self {
            MoveError::Precondition(_) => "precondition",
            MoveError::Geometry(_) => "geometry",
            MoveError::StateReconstruction(_) => "state_reconstruction",
            MoveError::ConcurrencyConflict(_) => "concurrency_conflict",
        }
    }
}

/// FEN strings that cannot be turned into a [`crate::board::Position`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("expected 6 FEN fields, found {0}")]
    FieldCount(usize),
    #[error("invalid piece placement: {0}")]
    Placement(String),
    #[error("invalid side to move: {0}")]
    SideToMove(String),
    #[error("invalid castling field: {0}")]
    Castling(String),
    #[error("invalid en passant square: {0}")]
    EnPassant(String),
    #[error("invalid move counter: {0}")]
    Counter(String),
}

/// Room lifecycle failures (joining, leaving, acting outside a seat).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("Room not found: {0}")]
    UnknownRoom(String),
    #[error("Room is full")]
    RoomFull,
    #[error("Already seated in this room")]
    AlreadySeated,
    #[error("Not seated in this room")]
    NotSeated,
    #[error("Game is already over")]
    GameOver,
    #[error("{0}")]
    Advantage(String),
}
