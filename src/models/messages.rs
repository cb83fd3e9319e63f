use actix::Message;
use serde::{Deserialize, Serialize};

use crate::board::{parse_color, parse_promotion, parse_square};
use crate::error::MoveError;
use crate::game::catalog::{AdvantageAssignment, AdvantageId, Rarity};
use crate::game::resolver::{MoveIntent, MoveRecord};
use crate::game::state::AdvantageState;
use crate::game::utils::GameOutcome;

/// Message sent from client to server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Create,
    Join {
        #[serde(default)]
        room_id: Option<String>,
    },
    Move(MovePayload),
    GetMoves {
        from: String,
    },
    ToggleAdvantage,
    Resync,
    Resign,
}

/// Move submission as it travels on the wire.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MovePayload {
    pub from: String,
    pub to: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special: Option<AdvantageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_ply: Option<usize>,
}

impl MovePayload {
    pub fn to_intent(&self) -> Result<MoveIntent, MoveError> {
        let color = parse_color(&self.color)
            .ok_or_else(|| MoveError::precondition(format!("Unknown color: {}", self.color)))?;
        let optional = |text: &Option<String>| text.as_deref().map(parse_square).transpose();
        Ok(MoveIntent {
            color,
            from: parse_square(&self.from)?,
            to: parse_square(&self.to)?,
            promotion: self.promotion.as_deref().map(parse_promotion).transpose()?,
            second_from: optional(&self.second_from)?,
            second_to: optional(&self.second_to)?,
            target: optional(&self.target)?,
            special: self.special,
            expected_ply: self.expected_ply,
        })
    }
}

/// Public description of an advantage.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AdvantageView {
    pub id: AdvantageId,
    pub name: String,
    pub description: String,
    pub rarity: Rarity,
}

impl From<AdvantageAssignment> for AdvantageView {
    fn from(assignment: AdvantageAssignment) -> Self {
        let def = assignment.id.definition();
        AdvantageView {
            id: assignment.id,
            name: def.name.to_string(),
            description: def.description.to_string(),
            rarity: assignment.rarity,
        }
    }
}

/// One seat's advantage record as a given recipient may see it.
///
/// The opponent's record is withheld until the game is over.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AdvantageStateView {
    pub color: String,
    pub state: Option<AdvantageState>,
    pub hidden: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PieceView {
    pub uid: u32,
    pub piece: String,
    pub color: String,
    pub square: String,
    pub alive: bool,
}

/// Full room snapshot sent after every committed change.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SyncPayload {
    pub fen: String,
    pub ply: usize,
    pub status: String,
    pub advantage_states: Vec<AdvantageStateView>,
    pub pieces: Vec<PieceView>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RevealEntry {
    pub color: String,
    pub advantage: Option<AdvantageView>,
}

/// Message sent from server to client
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Joined {
        room_id: String,
        color: String,
        advantage: AdvantageView,
        sync: SyncPayload,
    },
    PlayerJoined {
        color: String,
    },
    MoveMade {
        descriptor: MoveRecord,
        sync: SyncPayload,
        #[serde(skip_serializing_if = "Option::is_none")]
        special_effect: Option<String>,
    },
    MoveRejected {
        message: String,
        kind: String,
        original: Option<MovePayload>,
    },
    MoveDeflected {
        message: String,
        original: MovePayload,
    },
    AdvantageToggled {
        sync: SyncPayload,
    },
    Sync {
        sync: SyncPayload,
    },
    AvailableMoves {
        from: String,
        moves: Vec<String>,
    },
    GameOver {
        result: GameOutcome,
        reveal: Vec<RevealEntry>,
    },
    PlayerLeft {
        color: String,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    pub fn rejected(err: &MoveError, original: Option<MovePayload>) -> Self {
        ServerMessage::MoveRejected {
            message: err.to_string(),
            kind: err.kind().to_string(),
            original,
        }
    }
}

/// Message type for WebSocket communication
#[derive(Message)]
#[rtype(result = "()")]
pub struct ChessWebSocketMessage(pub String);
