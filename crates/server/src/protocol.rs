//! Wire messages exchanged over the match WebSocket. JSON, tagged by `type`.

use chess_core::{Color, Game, Move};
use serde::{Deserialize, Serialize};

use crate::error::{CommandError, ErrorCode};

pub type MatchId = i64;

// ---- Client → Server ----

/// Every command carries the caller's token and the match it targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    JoinPlayer {
        auth_token: String,
        match_id: MatchId,
        color: Color,
    },
    JoinObserver {
        auth_token: String,
        match_id: MatchId,
    },
    MakeMove {
        auth_token: String,
        match_id: MatchId,
        #[serde(rename = "move")]
        mv: Move,
    },
    Resign {
        auth_token: String,
        match_id: MatchId,
    },
    Leave {
        auth_token: String,
        match_id: MatchId,
    },
}

impl ClientCommand {
    pub fn auth_token(&self) -> &str {
        match self {
            ClientCommand::JoinPlayer { auth_token, .. }
            | ClientCommand::JoinObserver { auth_token, .. }
            | ClientCommand::MakeMove { auth_token, .. }
            | ClientCommand::Resign { auth_token, .. }
            | ClientCommand::Leave { auth_token, .. } => auth_token,
        }
    }

    pub fn match_id(&self) -> MatchId {
        match self {
            ClientCommand::JoinPlayer { match_id, .. }
            | ClientCommand::JoinObserver { match_id, .. }
            | ClientCommand::MakeMove { match_id, .. }
            | ClientCommand::Resign { match_id, .. }
            | ClientCommand::Leave { match_id, .. } => *match_id,
        }
    }

    /// Strip the credentials once the caller has been identified.
    pub fn into_action(self) -> MatchAction {
        match self {
            ClientCommand::JoinPlayer { color, .. } => MatchAction::JoinPlayer(color),
            ClientCommand::JoinObserver { .. } => MatchAction::JoinObserver,
            ClientCommand::MakeMove { mv, .. } => MatchAction::MakeMove(mv),
            ClientCommand::Resign { .. } => MatchAction::Resign,
            ClientCommand::Leave { .. } => MatchAction::Leave,
        }
    }
}

/// An authenticated command as routed to a match session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchAction {
    JoinPlayer(Color),
    JoinObserver,
    MakeMove(Move),
    Resign,
    Leave,
}

// ---- Server → Client ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full game state: sent privately on join, broadcast after a move.
    State {
        match_id: MatchId,
        game: Game,
        white: Option<String>,
        black: Option<String>,
    },
    Notification {
        match_id: MatchId,
        message: String,
    },
    Error {
        match_id: Option<MatchId>,
        code: ErrorCode,
        message: String,
    },
}

impl ServerMessage {
    pub fn error(match_id: Option<MatchId>, err: &CommandError) -> Self {
        ServerMessage::Error {
            match_id,
            code: err.code(),
            message: err.to_string(),
        }
    }

    pub fn match_id(&self) -> Option<MatchId> {
        match self {
            ServerMessage::State { match_id, .. } | ServerMessage::Notification { match_id, .. } => {
                Some(*match_id)
            }
            ServerMessage::Error { match_id, .. } => *match_id,
        }
    }
}
