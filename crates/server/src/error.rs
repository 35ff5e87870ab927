use chess_core::{Color, MoveError};
use serde::{Deserialize, Serialize};

use crate::protocol::MatchId;

/// Wire-level error code carried by an `error` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidCommandSyntax,
    Unauthorized,
    ColorTaken,
    NotYourTurn,
    IllegalMove,
    GameOver,
    UnknownMatch,
    NotJoined,
    NotAPlayer,
}

/// A command that could not be carried out. Always reported privately to the
/// issuing connection; never aborts a match.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Invalid command: {0}")]
    InvalidSyntax(String),

    #[error("Not authenticated")]
    Unauthorized,

    #[error("{0} is already taken in this match")]
    ColorTaken(Color),

    #[error("It is not your turn")]
    NotYourTurn,

    #[error("{0}")]
    IllegalMove(String),

    #[error("The game is over")]
    GameOver,

    #[error("Match {0} does not exist")]
    UnknownMatch(MatchId),

    #[error("You have not joined match {0}")]
    NotJoined(MatchId),

    #[error("Observers cannot {0}")]
    NotAPlayer(&'static str),
}

impl CommandError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CommandError::InvalidSyntax(_) => ErrorCode::InvalidCommandSyntax,
            CommandError::Unauthorized => ErrorCode::Unauthorized,
            CommandError::ColorTaken(_) => ErrorCode::ColorTaken,
            CommandError::NotYourTurn => ErrorCode::NotYourTurn,
            CommandError::IllegalMove(_) => ErrorCode::IllegalMove,
            CommandError::GameOver => ErrorCode::GameOver,
            CommandError::UnknownMatch(_) => ErrorCode::UnknownMatch,
            CommandError::NotJoined(_) => ErrorCode::NotJoined,
            CommandError::NotAPlayer(_) => ErrorCode::NotAPlayer,
        }
    }
}

impl From<MoveError> for CommandError {
    fn from(e: MoveError) -> Self {
        match e {
            MoveError::IllegalMove(mv) => CommandError::IllegalMove(format!("Illegal move: {mv}")),
            MoveError::NotYourTurn => CommandError::NotYourTurn,
            MoveError::GameOver => CommandError::GameOver,
        }
    }
}
