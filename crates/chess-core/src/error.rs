//! Rules engine error types

use thiserror::Error;

use crate::moves::Move;

/// Why `Game::make_move` refused a move. The game is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("illegal move: {0}")]
    IllegalMove(Move),

    #[error("not your turn")]
    NotYourTurn,

    #[error("game is already over")]
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotationError {
    #[error("invalid square: {0:?}")]
    Square(String),

    #[error("invalid move: {0:?}")]
    Move(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid FEN: {0}")]
pub struct FenError(pub String);
