//! Chess rules engine: board model, pseudo-legal move generation, legal move
//! filtering and game status, plus FEN and coordinate notation.

pub mod board;
pub mod error;
pub mod fen;
pub mod game;
pub mod movegen;
pub mod moves;

pub use board::{Board, Color, Piece, PieceKind, Position};
pub use error::{FenError, MoveError, NotationError};
pub use game::{CastlingRights, Game, GameStatus, MoveRecord};
pub use moves::Move;
