//! Move value and coordinate notation (`e2`, `e7e8q`).

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::board::{PieceKind, Position};
use crate::error::NotationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Move {
    pub start: Position,
    pub end: Position,
    /// Set only for a pawn move that lands on its last rank.
    #[serde(default)]
    pub promotion: Option<PieceKind>,
}

impl Move {
    pub const fn new(start: Position, end: Position) -> Self {
        Self {
            start,
            end,
            promotion: None,
        }
    }

    pub const fn promoting(start: Position, end: Position, kind: PieceKind) -> Self {
        Self {
            start,
            end,
            promotion: Some(kind),
        }
    }
}

fn move_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([a-hA-H][1-8])\s*([a-hA-H][1-8])\s*([qrbnQRBN])?$")
            .unwrap_or_else(|e| unreachable!("static regex: {e}"))
    })
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.in_bounds() {
            return write!(f, "({},{})", self.row, self.col);
        }
        let file = (b'a' + (self.col - 1) as u8) as char;
        write!(f, "{file}{}", self.row)
    }
}

impl FromStr for Position {
    type Err = NotationError;

    /// Parse a square such as `e4` (file letter first, case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.trim().as_bytes();
        if bytes.len() != 2 {
            return Err(NotationError::Square(s.to_string()));
        }
        let file = bytes[0].to_ascii_lowercase();
        let rank = bytes[1];
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return Err(NotationError::Square(s.to_string()));
        }
        Ok(Position::new((rank - b'0') as i8, (file - b'a') as i8 + 1))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.start, self.end)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.letter())?;
        }
        Ok(())
    }
}

impl FromStr for Move {
    type Err = NotationError;

    /// Parse coordinate notation: `e2e4`, `e7e8q`, `e2 e4`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = move_re()
            .captures(s.trim())
            .ok_or_else(|| NotationError::Move(s.to_string()))?;

        let start: Position = caps[1].parse()?;
        let end: Position = caps[2].parse()?;
        let promotion = caps
            .get(3)
            .and_then(|m| m.as_str().chars().next())
            .and_then(PieceKind::from_letter);

        Ok(Move {
            start,
            end,
            promotion,
        })
    }
}
