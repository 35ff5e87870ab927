//! Board model: colours, pieces, squares and the 8x8 grid.
//!
//! Rows and columns are 1-based. Row 1 is White's back rank, column 1 is the
//! a-file.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Color {
    White,
    Black,
}

impl Color {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row delta of a forward pawn step.
    pub(crate) fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// Row holding this colour's king and rooks at the start.
    pub(crate) fn back_rank(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => 8,
        }
    }

    pub(crate) fn pawn_rank(self) -> i8 {
        match self {
            Color::White => 2,
            Color::Black => 7,
        }
    }

    pub(crate) fn promotion_rank(self) -> i8 {
        match self {
            Color::White => 8,
            Color::Black => 1,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::White => f.write_str("white"),
            Color::Black => f.write_str("black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PieceKind {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceKind {
    /// Kinds a pawn may promote to.
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    pub fn is_promotion_target(self) -> bool {
        Self::PROMOTIONS.contains(&self)
    }

    /// Lowercase letter used by FEN and coordinate notation.
    pub fn letter(self) -> char {
        match self {
            PieceKind::King => 'k',
            PieceKind::Queen => 'q',
            PieceKind::Rook => 'r',
            PieceKind::Bishop => 'b',
            PieceKind::Knight => 'n',
            PieceKind::Pawn => 'p',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'k' => Some(PieceKind::King),
            'q' => Some(PieceKind::Queen),
            'r' => Some(PieceKind::Rook),
            'b' => Some(PieceKind::Bishop),
            'n' => Some(PieceKind::Knight),
            'p' => Some(PieceKind::Pawn),
            _ => None,
        }
    }
}

impl std::fmt::Display for PieceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PieceKind::King => "king",
            PieceKind::Queen => "queen",
            PieceKind::Rook => "rook",
            PieceKind::Bishop => "bishop",
            PieceKind::Knight => "knight",
            PieceKind::Pawn => "pawn",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    /// FEN letter: uppercase for White, lowercase for Black.
    pub fn fen_char(self) -> char {
        let c = self.kind.letter();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    pub fn from_fen_char(c: char) -> Option<Self> {
        let kind = PieceKind::from_letter(c)?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Self { color, kind })
    }
}

/// A square on the board. May hold out-of-range coordinates while a move is
/// being generated; check [`Position::in_bounds`] before using it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: i8,
    pub col: i8,
}

impl Position {
    pub const fn new(row: i8, col: i8) -> Self {
        Self { row, col }
    }

    pub fn in_bounds(self) -> bool {
        (1..=8).contains(&self.row) && (1..=8).contains(&self.col)
    }

    /// Step by a row/column delta; `None` if the result is off the board.
    pub fn offset(self, d_row: i8, d_col: i8) -> Option<Self> {
        let next = Self::new(self.row + d_row, self.col + d_col);
        next.in_bounds().then_some(next)
    }

    /// Iterator over all 64 squares, row 1 first.
    pub fn all() -> impl Iterator<Item = Position> {
        (1..=8).flat_map(|row| (1..=8).map(move |col| Position::new(row, col)))
    }
}

/// An 8x8 grid of optional pieces. Holds no rules: any piece may be placed
/// anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    squares: [[Option<Piece>; 8]; 8],
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    pub fn empty() -> Self {
        Self {
            squares: [[None; 8]; 8],
        }
    }

    /// The standard starting array.
    pub fn standard() -> Self {
        use PieceKind::*;
        const BACK: [PieceKind; 8] = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];

        let mut board = Self::empty();
        for (i, kind) in BACK.iter().enumerate() {
            let col = i as i8 + 1;
            board.set(Position::new(1, col), Some(Piece::new(Color::White, *kind)));
            board.set(Position::new(2, col), Some(Piece::new(Color::White, Pawn)));
            board.set(Position::new(7, col), Some(Piece::new(Color::Black, Pawn)));
            board.set(Position::new(8, col), Some(Piece::new(Color::Black, *kind)));
        }
        board
    }

    /// Piece on `pos`, or `None` for an empty or off-board square.
    pub fn get(&self, pos: Position) -> Option<Piece> {
        if !pos.in_bounds() {
            return None;
        }
        self.squares[(pos.row - 1) as usize][(pos.col - 1) as usize]
    }

    /// Place or clear a square. Off-board writes are ignored.
    pub fn set(&mut self, pos: Position, piece: Option<Piece>) {
        debug_assert!(pos.in_bounds(), "write outside the board: {pos:?}");
        if pos.in_bounds() {
            self.squares[(pos.row - 1) as usize][(pos.col - 1) as usize] = piece;
        }
    }

    /// Remove and return the piece on `pos`.
    pub fn take(&mut self, pos: Position) -> Option<Piece> {
        let piece = self.get(pos);
        self.set(pos, None);
        piece
    }

    /// Every occupied square with its piece.
    pub fn pieces(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        Position::all().filter_map(|pos| self.get(pos).map(|p| (pos, p)))
    }

    pub fn king(&self, color: Color) -> Option<Position> {
        self.pieces()
            .find(|(_, p)| p.color == color && p.kind == PieceKind::King)
            .map(|(pos, _)| pos)
    }
}
