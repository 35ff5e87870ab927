//! FEN import/export for [`Game`].

use crate::board::{Board, Color, Piece, Position};
use crate::error::FenError;
use crate::game::{CastlingRights, Game};

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Game {
    /// Parse a six-field FEN string. The clocks may be omitted.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(FenError(format!("expected at least 4 fields, got {}", fields.len())));
        }

        let board = parse_placement(fields[0])?;

        let turn = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError(format!("bad side to move {other:?}"))),
        };

        let mut castling = CastlingRights::NONE;
        if fields[2] != "-" {
            for c in fields[2].chars() {
                match c {
                    'K' => castling.white_king_side = true,
                    'Q' => castling.white_queen_side = true,
                    'k' => castling.black_king_side = true,
                    'q' => castling.black_queen_side = true,
                    other => return Err(FenError(format!("bad castling flag {other:?}"))),
                }
            }
        }

        let en_passant = match fields[3] {
            "-" => None,
            square => Some(
                square
                    .parse::<Position>()
                    .map_err(|e| FenError(e.to_string()))?,
            ),
        };

        let halfmove = parse_clock(fields.get(4), 0)?;
        let fullmove = parse_clock(fields.get(5), 1)?;

        Ok(Game::from_parts(board, turn, castling, en_passant, halfmove, fullmove))
    }

    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for row in (1..=8).rev() {
            let mut gap = 0;
            for col in 1..=8 {
                match self.board.get(Position::new(row, col)) {
                    Some(piece) => {
                        if gap > 0 {
                            placement.push_str(&gap.to_string());
                            gap = 0;
                        }
                        placement.push(piece.fen_char());
                    }
                    None => gap += 1,
                }
            }
            if gap > 0 {
                placement.push_str(&gap.to_string());
            }
            if row > 1 {
                placement.push('/');
            }
        }

        let turn = match self.turn {
            Color::White => "w",
            Color::Black => "b",
        };

        let mut castling = String::new();
        for (flag, c) in [
            (self.castling.white_king_side, 'K'),
            (self.castling.white_queen_side, 'Q'),
            (self.castling.black_king_side, 'k'),
            (self.castling.black_queen_side, 'q'),
        ] {
            if flag {
                castling.push(c);
            }
        }
        if castling.is_empty() {
            castling.push('-');
        }

        let ep = self
            .en_passant
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());

        format!(
            "{placement} {turn} {castling} {ep} {} {}",
            self.halfmove_clock, self.fullmove_number
        )
    }
}

fn parse_placement(placement: &str) -> Result<Board, FenError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError(format!("expected 8 ranks, got {}", ranks.len())));
    }

    let mut board = Board::empty();
    for (i, rank) in ranks.iter().enumerate() {
        let row = 8 - i as i8;
        let mut col = 1i8;
        for c in rank.chars() {
            if let Some(skip) = c.to_digit(10) {
                if !(1..=8).contains(&skip) || col + skip as i8 > 9 {
                    return Err(FenError(format!("bad run length {c:?} in rank {row}")));
                }
                col += skip as i8;
            } else {
                let piece = Piece::from_fen_char(c)
                    .ok_or_else(|| FenError(format!("bad piece {c:?}")))?;
                if col > 8 {
                    return Err(FenError(format!("rank {row} overflows")));
                }
                board.set(Position::new(row, col), Some(piece));
                col += 1;
            }
        }
        if col != 9 {
            return Err(FenError(format!("rank {row} has {} squares", col - 1)));
        }
    }
    Ok(board)
}

fn parse_clock(field: Option<&&str>, default: u32) -> Result<u32, FenError> {
    match field {
        None => Ok(default),
        Some(s) => s
            .parse()
            .map_err(|_| FenError(format!("bad clock {s:?}"))),
    }
}
