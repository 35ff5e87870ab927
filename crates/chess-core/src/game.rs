//! Rules engine: legal move filtering, move application and game status.

use serde::{Deserialize, Serialize};

use crate::board::{Board, Color, Piece, PieceKind, Position};
use crate::error::MoveError;
use crate::movegen::{is_attacked, pseudo_legal_moves};
use crate::moves::Move;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    InProgress,
    Check,
    Checkmate,
    Stalemate,
    Resigned,
}

impl GameStatus {
    pub fn is_over(self) -> bool {
        matches!(
            self,
            GameStatus::Checkmate | GameStatus::Stalemate | GameStatus::Resigned
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastlingRights {
    pub white_king_side: bool,
    pub white_queen_side: bool,
    pub black_king_side: bool,
    pub black_queen_side: bool,
}

impl CastlingRights {
    pub const ALL: CastlingRights = CastlingRights {
        white_king_side: true,
        white_queen_side: true,
        black_king_side: true,
        black_queen_side: true,
    };

    pub const NONE: CastlingRights = CastlingRights {
        white_king_side: false,
        white_queen_side: false,
        black_king_side: false,
        black_queen_side: false,
    };

    pub fn get(&self, color: Color, king_side: bool) -> bool {
        match (color, king_side) {
            (Color::White, true) => self.white_king_side,
            (Color::White, false) => self.white_queen_side,
            (Color::Black, true) => self.black_king_side,
            (Color::Black, false) => self.black_queen_side,
        }
    }

    fn clear(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_king_side = false;
                self.white_queen_side = false;
            }
            Color::Black => {
                self.black_king_side = false;
                self.black_queen_side = false;
            }
        }
    }

    /// Drop the right tied to a rook's home corner once anything moves from
    /// or onto it.
    fn touch(&mut self, pos: Position) {
        match (pos.row, pos.col) {
            (1, 1) => self.white_queen_side = false,
            (1, 8) => self.white_king_side = false,
            (8, 1) => self.black_queen_side = false,
            (8, 8) => self.black_king_side = false,
            _ => {}
        }
    }
}

/// What a successful `make_move` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRecord {
    pub mv: Move,
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub castled: bool,
}

/// One game of chess. Mutated only through [`Game::make_move`] and
/// [`Game::resign`]; status is always derived from the position except for
/// resignation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub(crate) board: Board,
    pub(crate) turn: Color,
    pub(crate) status: GameStatus,
    pub(crate) castling: CastlingRights,
    pub(crate) en_passant: Option<Position>,
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove_number: u32,
    #[serde(default)]
    pub(crate) resigned: Option<Color>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Standard starting position, White to move.
    pub fn new() -> Self {
        Self {
            board: Board::standard(),
            turn: Color::White,
            status: GameStatus::InProgress,
            castling: CastlingRights::ALL,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            resigned: None,
        }
    }

    /// An arbitrary arrangement with no castling rights or en passant square.
    /// Status is derived from the position.
    pub fn with_board(board: Board, turn: Color) -> Self {
        Self::from_parts(board, turn, CastlingRights::NONE, None, 0, 1)
    }

    pub(crate) fn from_parts(
        board: Board,
        turn: Color,
        castling: CastlingRights,
        en_passant: Option<Position>,
        halfmove_clock: u32,
        fullmove_number: u32,
    ) -> Self {
        let mut game = Self {
            board,
            turn,
            status: GameStatus::InProgress,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
            resigned: None,
        };
        game.status = game.derive_status();
        game
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Owned copy of the board for rendering.
    pub fn board_snapshot(&self) -> Board {
        self.board.clone()
    }

    /// Colour to move.
    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    pub fn en_passant(&self) -> Option<Position> {
        self.en_passant
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub fn is_over(&self) -> bool {
        self.status.is_over()
    }

    pub fn resigned_by(&self) -> Option<Color> {
        self.resigned
    }

    pub fn winner(&self) -> Option<Color> {
        match self.status {
            GameStatus::Checkmate => Some(self.turn.opposite()),
            GameStatus::Resigned => self.resigned.map(Color::opposite),
            _ => None,
        }
    }

    /// Fully legal moves for the piece on `pos`, whichever side owns it.
    /// Empty for an empty square.
    pub fn legal_moves(&self, pos: Position) -> Vec<Move> {
        let Some(piece) = self.board.get(pos) else {
            return Vec::new();
        };

        // The en passant square only belongs to the side to move.
        let ep = (piece.color == self.turn).then_some(self.en_passant).flatten();
        let mut moves = pseudo_legal_moves(&self.board, pos, ep);
        if piece.kind == PieceKind::King {
            moves.extend(self.castling_moves(pos, piece.color));
        }

        moves.retain(|&mv| !self.exposes_king(mv, piece.color));
        moves
    }

    /// End squares of [`Game::legal_moves`], deduplicated across promotion
    /// kinds.
    pub fn legal_destinations(&self, pos: Position) -> Vec<Position> {
        let mut ends: Vec<Position> = self.legal_moves(pos).iter().map(|m| m.end).collect();
        ends.sort();
        ends.dedup();
        ends
    }

    pub fn all_legal_moves(&self, color: Color) -> Vec<Move> {
        self.board
            .pieces()
            .filter(|(_, p)| p.color == color)
            .flat_map(|(pos, _)| self.legal_moves(pos))
            .collect()
    }

    fn has_legal_move(&self, color: Color) -> bool {
        self.board
            .pieces()
            .filter(|(_, p)| p.color == color)
            .any(|(pos, _)| !self.legal_moves(pos).is_empty())
    }

    /// True if `color`'s king is attacked by any opposing piece.
    pub fn is_in_check(&self, color: Color) -> bool {
        self.board
            .king(color)
            .is_some_and(|king| is_attacked(&self.board, king, color.opposite()))
    }

    /// Validate and apply `mv` for the side to move.
    ///
    /// Nothing is mutated unless every check passes.
    pub fn make_move(&mut self, mv: Move) -> Result<MoveRecord, MoveError> {
        if self.is_over() {
            return Err(MoveError::GameOver);
        }
        let piece = self.board.get(mv.start).ok_or(MoveError::IllegalMove(mv))?;
        if piece.color != self.turn {
            return Err(MoveError::NotYourTurn);
        }
        if !self.legal_moves(mv.start).contains(&mv) {
            return Err(MoveError::IllegalMove(mv));
        }

        let (captured, castled) = apply(&mut self.board, mv);

        if piece.kind == PieceKind::King {
            self.castling.clear(piece.color);
        }
        self.castling.touch(mv.start);
        self.castling.touch(mv.end);

        self.en_passant = (piece.kind == PieceKind::Pawn && (mv.end.row - mv.start.row).abs() == 2)
            .then(|| Position::new((mv.start.row + mv.end.row) / 2, mv.start.col));

        if piece.kind == PieceKind::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        if self.turn == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }

        self.turn = self.turn.opposite();
        self.status = self.derive_status();

        Ok(MoveRecord {
            mv,
            piece,
            captured,
            castled,
        })
    }

    /// End the game with `color` conceding. No further moves are accepted.
    pub fn resign(&mut self, color: Color) {
        self.status = GameStatus::Resigned;
        self.resigned = Some(color);
    }

    fn derive_status(&self) -> GameStatus {
        let in_check = self.is_in_check(self.turn);
        match (in_check, self.has_legal_move(self.turn)) {
            (true, false) => GameStatus::Checkmate,
            (false, false) => GameStatus::Stalemate,
            (true, true) => GameStatus::Check,
            (false, true) => GameStatus::InProgress,
        }
    }

    /// Would playing `mv` leave `color`'s king attacked?
    fn exposes_king(&self, mv: Move, color: Color) -> bool {
        let mut scratch = self.board.clone();
        apply(&mut scratch, mv);
        scratch
            .king(color)
            .is_some_and(|king| is_attacked(&scratch, king, color.opposite()))
    }

    /// Two-column king moves. The king may not castle out of, through or into
    /// check, and every square between king and rook must be empty.
    fn castling_moves(&self, king: Position, color: Color) -> Vec<Move> {
        let mut moves = Vec::new();
        let row = color.back_rank();
        if king != Position::new(row, 5) || self.is_in_check(color) {
            return moves;
        }
        let rook = Some(Piece::new(color, PieceKind::Rook));
        let empty = |cols: &[i8]| cols.iter().all(|&c| self.board.get(Position::new(row, c)).is_none());
        let safe = |cols: &[i8]| {
            cols.iter()
                .all(|&c| !is_attacked(&self.board, Position::new(row, c), color.opposite()))
        };

        if self.castling.get(color, true)
            && self.board.get(Position::new(row, 8)) == rook
            && empty(&[6, 7])
            && safe(&[6, 7])
        {
            moves.push(Move::new(king, Position::new(row, 7)));
        }
        if self.castling.get(color, false)
            && self.board.get(Position::new(row, 1)) == rook
            && empty(&[2, 3, 4])
            && safe(&[3, 4])
        {
            moves.push(Move::new(king, Position::new(row, 3)));
        }
        moves
    }
}

/// Move pieces for an already-validated move. Handles captures, en passant,
/// the rook half of castling and promotion. Returns the captured piece and
/// whether the move was a castle.
fn apply(board: &mut Board, mv: Move) -> (Option<Piece>, bool) {
    let Some(piece) = board.take(mv.start) else {
        return (None, false);
    };
    let mut captured = board.take(mv.end);

    // A diagonal pawn move onto an empty square is en passant; the victim sits
    // beside the start square.
    if piece.kind == PieceKind::Pawn && mv.start.col != mv.end.col && captured.is_none() {
        captured = board.take(Position::new(mv.start.row, mv.end.col));
    }

    let castled = piece.kind == PieceKind::King && (mv.end.col - mv.start.col).abs() == 2;
    if castled {
        let (from_col, to_col) = if mv.end.col > mv.start.col { (8, 6) } else { (1, 4) };
        let rook = board.take(Position::new(mv.start.row, from_col));
        board.set(Position::new(mv.start.row, to_col), rook);
    }

    let placed = match mv.promotion {
        Some(kind) if piece.kind == PieceKind::Pawn => Piece::new(piece.color, kind),
        _ => piece,
    };
    board.set(mv.end, Some(placed));
    (captured, castled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Position {
        s.parse().unwrap()
    }

    fn mv(s: &str) -> Move {
        s.parse().unwrap()
    }

    fn place(board: &mut Board, s: &str, color: Color, kind: PieceKind) {
        board.set(sq(s), Some(Piece::new(color, kind)));
    }

    #[test]
    fn test_opening_move_count() {
        let game = Game::new();
        assert_eq!(game.all_legal_moves(Color::White).len(), 20);
        assert_eq!(game.all_legal_moves(Color::Black).len(), 20);
        assert_eq!(game.status(), GameStatus::InProgress);
    }

    #[test]
    fn test_make_move_flips_turn() {
        let mut game = Game::new();
        let record = game.make_move(mv("e2e4")).unwrap();
        assert_eq!(record.piece, Piece::new(Color::White, PieceKind::Pawn));
        assert_eq!(record.captured, None);
        assert_eq!(game.turn(), Color::Black);
        assert_eq!(game.en_passant(), Some(sq("e3")));
        assert_eq!(game.board().get(sq("e4")).map(|p| p.kind), Some(PieceKind::Pawn));
        assert_eq!(game.board().get(sq("e2")), None);
    }

    #[test]
    fn test_rejections_leave_game_untouched() {
        let mut game = Game::new();
        let before = game.clone();

        assert_eq!(game.make_move(mv("e7e5")), Err(MoveError::NotYourTurn));
        assert_eq!(game.make_move(mv("e2e5")), Err(MoveError::IllegalMove(mv("e2e5"))));
        assert_eq!(game.make_move(mv("e4e5")), Err(MoveError::IllegalMove(mv("e4e5"))));
        assert_eq!(game, before);
    }

    #[test]
    fn test_pinned_piece_cannot_move() {
        let mut board = Board::empty();
        place(&mut board, "e1", Color::White, PieceKind::King);
        place(&mut board, "e2", Color::White, PieceKind::Bishop);
        place(&mut board, "e8", Color::Black, PieceKind::Rook);
        place(&mut board, "a8", Color::Black, PieceKind::King);
        let game = Game::with_board(board, Color::White);

        assert!(game.legal_moves(sq("e2")).is_empty());
        assert!(!pseudo_legal_moves(game.board(), sq("e2"), None).is_empty());
    }

    #[test]
    fn test_check_must_be_answered() {
        let mut board = Board::empty();
        place(&mut board, "e1", Color::White, PieceKind::King);
        place(&mut board, "a2", Color::White, PieceKind::Rook);
        place(&mut board, "e8", Color::Black, PieceKind::Rook);
        place(&mut board, "h8", Color::Black, PieceKind::King);
        let game = Game::with_board(board, Color::White);

        assert_eq!(game.status(), GameStatus::Check);
        assert!(game.is_in_check(Color::White));
        // only the block on e2 and the king's sidesteps
        let rook_moves = game.legal_moves(sq("a2"));
        assert_eq!(rook_moves, vec![mv("a2e2")]);
    }

    #[test]
    fn test_fools_mate() {
        let mut game = Game::new();
        for m in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            game.make_move(mv(m)).unwrap();
        }
        assert_eq!(game.status(), GameStatus::Checkmate);
        assert_eq!(game.winner(), Some(Color::Black));
        assert_eq!(game.make_move(mv("a2a3")), Err(MoveError::GameOver));
    }

    #[test]
    fn test_protected_queen_mate() {
        let mut board = Board::empty();
        place(&mut board, "e1", Color::White, PieceKind::King);
        place(&mut board, "e2", Color::Black, PieceKind::Queen);
        place(&mut board, "e3", Color::Black, PieceKind::King);
        let mut game = Game::with_board(board, Color::White);

        assert!(game.legal_moves(sq("e1")).is_empty());
        assert_eq!(game.status(), GameStatus::Checkmate);
        assert_eq!(game.make_move(mv("e1e2")), Err(MoveError::GameOver));
    }

    #[test]
    fn test_move_into_stalemate() {
        let mut board = Board::empty();
        place(&mut board, "a1", Color::White, PieceKind::King);
        place(&mut board, "c2", Color::Black, PieceKind::King);
        place(&mut board, "d3", Color::Black, PieceKind::Queen);
        let mut game = Game::with_board(board, Color::Black);
        assert_eq!(game.status(), GameStatus::InProgress);

        game.make_move(mv("d3b3")).unwrap();
        assert_eq!(game.status(), GameStatus::Stalemate);
        assert!(!game.is_in_check(Color::White));
        assert_eq!(game.winner(), None);
        assert_eq!(game.make_move(mv("a1a2")), Err(MoveError::GameOver));
    }

    #[test]
    fn test_promotion_requires_kind() {
        let mut board = Board::empty();
        place(&mut board, "a7", Color::White, PieceKind::Pawn);
        place(&mut board, "e1", Color::White, PieceKind::King);
        place(&mut board, "e8", Color::Black, PieceKind::King);
        let mut game = Game::with_board(board, Color::White);

        assert_eq!(game.legal_moves(sq("a7")).len(), 4);
        assert!(matches!(game.make_move(mv("a7a8")), Err(MoveError::IllegalMove(_))));

        game.make_move(mv("a7a8q")).unwrap();
        assert_eq!(
            game.board().get(sq("a8")),
            Some(Piece::new(Color::White, PieceKind::Queen))
        );
        // queen on a8 checks the king along the back rank
        assert_eq!(game.status(), GameStatus::Check);
    }

    #[test]
    fn test_en_passant_capture_removes_passed_pawn() {
        let mut game = Game::new();
        for m in ["e2e4", "a7a6", "e4e5", "d7d5"] {
            game.make_move(mv(m)).unwrap();
        }
        assert!(game.legal_moves(sq("e5")).contains(&mv("e5d6")));

        let record = game.make_move(mv("e5d6")).unwrap();
        assert_eq!(record.captured, Some(Piece::new(Color::Black, PieceKind::Pawn)));
        assert_eq!(game.board().get(sq("d5")), None);
        assert_eq!(game.board().get(sq("d6")).map(|p| p.kind), Some(PieceKind::Pawn));
    }

    #[test]
    fn test_en_passant_expires() {
        let mut game = Game::new();
        for m in ["e2e4", "a7a6", "e4e5", "d7d5", "h2h3", "h7h6"] {
            game.make_move(mv(m)).unwrap();
        }
        assert!(!game.legal_moves(sq("e5")).contains(&mv("e5d6")));
    }

    #[test]
    fn test_castling_both_sides() {
        let mut board = Board::empty();
        place(&mut board, "e1", Color::White, PieceKind::King);
        place(&mut board, "a1", Color::White, PieceKind::Rook);
        place(&mut board, "h1", Color::White, PieceKind::Rook);
        place(&mut board, "e8", Color::Black, PieceKind::King);
        let rights = CastlingRights {
            white_king_side: true,
            white_queen_side: true,
            ..CastlingRights::NONE
        };
        let game = Game::from_parts(board, Color::White, rights, None, 0, 1);

        let dests = game.legal_destinations(sq("e1"));
        assert!(dests.contains(&sq("g1")));
        assert!(dests.contains(&sq("c1")));

        let mut short = game.clone();
        let record = short.make_move(mv("e1g1")).unwrap();
        assert!(record.castled);
        assert_eq!(short.board().get(sq("f1")).map(|p| p.kind), Some(PieceKind::Rook));
        assert_eq!(short.board().get(sq("h1")), None);
        assert!(!short.castling().white_queen_side);

        let mut long = game;
        long.make_move(mv("e1c1")).unwrap();
        assert_eq!(long.board().get(sq("d1")).map(|p| p.kind), Some(PieceKind::Rook));
        assert_eq!(long.board().get(sq("a1")), None);
    }

    #[test]
    fn test_no_castling_through_attack() {
        let mut board = Board::empty();
        place(&mut board, "e1", Color::White, PieceKind::King);
        place(&mut board, "h1", Color::White, PieceKind::Rook);
        place(&mut board, "f8", Color::Black, PieceKind::Rook);
        place(&mut board, "a8", Color::Black, PieceKind::King);
        let rights = CastlingRights {
            white_king_side: true,
            ..CastlingRights::NONE
        };
        let game = Game::from_parts(board, Color::White, rights, None, 0, 1);
        assert!(!game.legal_destinations(sq("e1")).contains(&sq("g1")));
    }

    #[test]
    fn test_rook_move_drops_castling_right() {
        let mut game = Game::new();
        for m in ["h2h4", "a7a6", "h1h3", "a6a5", "h3h1"] {
            game.make_move(mv(m)).unwrap();
        }
        assert!(!game.castling().white_king_side);
        assert!(game.castling().white_queen_side);
    }

    #[test]
    fn test_clocks_saturate() {
        let mut game = Game::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 4294967295 4294967295").unwrap();
        game.make_move(mv("e8d8")).unwrap();
        assert_eq!(game.halfmove_clock(), u32::MAX);
        assert_eq!(game.fullmove_number(), u32::MAX);
    }

    #[test]
    fn test_resign() {
        let mut game = Game::new();
        game.resign(Color::White);
        assert_eq!(game.status(), GameStatus::Resigned);
        assert_eq!(game.winner(), Some(Color::Black));
        assert_eq!(game.make_move(mv("e2e4")), Err(MoveError::GameOver));
    }

    #[test]
    fn test_legal_moves_idempotent() {
        let mut game = Game::new();
        game.make_move(mv("e2e4")).unwrap();
        for (pos, _) in game.board().pieces() {
            assert_eq!(game.legal_moves(pos), game.legal_moves(pos));
        }
    }

    #[test]
    fn test_state_round_trips_through_json() {
        let mut game = Game::new();
        for m in ["e2e4", "c7c5", "g1f3"] {
            game.make_move(mv(m)).unwrap();
        }
        let json = serde_json::to_string(&game).unwrap();
        let back: Game = serde_json::from_str(&json).unwrap();
        assert_eq!(back, game);
        assert_eq!(back.turn(), Color::Black);
    }
}
