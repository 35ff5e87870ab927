//! Pseudo-legal move generation.
//!
//! Moves here respect piece geometry and board occupancy only. Whether a move
//! leaves the mover's king in check is decided by [`crate::game::Game`].

use crate::board::{Board, Color, Piece, PieceKind, Position};
use crate::moves::Move;

const ORTHOGONAL: [(i8, i8); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];
const DIAGONAL: [(i8, i8); 4] = [(1, 1), (-1, 1), (-1, -1), (1, -1)];
const KING_STEPS: [(i8, i8); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];
const KNIGHT_STEPS: [(i8, i8); 8] = [
    (2, 1),
    (1, 2),
    (-1, 2),
    (-2, 1),
    (-2, -1),
    (-1, -2),
    (1, -2),
    (2, -1),
];

/// All geometrically reachable moves for the piece on `from`.
///
/// `en_passant` is the square a pawn just skipped over with a two-square
/// advance, if any. Castling is not generated here since it depends on
/// castling rights and attacked squares.
pub fn pseudo_legal_moves(board: &Board, from: Position, en_passant: Option<Position>) -> Vec<Move> {
    let mut moves = Vec::new();
    let Some(piece) = board.get(from) else {
        return moves;
    };

    match piece.kind {
        PieceKind::Bishop => slide(board, from, piece.color, &DIAGONAL, &mut moves),
        PieceKind::Rook => slide(board, from, piece.color, &ORTHOGONAL, &mut moves),
        PieceKind::Queen => {
            slide(board, from, piece.color, &ORTHOGONAL, &mut moves);
            slide(board, from, piece.color, &DIAGONAL, &mut moves);
        }
        PieceKind::King => step(board, from, piece.color, &KING_STEPS, &mut moves),
        PieceKind::Knight => step(board, from, piece.color, &KNIGHT_STEPS, &mut moves),
        PieceKind::Pawn => pawn(board, from, piece.color, en_passant, &mut moves),
    }
    moves
}

fn slide(board: &Board, from: Position, color: Color, dirs: &[(i8, i8)], out: &mut Vec<Move>) {
    for &(dr, dc) in dirs {
        let mut cur = from;
        while let Some(next) = cur.offset(dr, dc) {
            match board.get(next) {
                None => out.push(Move::new(from, next)),
                Some(other) => {
                    if other.color != color {
                        out.push(Move::new(from, next));
                    }
                    break;
                }
            }
            cur = next;
        }
    }
}

fn step(board: &Board, from: Position, color: Color, offsets: &[(i8, i8)], out: &mut Vec<Move>) {
    for &(dr, dc) in offsets {
        if let Some(to) = from.offset(dr, dc) {
            if !board.get(to).is_some_and(|p| p.color == color) {
                out.push(Move::new(from, to));
            }
        }
    }
}

fn pawn(board: &Board, from: Position, color: Color, en_passant: Option<Position>, out: &mut Vec<Move>) {
    let fwd = color.forward();

    if let Some(one) = from.offset(fwd, 0) {
        if board.get(one).is_none() {
            push_pawn_move(from, one, color, out);

            if from.row == color.pawn_rank() {
                if let Some(two) = one.offset(fwd, 0) {
                    if board.get(two).is_none() {
                        out.push(Move::new(from, two));
                    }
                }
            }
        }
    }

    for dc in [-1, 1] {
        let Some(target) = from.offset(fwd, dc) else {
            continue;
        };
        match board.get(target) {
            Some(other) if other.color != color => push_pawn_move(from, target, color, out),
            Some(_) => {}
            None => {
                if en_passant == Some(target) && is_en_passant_capture(board, from, target, color) {
                    out.push(Move::new(from, target));
                }
            }
        }
    }
}

/// One move, or one per promotion kind when landing on the last rank.
fn push_pawn_move(from: Position, to: Position, color: Color, out: &mut Vec<Move>) {
    if to.row == color.promotion_rank() {
        out.extend(
            PieceKind::PROMOTIONS
                .iter()
                .map(|&kind| Move::promoting(from, to, kind)),
        );
    } else {
        out.push(Move::new(from, to));
    }
}

/// The skipped square must lie on the capturer's sixth rank with the enemy
/// pawn still beside the capturer.
fn is_en_passant_capture(board: &Board, from: Position, target: Position, color: Color) -> bool {
    let skipped_rank = color.opposite().pawn_rank() + color.opposite().forward();
    if target.row != skipped_rank {
        return false;
    }
    board.get(Position::new(from.row, target.col))
        == Some(Piece::new(color.opposite(), PieceKind::Pawn))
}

/// True if any piece of colour `by` attacks `target`.
///
/// Looks outward from the target square for each attacker kind rather than
/// generating every enemy move. Pawn pushes never attack.
pub fn is_attacked(board: &Board, target: Position, by: Color) -> bool {
    let is = |pos: Option<Position>, kinds: &[PieceKind]| {
        pos.and_then(|p| board.get(p))
            .is_some_and(|p| p.color == by && kinds.contains(&p.kind))
    };

    if KNIGHT_STEPS
        .iter()
        .any(|&(dr, dc)| is(target.offset(dr, dc), &[PieceKind::Knight]))
    {
        return true;
    }
    if KING_STEPS
        .iter()
        .any(|&(dr, dc)| is(target.offset(dr, dc), &[PieceKind::King]))
    {
        return true;
    }

    // A pawn of colour `by` attacks from one row behind, relative to its
    // direction of travel.
    let back = -by.forward();
    if [-1, 1]
        .iter()
        .any(|&dc| is(target.offset(back, dc), &[PieceKind::Pawn]))
    {
        return true;
    }

    ray_hits(board, target, by, &ORTHOGONAL, &[PieceKind::Rook, PieceKind::Queen])
        || ray_hits(board, target, by, &DIAGONAL, &[PieceKind::Bishop, PieceKind::Queen])
}

fn ray_hits(board: &Board, target: Position, by: Color, dirs: &[(i8, i8)], kinds: &[PieceKind]) -> bool {
    dirs.iter().any(|&(dr, dc)| {
        let mut cur = target;
        while let Some(next) = cur.offset(dr, dc) {
            if let Some(p) = board.get(next) {
                return p.color == by && kinds.contains(&p.kind);
            }
            cur = next;
        }
        false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Position {
        s.parse().unwrap()
    }

    fn place(board: &mut Board, s: &str, color: Color, kind: PieceKind) {
        board.set(sq(s), Some(Piece::new(color, kind)));
    }

    fn destinations(moves: &[Move]) -> Vec<String> {
        let mut out: Vec<String> = moves.iter().map(|m| m.end.to_string()).collect();
        out.sort();
        out.dedup();
        out
    }

    #[test]
    fn test_knight_in_corner() {
        let mut board = Board::empty();
        place(&mut board, "a1", Color::White, PieceKind::Knight);
        place(&mut board, "c2", Color::White, PieceKind::Pawn);
        let moves = pseudo_legal_moves(&board, sq("a1"), None);
        assert_eq!(destinations(&moves), vec!["b3"]);
    }

    #[test]
    fn test_bishop_stops_at_blockers() {
        let mut board = Board::empty();
        place(&mut board, "c1", Color::White, PieceKind::Bishop);
        place(&mut board, "e3", Color::Black, PieceKind::Knight);
        place(&mut board, "b2", Color::White, PieceKind::Pawn);
        let moves = pseudo_legal_moves(&board, sq("c1"), None);
        assert_eq!(destinations(&moves), vec!["d2", "e3"]);
    }

    #[test]
    fn test_rook_and_queen_counts_on_empty_board() {
        let mut board = Board::empty();
        place(&mut board, "d4", Color::White, PieceKind::Rook);
        assert_eq!(pseudo_legal_moves(&board, sq("d4"), None).len(), 14);

        place(&mut board, "d4", Color::White, PieceKind::Queen);
        assert_eq!(pseudo_legal_moves(&board, sq("d4"), None).len(), 27);
    }

    #[test]
    fn test_king_skips_friendly_squares() {
        let mut board = Board::empty();
        place(&mut board, "e1", Color::White, PieceKind::King);
        place(&mut board, "d1", Color::White, PieceKind::Queen);
        place(&mut board, "e2", Color::Black, PieceKind::Pawn);
        let moves = pseudo_legal_moves(&board, sq("e1"), None);
        assert_eq!(destinations(&moves), vec!["d2", "e2", "f1", "f2"]);
    }

    #[test]
    fn test_pawn_pushes() {
        let board = Board::standard();
        let moves = pseudo_legal_moves(&board, sq("e2"), None);
        assert_eq!(destinations(&moves), vec!["e3", "e4"]);

        let black = pseudo_legal_moves(&board, sq("d7"), None);
        assert_eq!(destinations(&black), vec!["d5", "d6"]);
    }

    #[test]
    fn test_pawn_double_push_blocked() {
        let mut board = Board::standard();
        place(&mut board, "e3", Color::Black, PieceKind::Knight);
        assert!(pseudo_legal_moves(&board, sq("e2"), None).is_empty());

        let mut board = Board::standard();
        place(&mut board, "e4", Color::Black, PieceKind::Knight);
        assert_eq!(destinations(&pseudo_legal_moves(&board, sq("e2"), None)), vec!["e3"]);
    }

    #[test]
    fn test_pawn_captures_and_promotions() {
        let mut board = Board::empty();
        place(&mut board, "b7", Color::White, PieceKind::Pawn);
        place(&mut board, "a8", Color::Black, PieceKind::Rook);
        place(&mut board, "c8", Color::White, PieceKind::Rook);
        let moves = pseudo_legal_moves(&board, sq("b7"), None);
        // b8 push and a8 capture, four kinds each
        assert_eq!(moves.len(), 8);
        assert!(moves.iter().all(|m| m.promotion.is_some()));
        assert_eq!(destinations(&moves), vec!["a8", "b8"]);
    }

    #[test]
    fn test_en_passant_requires_target() {
        let mut board = Board::empty();
        place(&mut board, "e5", Color::White, PieceKind::Pawn);
        place(&mut board, "d5", Color::Black, PieceKind::Pawn);

        let without = pseudo_legal_moves(&board, sq("e5"), None);
        assert_eq!(destinations(&without), vec!["e6"]);

        let with = pseudo_legal_moves(&board, sq("e5"), Some(sq("d6")));
        assert_eq!(destinations(&with), vec!["d6", "e6"]);
    }

    #[test]
    fn test_no_move_leaves_board_or_hits_friend() {
        let board = Board::standard();
        for (pos, piece) in board.pieces() {
            for mv in pseudo_legal_moves(&board, pos, None) {
                assert!(mv.end.in_bounds());
                assert!(!board.get(mv.end).is_some_and(|p| p.color == piece.color));
            }
        }
    }

    #[test]
    fn test_is_attacked() {
        let mut board = Board::empty();
        place(&mut board, "e4", Color::Black, PieceKind::Pawn);
        place(&mut board, "a1", Color::White, PieceKind::Rook);
        place(&mut board, "a5", Color::White, PieceKind::Pawn);

        // black pawn on e4 hits d3 and f3
        assert!(is_attacked(&board, sq("d3"), Color::Black));
        assert!(is_attacked(&board, sq("f3"), Color::Black));
        assert!(!is_attacked(&board, sq("e3"), Color::Black));

        // rook ray blocked by own pawn on a5
        assert!(is_attacked(&board, sq("a4"), Color::White));
        assert!(!is_attacked(&board, sq("a6"), Color::White));
        assert!(is_attacked(&board, sq("h1"), Color::White));
    }
}
