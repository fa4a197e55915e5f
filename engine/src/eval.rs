//! Static evaluation, positive when White is better.

use crate::board::{Board, Color, PieceKind, Piece};
use crate::square::Square;

// Terms are summed as whole twentieths of a pawn so that positions that
// are equal by the formula also compare equal as floats.
const UNITS_PER_PAWN: i32 = 20;
// 0.1 pawn per rank advanced
const ADVANCEMENT_UNITS: i32 = 2;

pub fn piece_value(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::Pawn => 1,
        PieceKind::Knight => 3,
        PieceKind::Bishop => 3,
        PieceKind::Rook => 5,
        PieceKind::Queen => 9,
        PieceKind::King => 0,
    }
}

/// Material plus two small positional terms: pawns are rewarded for each
/// rank they have advanced and kings are penalised by their Manhattan
/// distance from the centre. Recomputed from scratch on every call.
pub fn evaluate(board: &Board) -> f64 {
    let units: i32 = board.pieces()
        .map(|(square, piece)| match piece.color {
            Color::White => piece_units(square, piece),
            Color::Black => -piece_units(square, piece),
        })
        .sum();
    units as f64 / UNITS_PER_PAWN as f64
}

fn piece_units(square: Square, piece: Piece) -> i32 {
    let material = piece_value(piece.kind) * UNITS_PER_PAWN;
    match piece.kind {
        PieceKind::Pawn => material + pawn_advancement(square, piece.color) * ADVANCEMENT_UNITS,
        // one unit per half square keeps the 3.5 centre offsets integral
        PieceKind::King => material - center_distance_halves(square),
        _ => material,
    }
}

fn pawn_advancement(square: Square, color: Color) -> i32 {
    (square.rank() as i32 - color.pawn_rank() as i32).abs()
}

/// `|file - 3.5| + |rank - 3.5|`, doubled.
fn center_distance_halves(square: Square) -> i32 {
    (2 * square.file() as i32 - 7).abs() + (2 * square.rank() as i32 - 7).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_fen(fen: &str) -> f64 {
        evaluate(&Board::from_fen(fen).unwrap())
    }

    #[test]
    fn initial_position_is_balanced() {
        assert_eq!(evaluate(&Board::new()), 0.0);
    }

    #[test]
    fn counts_material_for_both_sides() {
        // kings on e1/e8 cancel out, leaving the rook
        assert_eq!(eval_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1"), 5.0);
        assert_eq!(eval_fen("q3k3/8/8/8/8/8/8/4K3 w - - 0 1"), -9.0);
        assert_eq!(eval_fen("4k3/8/8/8/8/8/8/1NB1K3 w - - 0 1"), 6.0);
    }

    #[test]
    fn rewards_pawn_advancement() {
        assert_eq!(eval_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1"), 1.0);
        assert_eq!(eval_fen("4k3/8/8/8/4P3/8/8/4K3 w - - 0 1"), 1.2);
        assert_eq!(eval_fen("4k3/8/8/4p3/8/8/8/4K3 w - - 0 1"), -1.2);
    }

    #[test]
    fn rewards_central_kings() {
        // e1 is 4 squares from the centre, d4 half a square in each direction
        assert_eq!(eval_fen("4k3/8/8/8/3K4/8/8/8 w - - 0 1"), 0.3);
        assert_eq!(eval_fen("8/8/8/8/3k4/8/8/4K3 w - - 0 1"), -0.3);
        assert_eq!(eval_fen("7k/8/8/8/8/8/8/K7 w - - 0 1"), 0.0);
    }

    #[test]
    fn mirrored_positions_evaluate_to_opposites() {
        let white = eval_fen("4k3/8/8/8/3P4/2N5/8/4K3 w - - 0 1");
        let black = eval_fen("4k3/8/2n5/3p4/8/8/8/4K3 w - - 0 1");
        assert_eq!(white, -black);
    }
}
