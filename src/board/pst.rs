//! Material values, piece-square tables and game-phase weights.
//!
//! Tables are written visually, eighth rank first, from White's point of
//! view; `pst_square` maps a board square to the right table index for
//! either color.

/// Material value per piece type in centipawns (kings carry no material).
pub(crate) const MATERIAL: [i32; 6] = [100, 320, 330, 500, 900, 0];

/// Phase contribution per piece type; a full board sums to 24.
pub(crate) const PHASE_WEIGHTS: [i32; 6] = [0, 1, 1, 2, 4, 0];

/// Total phase of a full board, used to taper between middlegame and endgame.
pub(crate) const PHASE_MAX: i32 = 24;

#[rustfmt::skip]
const PAWN_MG: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    50, 50, 50, 50, 50, 50, 50, 50,
    10, 10, 20, 30, 30, 20, 10, 10,
     5,  5, 10, 25, 25, 10,  5,  5,
     0,  0,  0, 20, 20,  0,  0,  0,
     5, -5,-10,  0,  0,-10, -5,  5,
     5, 10, 10,-20,-20, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const PAWN_EG: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    80, 80, 80, 80, 80, 80, 80, 80,
    50, 50, 50, 50, 50, 50, 50, 50,
    30, 30, 30, 30, 30, 30, 30, 30,
    15, 15, 15, 15, 15, 15, 15, 15,
     5,  5,  5,  5,  5,  5,  5,  5,
     5,  5,  5,  5,  5,  5,  5,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT: [i32; 64] = [
    -50,-40,-30,-30,-30,-30,-40,-50,
    -40,-20,  0,  0,  0,  0,-20,-40,
    -30,  0, 10, 15, 15, 10,  0,-30,
    -30,  5, 15, 20, 20, 15,  5,-30,
    -30,  0, 15, 20, 20, 15,  0,-30,
    -30,  5, 10, 15, 15, 10,  5,-30,
    -40,-20,  0,  5,  5,  0,-20,-40,
    -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const BISHOP: [i32; 64] = [
    -20,-10,-10,-10,-10,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5, 10, 10,  5,  0,-10,
    -10,  5,  5, 10, 10,  5,  5,-10,
    -10,  0, 10, 10, 10, 10,  0,-10,
    -10, 10, 10, 10, 10, 10, 10,-10,
    -10,  5,  0,  0,  0,  0,  5,-10,
    -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const ROOK: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10, 10, 10, 10, 10,  5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     0,  0,  0,  5,  5,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN: [i32; 64] = [
    -20,-10,-10, -5, -5,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5,  5,  5,  5,  0,-10,
     -5,  0,  5,  5,  5,  5,  0, -5,
      0,  0,  5,  5,  5,  5,  0, -5,
    -10,  5,  5,  5,  5,  5,  0,-10,
    -10,  0,  5,  0,  0,  0,  0,-10,
    -20,-10,-10, -5, -5,-10,-10,-20,
];

#[rustfmt::skip]
const KING_MG: [i32; 64] = [
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -20,-30,-30,-40,-40,-30,-30,-20,
    -10,-20,-20,-20,-20,-20,-20,-10,
     20, 20,  0,  0,  0,  0, 20, 20,
     20, 30, 10,  0,  0, 10, 30, 20,
];

#[rustfmt::skip]
const KING_EG: [i32; 64] = [
    -50,-40,-30,-20,-20,-30,-40,-50,
    -30,-20,-10,  0,  0,-10,-20,-30,
    -30,-10, 20, 30, 30, 20,-10,-30,
    -30,-10, 30, 40, 40, 30,-10,-30,
    -30,-10, 30, 40, 40, 30,-10,-30,
    -30,-10, 20, 30, 30, 20,-10,-30,
    -30,-30,  0,  0,  0,  0,-30,-30,
    -50,-30,-30,-30,-30,-30,-50,-50,
];

pub(crate) const PST_MG: [[i32; 64]; 6] = [PAWN_MG, KNIGHT, BISHOP, ROOK, QUEEN, KING_MG];
pub(crate) const PST_EG: [[i32; 64]; 6] = [PAWN_EG, KNIGHT, BISHOP, ROOK, QUEEN, KING_EG];

/// Map a board square index to the PST index for the given color.
/// Tables are written eighth-rank-first, so White looks up mirrored.
#[inline]
pub(crate) const fn pst_square(sq_idx: usize, is_white: bool) -> usize {
    if is_white {
        sq_idx ^ 56
    } else {
        sq_idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pst_square_mirrors() {
        // e2 for White reads the same entry as e7 for Black
        let e2 = 12;
        let e7 = 52;
        assert_eq!(pst_square(e2, true), pst_square(e7, false));
    }

    #[test]
    fn test_central_pawn_push_gains() {
        // e4 must beat e2 in the middlegame table or pawns never advance
        let e2 = pst_square(12, true);
        let e4 = pst_square(28, true);
        assert!(PAWN_MG[e4] > PAWN_MG[e2]);
    }

    #[test]
    fn test_phase_weights_sum() {
        // 8 pawns, 2 knights, 2 bishops, 2 rooks, 1 queen per side
        let per_side = 8 * PHASE_WEIGHTS[0]
            + 2 * PHASE_WEIGHTS[1]
            + 2 * PHASE_WEIGHTS[2]
            + 2 * PHASE_WEIGHTS[3]
            + PHASE_WEIGHTS[4];
        assert_eq!(2 * per_side, PHASE_MAX);
    }
}
