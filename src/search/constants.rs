//! Score constants shared by the search and the transposition table.

use crate::board::MAX_PLY;

/// Upper bound of the score range, outside every real evaluation.
pub const INFINITE: i32 = 30_000;

/// Mate at the root; a mate found at `ply` scores `CHECKMATE - ply`.
pub const CHECKMATE: i32 = 29_000;

/// Scores at or beyond this magnitude are mate scores.
pub const MATE_THRESHOLD: i32 = CHECKMATE - MAX_PLY as i32 - 1;

/// Score of a drawn position before contempt adjustment.
pub const DRAW: i32 = 0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_ordering() {
        assert!(INFINITE > CHECKMATE);
        assert!(CHECKMATE > MATE_THRESHOLD);
        assert!(MATE_THRESHOLD > 20_000);
    }

    #[test]
    fn test_mate_scores_fit_tt_storage() {
        // Deepest mate score, shifted by the deepest ply at store time,
        // must stay within the table's 16-bit value field.
        let extreme = CHECKMATE + MAX_PLY as i32;
        assert!(extreme <= i32::from(i16::MAX));
    }

    #[test]
    fn test_every_mate_is_above_threshold() {
        let deepest_mate = CHECKMATE - MAX_PLY as i32;
        assert!(deepest_mate >= MATE_THRESHOLD);
    }
}
