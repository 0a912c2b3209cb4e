//! Static evaluation from the side to move's perspective.
//!
//! Tapered material + piece-square score. The heavy lifting happened
//! incrementally in make/unmake; this only combines the accumulators.

use super::pst::PHASE_MAX;
use super::Board;

/// Small bonus for having the move.
const TEMPO_BONUS: i32 = 10;

impl Board {
    /// Static position score in centipawns, positive when the side to
    /// move is better.
    #[inline]
    #[must_use]
    pub fn evaluate(&self) -> i32 {
        let us = self.side_to_move().index();
        let them = 1 - us;

        let mg = self.eval_mg[us] - self.eval_mg[them];
        let eg = self.eval_eg[us] - self.eval_eg[them];
        let phase = self.phase();

        (mg * phase + eg * (PHASE_MAX - phase)) / PHASE_MAX + TEMPO_BONUS
    }
}
