//! Time budgeting for a single search.
//!
//! The controller derives a soft and a hard budget from the search mode.
//! The hard limit is the cancellation deadline checked inside the tree;
//! the soft limit only prevents starting another iteration. Extension
//! triggers accumulate extra time that weighs 80% into the soft check and
//! fully into the hard check.

use std::time::{Duration, Instant};

use super::SearchMode;

/// Safety margin subtracted from the remaining clock (communication
/// latency, GUI overhead).
const CLOCK_SAFETY_MS: u64 = 1000;

/// Horizon assumed when the time control carries no movestogo.
const DEFAULT_MOVES_TO_GO: u64 = 40;

#[derive(Debug, Clone)]
pub struct TimeController {
    start: Instant,
    soft_ms: u64,
    hard_ms: u64,
    extra_ms: u64,
    limited: bool,
}

impl TimeController {
    /// A controller that never fires (infinite, depth, nodes, perft...).
    #[must_use]
    pub fn unlimited() -> Self {
        TimeController {
            start: Instant::now(),
            soft_ms: 0,
            hard_ms: 0,
            extra_ms: 0,
            limited: false,
        }
    }

    /// Derive budgets for a search mode and side to move.
    #[must_use]
    pub fn for_mode(mode: &SearchMode, white_to_move: bool) -> Self {
        match mode {
            SearchMode::FixedTime(ms) => TimeController::fixed(*ms),
            SearchMode::TimeControl {
                wtime,
                btime,
                winc,
                binc,
                movestogo,
            }
            | SearchMode::Ponder {
                wtime,
                btime,
                winc,
                binc,
                movestogo,
                movetime: 0,
            } => {
                let (remaining, inc) = if white_to_move {
                    (*wtime, *winc)
                } else {
                    (*btime, *binc)
                };
                TimeController::from_clock(remaining, inc, *movestogo)
            }
            SearchMode::Ponder { movetime, .. } => TimeController::fixed(*movetime),
            _ => TimeController::unlimited(),
        }
    }

    fn fixed(ms: u64) -> Self {
        TimeController {
            start: Instant::now(),
            soft_ms: ms.max(1),
            hard_ms: ms.max(1),
            extra_ms: 0,
            limited: true,
        }
    }

    fn from_clock(remaining_ms: u64, inc_ms: u64, movestogo: u32) -> Self {
        // A zero clock is a malformed request; fall back to infinite
        if remaining_ms == 0 {
            return TimeController::unlimited();
        }
        let mut left = remaining_ms.saturating_sub(CLOCK_SAFETY_MS);
        let moves_left = if movestogo > 0 {
            u64::from(movestogo)
        } else {
            DEFAULT_MOVES_TO_GO
        };
        left = left.saturating_add(DEFAULT_MOVES_TO_GO * inc_ms);

        let mut hard = left / moves_left;
        if hard < 100 {
            hard = hard.saturating_mul(90) / 100;
        }
        let soft = hard.saturating_mul(80) / 100;

        TimeController {
            start: Instant::now(),
            soft_ms: soft.max(1),
            hard_ms: hard.max(1),
            extra_ms: 0,
            limited: true,
        }
    }

    /// Restart the clock (ponderhit converts the running search).
    pub fn rebase(&mut self) {
        self.start = Instant::now();
    }

    /// Accumulate extra time: `factor_pct` of 150 adds half a hard budget.
    pub fn add_extra(&mut self, factor_pct: u64) {
        if !self.limited {
            return;
        }
        let extra = self.hard_ms.saturating_mul(factor_pct.saturating_sub(100)) / 100;
        self.extra_ms = self.extra_ms.saturating_add(extra);
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// May another depth iteration start?
    #[must_use]
    pub fn soft_limit_exceeded(&self) -> bool {
        self.limited && self.elapsed_ms() >= self.soft_ms + self.extra_ms.saturating_mul(80) / 100
    }

    /// Must the search unwind now?
    #[must_use]
    pub fn hard_limit_exceeded(&self) -> bool {
        self.limited && self.elapsed_ms() >= self.hard_ms + self.extra_ms
    }

    #[must_use]
    pub fn is_limited(&self) -> bool {
        self.limited
    }

    #[cfg(test)]
    pub(crate) fn budgets(&self) -> (u64, u64, u64) {
        (self.soft_ms, self.hard_ms, self.extra_ms)
    }
}
