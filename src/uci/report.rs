//! Formatting of engine output lines.
//!
//! `StdoutSink` is the `SearchSink` the UCI loop hands to the search:
//! it turns reports into `info` lines and results into the one
//! `bestmove` line, each written atomically to stdout.

use std::io::Write;

use crate::search::constants::{CHECKMATE, MATE_THRESHOLD};
use crate::search::{SearchReport, SearchResult, SearchSink};
use crate::tt::Bound;

/// Format a score as `cp <v>` or `mate <n>` (negative when being mated).
#[must_use]
pub fn format_score(value: i32) -> String {
    if value.abs() < MATE_THRESHOLD {
        return format!("cp {value}");
    }
    let plies = CHECKMATE - value.abs();
    let moves = (plies + 1) / 2;
    if value > 0 {
        format!("mate {moves}")
    } else {
        format!("mate -{moves}")
    }
}

pub struct StdoutSink;

impl StdoutSink {
    fn emit(line: &str) {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        let _ = writeln!(lock, "{line}");
        let _ = lock.flush();
    }
}

impl SearchSink for StdoutSink {
    fn send_report(&self, report: SearchReport) {
        let line = match report {
            SearchReport::Iteration {
                depth,
                sel_depth,
                value,
                bound,
                nodes,
                nps,
                time_ms,
                hashfull: _,
                pv,
            } => {
                let bound_marker = match bound {
                    Bound::Exact => "",
                    Bound::Lower => " lowerbound",
                    Bound::Upper => " upperbound",
                };
                format!(
                    "info depth {depth} seldepth {sel_depth} multipv 1 score {}{bound_marker} \
                     nodes {nodes} nps {nps} time {time_ms} pv {pv}",
                    format_score(value)
                )
            }
            SearchReport::Status {
                nodes,
                nps,
                time_ms,
                hashfull,
            } => {
                format!("info nodes {nodes} nps {nps} time {time_ms} hashfull {hashfull}")
            }
            SearchReport::CurrentMove { mv, number } => {
                format!("info currmove {mv} currmovenumber {number}")
            }
            SearchReport::CurrentLine { line } => format!("info currline {line}"),
            SearchReport::Perft {
                depth,
                stats,
                time_ms,
            } => format!(
                "info string perft depth {depth} nodes {} captures {} ep {} checks {} mates {} \
                 time {time_ms}",
                stats.nodes, stats.captures, stats.en_passants, stats.checks, stats.checkmates
            ),
        };
        Self::emit(&line);
    }

    fn send_result(&self, result: &SearchResult) {
        let line = match result.ponder_move {
            Some(ponder) if !result.best_move.is_none() => {
                format!("bestmove {} ponder {ponder}", result.best_move)
            }
            _ => format!("bestmove {}", result.best_move),
        };
        Self::emit(&line);
    }
}
