//! Iterative deepening: the outer loop that drives the alpha-beta
//! search depth by depth, chooses the root window (full, aspiration or
//! MTD(f)), keeps the root move list ordered and decides when to stop.

use crate::board::{Move, MoveList};
use crate::tt::Bound;

use super::constants::{CHECKMATE, DRAW, INFINITE, MATE_THRESHOLD};
use super::{RootMove, SearchMode, SearchReport, SearchResult, Worker};

impl Worker<'_> {
    /// Run the whole search and publish the result. Called on the worker
    /// thread.
    pub(crate) fn run(&mut self) -> SearchResult {
        self.counters.reset();
        self.killers.clear();
        self.tt.age_entries();
        for line in &mut self.pv {
            line.clear();
        }
        self.mate_threat.fill(false);
        self.single_reply.fill(false);
        self.sel_depth = 0;
        self.best_move_changes = 0;
        self.stopped = false;

        if let SearchMode::Perft(depth) = self.mode {
            return self.run_perft(depth);
        }

        // Opening book: answer immediately while the position is known
        if let Some(mv) = self.book_move() {
            let result = SearchResult {
                best_move: mv,
                ponder_move: None,
                value: DRAW,
                depth: 0,
                sel_depth: 0,
                nodes: 0,
                elapsed: self.timing.elapsed(),
            };
            return self.finish(result);
        }
        if matches!(self.mode, SearchMode::TimeControl { .. }) {
            self.leave_book();
        }

        self.collect_root_moves();

        if self.root_moves.is_empty() {
            // Mate or stalemate on the board: there is nothing to search
            let in_check = self.board.is_in_check(self.board.side_to_move());
            let result = SearchResult {
                best_move: Move::NONE,
                ponder_move: None,
                value: if in_check { -CHECKMATE } else { DRAW },
                depth: 0,
                sel_depth: 0,
                nodes: 0,
                elapsed: self.timing.elapsed(),
            };
            return self.finish(result);
        }

        if self.root_moves.len() == 1 {
            self.single_reply[0] = true;
            self.timing.add_extra(150);
        }

        // Seed the starting depth and window from a previous search of
        // this position
        let mut start_depth = 1;
        let mut last_value: Option<i32> = None;
        if let Some(hit) = self.tt.probe(self.board.hash(), 0) {
            if !hit.best_move.is_none() {
                if let Some(pos) = self.root_moves.iter().position(|r| r.mv == hit.best_move) {
                    self.root_moves[..=pos].rotate_right(1);
                }
            }
            if hit.bound == Bound::Exact && hit.depth >= 1 {
                start_depth = (hit.depth + 1).min(self.max_depth);
                last_value = Some(hit.value);
            }
        }

        let mut best_value = last_value.unwrap_or(-INFINITE);
        let mut completed_depth = 0;
        let mut last_pv = MoveList::new();

        for depth in start_depth..=self.max_depth {
            let value = if self.params.use_mtdf {
                let seed = last_value.unwrap_or_else(|| self.board.evaluate());
                self.mtdf(depth, seed)
            } else {
                self.aspiration(depth, last_value)
            };

            // A stopped iteration never overwrites the previous best
            if self.stopped {
                break;
            }

            best_value = value;
            last_value = Some(value);
            completed_depth = depth;
            last_pv = self.pv[0].clone();

            self.reorder_root_moves();
            self.send_iteration_report(depth, value, Bound::Exact);

            // An unstable best move wants more time
            if depth > 4 && i64::from(self.best_move_changes) > i64::from(depth) / 2 + 1 {
                self.timing.add_extra(140);
            }
            self.best_move_changes = 0;

            if self.mate_proven(best_value, depth) {
                break;
            }
            if !self.pondering && self.timing.soft_limit_exceeded() {
                break;
            }
        }

        let best_move = last_pv
            .first()
            .or_else(|| self.root_moves.first().map(|r| r.mv))
            .unwrap_or(Move::NONE);
        let result = SearchResult {
            best_move,
            ponder_move: last_pv.get(1),
            value: best_value,
            depth: completed_depth,
            sel_depth: self.sel_depth,
            nodes: self.counters.nodes_visited,
            elapsed: self.timing.elapsed(),
        };
        self.finish(result)
    }

    fn run_perft(&mut self, depth: i32) -> SearchResult {
        let stats = self.board.perft_detailed(depth.max(0) as usize);
        self.send_report(SearchReport::Perft {
            depth,
            stats,
            time_ms: self.timing.elapsed_ms(),
        });
        let result = SearchResult {
            best_move: Move::NONE,
            ponder_move: None,
            value: DRAW,
            depth,
            sel_depth: 0,
            nodes: stats.nodes,
            elapsed: self.timing.elapsed(),
        };
        self.finish(result)
    }

    /// Generate the legal root moves, applying the `searchmoves`
    /// restriction when present.
    fn collect_root_moves(&mut self) {
        let legal = self.board.generate_moves();

        let mut restriction = Vec::new();
        for uci in self.search_moves_cloned() {
            if let Ok(mv) = self.board.parse_move(&uci) {
                restriction.push(mv);
            }
        }

        self.root_moves = legal
            .iter()
            .filter(|m| restriction.is_empty() || restriction.contains(m))
            .map(|m| RootMove {
                mv: *m,
                value: -INFINITE,
            })
            .collect();
    }

    /// Sort the root list by the values of the finished iteration and put
    /// the PV move at its head for the next one.
    fn reorder_root_moves(&mut self) {
        self.root_moves.sort_by(|a, b| b.value.cmp(&a.value));
        if let Some(pv_head) = self.pv[0].first() {
            if let Some(pos) = self.root_moves.iter().position(|r| r.mv == pv_head) {
                self.root_moves[..=pos].rotate_right(1);
            }
        }
    }

    /// Root window control: try a narrow window around the previous
    /// value, widen once on the failed side, then give up and search the
    /// full window.
    fn aspiration(&mut self, depth: i32, last_value: Option<i32>) -> i32 {
        let usable = self.params.use_aspiration
            && depth >= self.params.aspiration_start_depth
            && last_value.is_some_and(|v| v.abs() < MATE_THRESHOLD);
        let Some(prev) = last_value.filter(|_| usable) else {
            return self.search_root(depth, -INFINITE, INFINITE);
        };

        let window = self.params.aspiration_window;
        let wide = self.params.aspiration_window_wide;
        let mut alpha = (prev - window).max(-INFINITE);
        let mut beta = (prev + window).min(INFINITE);

        let mut value = self.search_root(depth, alpha, beta);
        if self.stopped {
            return prev;
        }

        if value <= alpha {
            // Fail low is the dangerous direction: report, fund the
            // re-search with extra time and widen downwards
            self.counters.aspiration_researches += 1;
            self.send_iteration_report(depth, value, Bound::Upper);
            self.timing.add_extra(130);
            alpha = (prev - wide).max(-INFINITE);
            value = self.search_root(depth, alpha, beta);
        } else if value >= beta {
            self.counters.aspiration_researches += 1;
            self.send_iteration_report(depth, value, Bound::Lower);
            beta = (prev + wide).min(INFINITE);
            value = self.search_root(depth, alpha, beta);
        } else {
            return value;
        }

        if self.stopped {
            return prev;
        }
        if value <= alpha || value >= beta {
            // Second failure: the position changed character, search wide
            self.counters.aspiration_researches += 1;
            value = self.search_root(depth, -INFINITE, INFINITE);
            if self.stopped {
                return prev;
            }
        }
        value
    }

    /// MTD(f): converge on the minimax value with a sequence of
    /// null-window searches, tightening one bound per probe.
    fn mtdf(&mut self, depth: i32, first_guess: i32) -> i32 {
        let mut g = first_guess;
        let mut lower = -INFINITE;
        let mut upper = INFINITE;
        let mut best_pv = MoveList::new();

        while lower < upper {
            if self.stopped {
                break;
            }
            let probe = if g == lower { g + 1 } else { g };
            g = self.search_root(depth, probe - 1, probe);
            if g < probe {
                upper = g;
            } else {
                lower = g;
            }
            // Fail-low probes leave no PV; keep the best line seen
            if !self.pv[0].is_empty() {
                best_pv = self.pv[0].clone();
            }
        }

        if self.pv[0].is_empty() && !best_pv.is_empty() {
            self.pv[0] = best_pv;
        }
        g
    }

    /// Search the root move list at the given depth and window.
    fn search_root(&mut self, depth: i32, mut alpha: i32, beta: i32) -> i32 {
        self.pv[0].clear();
        self.mate_threat[0] = false;

        let us = self.board.side_to_move();
        let single_reply = self.single_reply[0];
        let snapshot: Vec<Move> = self.root_moves.iter().map(|r| r.mv).collect();

        let mut best_value = -INFINITE;
        let mut best_move = Move::NONE;
        let mut raised_alpha = false;

        for (i, m) in snapshot.iter().copied().enumerate() {
            if self.timing.elapsed_ms() >= 500 {
                self.send_report(SearchReport::CurrentMove { mv: m, number: i + 1 });
            }

            let info = self.board.make_move(m);
            debug_assert!(!self.board.is_in_check(us), "illegal root move {m}");
            self.current_variation.push(m);

            let value = if i == 0 || !self.params.use_pvs {
                -self.search(depth - 1, 1, -beta, -alpha, true, true)
            } else {
                let mut v = -self.search(depth - 1, 1, -alpha - 1, -alpha, false, true);
                if v > alpha && v < beta && !self.stopped {
                    v = -self.search(depth - 1, 1, -beta, -alpha, true, true);
                }
                v
            };

            self.board.unmake_move(m, info);
            self.current_variation.pop();

            if self.stopped {
                break;
            }

            if let Some(entry) = self.root_moves.iter_mut().find(|r| r.mv == m) {
                entry.value = value;
            }

            if value > best_value {
                best_value = value;
                best_move = m;

                if value > alpha {
                    if value >= beta {
                        self.counters.beta_cutoffs += 1;
                        if !m.is_tactical() {
                            self.killers.record(0, m);
                        }
                        self.tt_store(depth, 0, value, Bound::Lower, m);
                        return value;
                    }
                    alpha = value;
                    raised_alpha = true;
                    if i > 0 {
                        self.best_move_changes += 1;
                    }
                    self.write_pv(0, m);
                }
            }

            // A forced move always finishes its iteration for a usable
            // ponder move
            if !single_reply && !self.pondering && self.timing.soft_limit_exceeded() {
                break;
            }
        }

        let bound = if raised_alpha {
            Bound::Exact
        } else {
            Bound::Upper
        };
        self.tt_store(depth, 0, best_value, bound, best_move);

        best_value
    }

    /// Stop deepening once a mate is proven within the searched horizon,
    /// or within the requested distance in mate-search mode.
    fn mate_proven(&self, value: i32, depth: i32) -> bool {
        if value.abs() < MATE_THRESHOLD {
            return false;
        }
        let mate_plies = CHECKMATE - value.abs();
        if let SearchMode::MateIn(moves) = self.mode {
            return value >= CHECKMATE - (2 * moves - 1);
        }
        mate_plies <= depth
    }

    fn send_iteration_report(&self, depth: i32, value: i32, bound: Bound) {
        let pv = if self.pv[0].is_empty() {
            self.root_moves
                .first()
                .map(|r| r.mv.to_string())
                .unwrap_or_default()
        } else {
            self.pv[0].to_string()
        };
        self.send_report(SearchReport::Iteration {
            depth,
            sel_depth: self.sel_depth,
            value,
            bound,
            nodes: self.counters.nodes_visited,
            nps: self.nps(),
            time_ms: self.timing.elapsed_ms(),
            hashfull: self.tt.hashfull_per_mille(),
            pv,
        });
    }
}
