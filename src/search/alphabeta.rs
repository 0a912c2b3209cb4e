//! The main negamax search with principal-variation windows and the
//! forward-pruning toolbox.
//!
//! Checks at node entry run cheapest-first: repetition/50-move draws,
//! mate-distance pruning and the hash probe all come before the static
//! evaluation and move generation. Null move is gated on a non-pawn
//! piece being present for the mover, so zugzwang positions keep their
//! full-width search.

use crate::board::{Move, Piece};
use crate::tt::Bound;

use super::constants::{CHECKMATE, DRAW, INFINITE, MATE_THRESHOLD};
use super::Worker;

impl Worker<'_> {
    /// Search a non-root node. Callers pass a null window (`beta ==
    /// alpha + 1`) for non-PV nodes; mate values are encoded as
    /// `+/-(CHECKMATE - ply)`.
    #[allow(clippy::too_many_lines)]
    pub(crate) fn search(
        &mut self,
        depth: i32,
        ply: usize,
        mut alpha: i32,
        mut beta: i32,
        is_pv: bool,
        may_null: bool,
    ) -> i32 {
        use crate::board::MAX_PLY;

        self.pv[ply].clear();
        self.mate_threat[ply] = false;

        if depth <= 0 || ply >= MAX_PLY - 1 {
            return self.quiescence(ply, alpha, beta, is_pv);
        }

        self.counters.nodes_visited += 1;
        if self.check_abort() {
            return 0;
        }

        // Repetition or 50-move rule: score with contempt so the engine
        // does not drift into easy draws from better positions
        if self.board.halfmove_clock() >= 100 || self.board.repetition_count() >= 2 {
            return self.contempt();
        }

        // Mate distance pruning
        alpha = alpha.max(-CHECKMATE + ply as i32);
        beta = beta.min(CHECKMATE - ply as i32);
        if alpha >= beta {
            return alpha;
        }

        // Transposition table probe
        let mut tt_move = Move::NONE;
        self.counters.tt_probes += 1;
        if let Some(hit) = self.tt.probe(self.board.hash(), ply) {
            self.counters.tt_hits += 1;
            tt_move = hit.best_move;
            if hit.mate_threat {
                self.mate_threat[ply] = true;
            }
            if hit.depth >= depth {
                let cutoff = match hit.bound {
                    Bound::Exact => true,
                    Bound::Lower => !is_pv && hit.value >= beta,
                    Bound::Upper => !is_pv && hit.value <= alpha,
                };
                if cutoff {
                    self.counters.tt_cutoffs += 1;
                    return hit.value;
                }
            }
        }

        let us = self.board.side_to_move();
        let in_check = self.board.is_in_check(us);
        let static_eval = self.board.evaluate();

        // Forward prunings, never in PV nodes or in check
        if !is_pv && !in_check {
            // Reverse futility at the frontier
            if self.params.use_rfp && depth == 1 && may_null {
                let margin = self.params.rfp_margin;
                if static_eval - margin >= beta {
                    self.counters.rfp_prunings += 1;
                    let value = static_eval - margin;
                    self.tt_store(depth, ply, value, Bound::Lower, Move::NONE);
                    return value;
                }
            }

            // Null move: hand the opponent a free shot; if even that
            // fails high, this node is a cutoff
            if self.params.use_null_move
                && may_null
                && depth >= self.params.null_move_depth
                && !self.mate_threat[ply]
                && static_eval >= beta
                && self.board.has_big_piece()
            {
                if let Some(value) = self.try_null_move(depth, ply, alpha, beta) {
                    return value;
                }
            }

            // Razoring: hopeless shallow nodes drop straight to quiescence
            if self.params.use_razoring
                && depth <= self.params.razor_depth
                && !self.mate_threat[ply]
                && static_eval + self.params.razor_margin <= alpha
            {
                self.counters.razor_drops += 1;
                return self.quiescence(ply, alpha, beta, is_pv);
            }
        }

        // Move loop over the staged per-ply generator
        self.gens[ply].reset(tt_move, self.killers.at(ply));

        let mut best_value = -INFINITE;
        let mut best_move = Move::NONE;
        let mut raised_alpha = false;
        let mut searched_moves: usize = 0;

        loop {
            let Some(m) = self.gens[ply].next(&self.board) else {
                break;
            };

            // Under-promotions to rook or bishop are never best in practice
            if let Some(promo) = m.promoted() {
                if promo == Piece::Rook || promo == Piece::Bishop {
                    self.counters.minor_promotion_prunings += 1;
                    continue;
                }
            }

            // Checks, mate threats and tactical moves are exempt from
            // every reduction and pruning below (conservative extension)
            let exempt = in_check || self.mate_threat[ply] || m.is_tactical();

            let mut child_depth = depth - 1;
            if searched_moves >= 1 && !exempt {
                let capture_gain = m.captured().map_or(0, Piece::value);
                let material = self.board.material_balance();

                if self.params.use_futility {
                    // Limited razoring at the pre-pre-frontier
                    if depth == 3 && material + capture_gain + Piece::Queen.value() <= alpha {
                        self.counters.limited_razor_reductions += 1;
                        child_depth = depth - 2;
                    }
                    // Extended futility at the pre-frontier
                    if depth == 2 && material + capture_gain + Piece::Rook.value() <= alpha {
                        self.counters.extended_futility_prunings += 1;
                        continue;
                    }
                    // Futility at the frontier
                    if depth == 1 && material + capture_gain + 2 * Piece::Pawn.value() <= alpha {
                        self.counters.futility_prunings += 1;
                        best_value = best_value.max(material + capture_gain);
                        continue;
                    }
                }

                // Late move pruning: shallow nodes stop trying late quiets
                if self.params.use_lmp
                    && depth < self.params.lmp_min_depth
                    && searched_moves >= self.params.lmp_min_moves
                {
                    self.counters.lmp_prunings += 1;
                    continue;
                }

                // Late move reduction
                if self.params.use_lmr
                    && depth >= self.params.lmr_min_depth
                    && searched_moves >= self.params.lmr_min_moves
                {
                    self.counters.lmr_reductions += 1;
                    child_depth -= self.params.lmr_reduction;
                }
            }

            let info = self.board.make_move(m);
            // The generator streams pseudo-legal moves
            if self.board.is_in_check(us) {
                self.board.unmake_move(m, info);
                continue;
            }
            self.current_variation.push(m);

            let is_first = searched_moves == 0;
            let value = if is_first || !self.params.use_pvs {
                -self.search(child_depth, ply + 1, -beta, -alpha, is_pv, true)
            } else {
                let mut v = -self.search(child_depth, ply + 1, -alpha - 1, -alpha, false, true);
                if child_depth < depth - 1 && v > alpha && !self.stopped {
                    // Reduced search broke alpha: verify at full depth
                    v = -self.search(depth - 1, ply + 1, -alpha - 1, -alpha, false, true);
                }
                if v > alpha && v < beta && !self.stopped {
                    // The null window was wrong here: this is a new PV
                    v = -self.search(depth - 1, ply + 1, -beta, -alpha, true, true);
                }
                v
            };

            self.board.unmake_move(m, info);
            self.current_variation.pop();
            searched_moves += 1;

            if self.stopped {
                break;
            }

            if value > best_value {
                best_value = value;
                best_move = m;

                if value > alpha {
                    if value >= beta {
                        self.counters.beta_cutoffs += 1;
                        if !m.is_tactical() {
                            self.killers.record(ply, m);
                        }
                        self.tt_store(depth, ply, value, Bound::Lower, m);
                        return value;
                    }
                    alpha = value;
                    raised_alpha = true;
                    self.write_pv(ply, m);
                }
            }
        }

        // Every pruning above requires one searched move first, so an
        // empty loop means there was no legal move at all
        if searched_moves == 0 {
            return if in_check {
                -CHECKMATE + ply as i32
            } else {
                DRAW
            };
        }

        let bound = if raised_alpha {
            Bound::Exact
        } else {
            Bound::Upper
        };
        self.tt_store(depth, ply, best_value, bound, best_move);

        best_value
    }

    /// Null-move pruning with optional verification. Returns the cutoff
    /// value when the node can be pruned.
    fn try_null_move(&mut self, depth: i32, ply: usize, alpha: i32, beta: i32) -> Option<i32> {
        let verify =
            self.params.null_verification && depth > self.params.null_verification_depth;
        let mut r = if depth > 6 { 3 } else { 2 };
        if verify {
            r += 1;
        }

        let info = self.board.make_null_move();
        let value = -self.search(depth - r - 1, ply + 1, -beta, -beta + 1, false, false);
        self.board.unmake_null_move(info);

        if self.stopped {
            return None;
        }

        if value >= beta {
            let confirmed = if verify {
                let v = self.search(depth - r, ply, alpha, beta, false, false);
                !self.stopped && v >= beta
            } else {
                true
            };
            if confirmed {
                self.counters.null_cutoffs += 1;
                self.tt_store(depth, ply, value, Bound::Lower, Move::NONE);
                return Some(value);
            }
        } else if value <= -MATE_THRESHOLD {
            // Passing loses to a forced mate: remember the threat so
            // later reductions at this ply stay conservative
            self.mate_threat[ply] = true;
        }

        None
    }
}
