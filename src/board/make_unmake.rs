//! Making and unmaking moves with incremental hash and evaluation updates.
//!
//! Every path through `make_move` is exactly reversed by `unmake_move`;
//! the search relies on that balance holding across captures, castling,
//! en passant, promotions and null moves.

use crate::zobrist::ZOBRIST;

use super::pst::{pst_square, MATERIAL, PHASE_WEIGHTS, PST_EG, PST_MG};
use super::{castle_bit, Board, Color, Move, MoveKind, NullMoveInfo, Piece, Square, UnmakeInfo};

impl Board {
    pub(crate) fn has_castling_right(&self, color: Color, side: char) -> bool {
        self.castling_rights & castle_bit(color, side) != 0
    }

    pub(crate) fn set_piece(&mut self, sq: Square, color: Color, piece: Piece) {
        let c_idx = color.index();
        self.pieces[c_idx][piece.index()].set(sq);
        self.occupied[c_idx].set(sq);
        self.all_occupied.set(sq);
    }

    pub(crate) fn remove_piece(&mut self, sq: Square, color: Color, piece: Piece) {
        let c_idx = color.index();
        self.pieces[c_idx][piece.index()].clear(sq);
        self.occupied[c_idx].clear(sq);
        self.all_occupied.clear(sq);
    }

    /// Piece and color on a square, if occupied.
    #[must_use]
    pub fn piece_at(&self, sq: Square) -> Option<(Color, Piece)> {
        if !self.all_occupied.contains(sq) {
            return None;
        }

        let color = if self.occupied[0].contains(sq) {
            Color::White
        } else {
            Color::Black
        };
        let c_idx = color.index();
        for p_idx in 0..6 {
            if self.pieces[c_idx][p_idx].contains(sq) {
                return Some((color, Piece::from_index(p_idx)));
            }
        }

        None
    }

    #[inline]
    pub(crate) fn is_empty_square(&self, sq: Square) -> bool {
        !self.all_occupied.contains(sq)
    }

    /// Full Zobrist hash of the current position, computed from scratch.
    pub(crate) fn calculate_initial_hash(&self) -> u64 {
        let mut hash: u64 = 0;

        for idx in 0..64 {
            let sq = Square::from_index(idx);
            if let Some((color, piece)) = self.piece_at(sq) {
                hash ^= ZOBRIST.piece(piece, color, sq);
            }
        }

        if !self.white_to_move {
            hash ^= ZOBRIST.black_to_move_key;
        }

        if self.castling_rights & super::CASTLE_WHITE_K != 0 {
            hash ^= ZOBRIST.castling_keys[0][0];
        }
        if self.castling_rights & super::CASTLE_WHITE_Q != 0 {
            hash ^= ZOBRIST.castling_keys[0][1];
        }
        if self.castling_rights & super::CASTLE_BLACK_K != 0 {
            hash ^= ZOBRIST.castling_keys[1][0];
        }
        if self.castling_rights & super::CASTLE_BLACK_Q != 0 {
            hash ^= ZOBRIST.castling_keys[1][1];
        }

        if let Some(ep_square) = self.en_passant_target {
            hash ^= ZOBRIST.en_passant_keys[ep_square.file()];
        }

        hash
    }

    /// Add a piece to the accumulators.
    #[inline]
    fn account_add(&mut self, c_idx: usize, piece: Piece, sq: Square, is_white: bool) {
        let p_idx = piece.index();
        let pst_sq = pst_square(sq.index(), is_white);
        self.eval_mg[c_idx] += MATERIAL[p_idx] + PST_MG[p_idx][pst_sq];
        self.eval_eg[c_idx] += MATERIAL[p_idx] + PST_EG[p_idx][pst_sq];
        self.material[c_idx] += MATERIAL[p_idx];
        self.game_phase[c_idx] += PHASE_WEIGHTS[p_idx];
    }

    /// Remove a piece from the accumulators.
    #[inline]
    fn account_remove(&mut self, c_idx: usize, piece: Piece, sq: Square, is_white: bool) {
        let p_idx = piece.index();
        let pst_sq = pst_square(sq.index(), is_white);
        self.eval_mg[c_idx] -= MATERIAL[p_idx] + PST_MG[p_idx][pst_sq];
        self.eval_eg[c_idx] -= MATERIAL[p_idx] + PST_EG[p_idx][pst_sq];
        self.material[c_idx] -= MATERIAL[p_idx];
        self.game_phase[c_idx] -= PHASE_WEIGHTS[p_idx];
    }

    /// Square actually holding the victim of `m` (differs from `m.to()`
    /// only for en passant).
    #[inline]
    fn capture_square(m: Move, is_white: bool) -> Square {
        if m.is_en_passant() {
            let rank = if is_white {
                m.to().rank() - 1
            } else {
                m.to().rank() + 1
            };
            Square::new(rank, m.to().file())
        } else {
            m.to()
        }
    }

    /// Move the rook for a castling move and return its hash delta.
    fn execute_castling_rook(&mut self, m: Move, color: Color, c_idx: usize, is_white: bool) -> u64 {
        let (rook_from_f, rook_to_f) = if m.to().file() == 6 { (7, 5) } else { (0, 3) };
        let rook_from = Square::new(m.to().rank(), rook_from_f);
        let rook_to = Square::new(m.to().rank(), rook_to_f);

        self.remove_piece(rook_from, color, Piece::Rook);
        self.set_piece(rook_to, color, Piece::Rook);
        self.account_remove(c_idx, Piece::Rook, rook_from, is_white);
        self.account_add(c_idx, Piece::Rook, rook_to, is_white);

        ZOBRIST.piece(Piece::Rook, color, rook_from) ^ ZOBRIST.piece(Piece::Rook, color, rook_to)
    }

    /// Update castling rights for a move and return the hash delta.
    fn update_castling_rights(&mut self, m: Move, color: Color) -> u64 {
        let mut hash_delta: u64 = 0;

        if m.piece() == Piece::King {
            if self.has_castling_right(color, 'K') {
                hash_delta ^= ZOBRIST.castling_keys[color.index()][0];
                self.castling_rights &= !castle_bit(color, 'K');
            }
            if self.has_castling_right(color, 'Q') {
                hash_delta ^= ZOBRIST.castling_keys[color.index()][1];
                self.castling_rights &= !castle_bit(color, 'Q');
            }
        } else if m.piece() == Piece::Rook {
            let start_rank = if color == Color::White { 0 } else { 7 };
            if m.from() == Square::new(start_rank, 0) && self.has_castling_right(color, 'Q') {
                hash_delta ^= ZOBRIST.castling_keys[color.index()][1];
                self.castling_rights &= !castle_bit(color, 'Q');
            } else if m.from() == Square::new(start_rank, 7) && self.has_castling_right(color, 'K') {
                hash_delta ^= ZOBRIST.castling_keys[color.index()][0];
                self.castling_rights &= !castle_bit(color, 'K');
            }
        }

        // Capturing a rook on its home square revokes the opponent's right
        if m.captured() == Some(Piece::Rook) && !m.is_en_passant() {
            let them = color.opponent();
            let start_rank = if them == Color::White { 0 } else { 7 };
            if m.to() == Square::new(start_rank, 0) && self.has_castling_right(them, 'Q') {
                hash_delta ^= ZOBRIST.castling_keys[them.index()][1];
                self.castling_rights &= !castle_bit(them, 'Q');
            } else if m.to() == Square::new(start_rank, 7) && self.has_castling_right(them, 'K') {
                hash_delta ^= ZOBRIST.castling_keys[them.index()][0];
                self.castling_rights &= !castle_bit(them, 'K');
            }
        }

        hash_delta
    }

    pub fn make_move(&mut self, m: Move) -> UnmakeInfo {
        debug_assert!(!m.is_none(), "make_move called with the NONE sentinel");

        let previous_hash = self.hash;
        let previous_en_passant_target = self.en_passant_target;
        let previous_castling_rights = self.castling_rights;
        let previous_halfmove_clock = self.halfmove_clock;
        let previous_eval_mg = self.eval_mg;
        let previous_eval_eg = self.eval_eg;
        let previous_material = self.material;
        let previous_game_phase = self.game_phase;

        let color = self.side_to_move();
        let c_idx = color.index();
        let opp_idx = 1 - c_idx;
        let is_white = color == Color::White;
        let them = color.opponent();

        let mut hash = self.hash ^ ZOBRIST.black_to_move_key;

        if let Some(old_ep) = self.en_passant_target {
            hash ^= ZOBRIST.en_passant_keys[old_ep.file()];
        }

        // Remove the victim
        if let Some(victim) = m.captured() {
            let cap_sq = Self::capture_square(m, is_white);
            self.remove_piece(cap_sq, them, victim);
            self.account_remove(opp_idx, victim, cap_sq, !is_white);
            hash ^= ZOBRIST.piece(victim, them, cap_sq);
        }

        // Lift the mover
        let mover = m.piece();
        self.remove_piece(m.from(), color, mover);
        self.account_remove(c_idx, mover, m.from(), is_white);
        hash ^= ZOBRIST.piece(mover, color, m.from());

        // Place the mover (promoted piece for promotions)
        let placed = m.promoted().unwrap_or(mover);
        self.set_piece(m.to(), color, placed);
        self.account_add(c_idx, placed, m.to(), is_white);
        hash ^= ZOBRIST.piece(placed, color, m.to());

        if m.is_castling() {
            hash ^= self.execute_castling_rook(m, color, c_idx, is_white);
        }

        // New en passant target after a double pawn push
        self.en_passant_target = None;
        if mover == Piece::Pawn
            && m.kind() == MoveKind::Normal
            && m.from().rank().abs_diff(m.to().rank()) == 2
        {
            let ep_sq = Square::new((m.from().rank() + m.to().rank()) / 2, m.from().file());
            self.en_passant_target = Some(ep_sq);
            hash ^= ZOBRIST.en_passant_keys[ep_sq.file()];
        }

        if mover == Piece::Pawn || m.is_capture() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }

        hash ^= self.update_castling_rights(m, color);

        if !is_white {
            self.fullmove_number += 1;
        }
        self.white_to_move = !self.white_to_move;
        self.hash = hash;

        let previous_repetition_count = self.repetition_counts.get(hash);
        self.repetition_counts.increment(hash);

        UnmakeInfo {
            previous_en_passant_target,
            previous_castling_rights,
            previous_hash,
            previous_halfmove_clock,
            made_hash: hash,
            previous_repetition_count,
            previous_eval_mg,
            previous_eval_eg,
            previous_material,
            previous_game_phase,
        }
    }

    pub fn unmake_move(&mut self, m: Move, info: UnmakeInfo) {
        self.repetition_counts
            .set(info.made_hash, info.previous_repetition_count);

        self.white_to_move = !self.white_to_move;
        self.en_passant_target = info.previous_en_passant_target;
        self.castling_rights = info.previous_castling_rights;
        self.hash = info.previous_hash;
        self.halfmove_clock = info.previous_halfmove_clock;
        self.eval_mg = info.previous_eval_mg;
        self.eval_eg = info.previous_eval_eg;
        self.material = info.previous_material;
        self.game_phase = info.previous_game_phase;

        let color = self.side_to_move();
        let them = color.opponent();
        let is_white = color == Color::White;

        if !is_white {
            self.fullmove_number -= 1;
        }

        // Take the placed piece off the target square and restore the mover
        let placed = m.promoted().unwrap_or_else(|| m.piece());
        self.remove_piece(m.to(), color, placed);
        self.set_piece(m.from(), color, m.piece());

        if m.is_castling() {
            let (rook_from_f, rook_to_f) = if m.to().file() == 6 { (7, 5) } else { (0, 3) };
            let rook_home = Square::new(m.to().rank(), rook_from_f);
            let rook_moved = Square::new(m.to().rank(), rook_to_f);
            self.remove_piece(rook_moved, color, Piece::Rook);
            self.set_piece(rook_home, color, Piece::Rook);
        }

        if let Some(victim) = m.captured() {
            let cap_sq = Self::capture_square(m, is_white);
            self.set_piece(cap_sq, them, victim);
        }
    }

    pub fn make_null_move(&mut self) -> NullMoveInfo {
        let previous_hash = self.hash;
        let previous_en_passant_target = self.en_passant_target;

        let mut hash = self.hash ^ ZOBRIST.black_to_move_key;
        if let Some(old_ep) = self.en_passant_target {
            hash ^= ZOBRIST.en_passant_keys[old_ep.file()];
        }
        self.en_passant_target = None;
        self.white_to_move = !self.white_to_move;
        self.hash = hash;

        NullMoveInfo {
            previous_en_passant_target,
            previous_hash,
        }
    }

    pub fn unmake_null_move(&mut self, info: NullMoveInfo) {
        self.white_to_move = !self.white_to_move;
        self.en_passant_target = info.previous_en_passant_target;
        self.hash = info.previous_hash;
    }
}
