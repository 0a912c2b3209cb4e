//! Board state: piece placement, side to move, castling rights, clocks,
//! repetition bookkeeping and the incremental evaluation accumulators.

use std::collections::HashMap;

use super::pst::{pst_square, MATERIAL, PHASE_WEIGHTS, PST_EG, PST_MG};
use super::{
    Bitboard, Color, Piece, Square, CASTLE_BLACK_K, CASTLE_BLACK_Q, CASTLE_WHITE_K, CASTLE_WHITE_Q,
};

/// State snapshot taken by `make_move`, consumed by `unmake_move`.
#[derive(Clone, Debug)]
pub struct UnmakeInfo {
    pub(crate) previous_en_passant_target: Option<Square>,
    pub(crate) previous_castling_rights: u8,
    pub(crate) previous_hash: u64,
    pub(crate) previous_halfmove_clock: u32,
    pub(crate) made_hash: u64,
    pub(crate) previous_repetition_count: u32,
    pub(crate) previous_eval_mg: [i32; 2],
    pub(crate) previous_eval_eg: [i32; 2],
    pub(crate) previous_material: [i32; 2],
    pub(crate) previous_game_phase: [i32; 2],
}

/// Snapshot for null moves, which only touch the EP target and the hash.
pub struct NullMoveInfo {
    pub(crate) previous_en_passant_target: Option<Square>,
    pub(crate) previous_hash: u64,
}

/// Counts how often each position hash occurred in the current game/line.
#[derive(Clone, Debug)]
pub(crate) struct RepetitionTable {
    counts: HashMap<u64, u32>,
}

impl RepetitionTable {
    pub(crate) fn new() -> Self {
        RepetitionTable {
            counts: HashMap::new(),
        }
    }

    pub(crate) fn get(&self, hash: u64) -> u32 {
        self.counts.get(&hash).copied().unwrap_or(0)
    }

    pub(crate) fn set(&mut self, hash: u64, count: u32) {
        if count == 0 {
            self.counts.remove(&hash);
        } else {
            self.counts.insert(hash, count);
        }
    }

    pub(crate) fn increment(&mut self, hash: u64) -> u32 {
        let next = self.get(hash).saturating_add(1);
        self.set(hash, next);
        next
    }
}

#[derive(Clone, Debug)]
pub struct Board {
    pub(crate) pieces: [[Bitboard; 6]; 2],
    pub(crate) occupied: [Bitboard; 2],
    pub(crate) all_occupied: Bitboard,
    pub(crate) white_to_move: bool,
    pub(crate) en_passant_target: Option<Square>,
    pub(crate) castling_rights: u8,
    pub(crate) hash: u64,
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove_number: u32,
    pub(crate) repetition_counts: RepetitionTable,
    // Incremental accumulators, maintained by make/unmake
    pub(crate) eval_mg: [i32; 2],
    pub(crate) eval_eg: [i32; 2],
    pub(crate) material: [i32; 2],
    pub(crate) game_phase: [i32; 2],
}

impl Board {
    /// The standard starting position.
    #[must_use]
    pub fn new() -> Self {
        let mut board = Board::empty();
        let back_rank = [
            Piece::Rook,
            Piece::Knight,
            Piece::Bishop,
            Piece::Queen,
            Piece::King,
            Piece::Bishop,
            Piece::Knight,
            Piece::Rook,
        ];
        for (file, piece) in back_rank.iter().enumerate() {
            board.set_piece(Square::new(0, file), Color::White, *piece);
            board.set_piece(Square::new(7, file), Color::Black, *piece);
            board.set_piece(Square::new(1, file), Color::White, Piece::Pawn);
            board.set_piece(Square::new(6, file), Color::Black, Piece::Pawn);
        }

        board.castling_rights = CASTLE_WHITE_K | CASTLE_WHITE_Q | CASTLE_BLACK_K | CASTLE_BLACK_Q;
        board.white_to_move = true;
        board.hash = board.calculate_initial_hash();
        board.repetition_counts.set(board.hash, 1);
        board.recalculate_accumulators();
        board
    }

    pub(crate) fn empty() -> Self {
        Board {
            pieces: [[Bitboard::EMPTY; 6]; 2],
            occupied: [Bitboard::EMPTY; 2],
            all_occupied: Bitboard::EMPTY,
            white_to_move: true,
            en_passant_target: None,
            castling_rights: 0,
            hash: 0,
            halfmove_clock: 0,
            fullmove_number: 1,
            repetition_counts: RepetitionTable::new(),
            eval_mg: [0, 0],
            eval_eg: [0, 0],
            material: [0, 0],
            game_phase: [0, 0],
        }
    }

    /// Recompute the incremental accumulators from scratch (after FEN parsing).
    pub(crate) fn recalculate_accumulators(&mut self) {
        self.eval_mg = [0, 0];
        self.eval_eg = [0, 0];
        self.material = [0, 0];
        self.game_phase = [0, 0];

        for color in [Color::White, Color::Black] {
            let c_idx = color.index();
            let is_white = color == Color::White;
            for piece_type in 0..6 {
                for sq in self.pieces[c_idx][piece_type] {
                    let pst_sq = pst_square(sq.index(), is_white);
                    self.eval_mg[c_idx] += MATERIAL[piece_type] + PST_MG[piece_type][pst_sq];
                    self.eval_eg[c_idx] += MATERIAL[piece_type] + PST_EG[piece_type][pst_sq];
                    self.material[c_idx] += MATERIAL[piece_type];
                    self.game_phase[c_idx] += PHASE_WEIGHTS[piece_type];
                }
            }
        }
    }

    #[must_use]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    #[must_use]
    pub fn white_to_move(&self) -> bool {
        self.white_to_move
    }

    #[inline]
    #[must_use]
    pub fn side_to_move(&self) -> Color {
        if self.white_to_move {
            Color::White
        } else {
            Color::Black
        }
    }

    #[must_use]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[must_use]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// How often the current position has occurred (including right now).
    #[must_use]
    pub fn repetition_count(&self) -> u32 {
        self.repetition_counts.get(self.hash)
    }

    /// Material balance in centipawns from the side to move's perspective.
    #[inline]
    #[must_use]
    pub fn material_balance(&self) -> i32 {
        let us = self.side_to_move().index();
        self.material[us] - self.material[1 - us]
    }

    /// Combined game phase of both sides, clamped to `PHASE_MAX`.
    #[inline]
    #[must_use]
    pub fn phase(&self) -> i32 {
        (self.game_phase[0] + self.game_phase[1]).min(super::pst::PHASE_MAX)
    }

    /// True when the side to move still has a piece bigger than a pawn,
    /// the null-move zugzwang guard.
    #[must_use]
    pub(crate) fn has_big_piece(&self) -> bool {
        let us = self.side_to_move().index();
        self.game_phase[us] > 0
    }

    /// Draw by the 50-move rule or threefold repetition.
    #[must_use]
    pub fn is_draw(&self) -> bool {
        if self.halfmove_clock >= 100 {
            return true;
        }
        self.repetition_count() >= 3
    }

    /// `is_draw` extended with insufficient mating material.
    #[must_use]
    pub fn is_theoretical_draw(&self) -> bool {
        self.is_draw() || self.is_insufficient_material()
    }

    pub(crate) fn is_insufficient_material(&self) -> bool {
        let white = Color::White.index();
        let black = Color::Black.index();

        let heavy_or_pawn = self.pieces[white][Piece::Pawn.index()].0
            | self.pieces[black][Piece::Pawn.index()].0
            | self.pieces[white][Piece::Rook.index()].0
            | self.pieces[black][Piece::Rook.index()].0
            | self.pieces[white][Piece::Queen.index()].0
            | self.pieces[black][Piece::Queen.index()].0;
        if heavy_or_pawn != 0 {
            return false;
        }

        let knights = self.pieces[white][Piece::Knight.index()].count()
            + self.pieces[black][Piece::Knight.index()].count();
        let bishops_bb = Bitboard(
            self.pieces[white][Piece::Bishop.index()].0
                | self.pieces[black][Piece::Bishop.index()].0,
        );
        let minors = knights + bishops_bb.count();

        if minors <= 1 {
            return true;
        }

        if knights == 0 && bishops_bb.count() == 2 {
            return bishops_all_same_color(bishops_bb.0);
        }

        false
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

fn bishops_all_same_color(bishops: u64) -> bool {
    const LIGHT_SQUARES: u64 = 0x55AA_55AA_55AA_55AA;
    const DARK_SQUARES: u64 = 0xAA55_AA55_AA55_AA55;

    (bishops & LIGHT_SQUARES == 0) || (bishops & DARK_SQUARES == 0)
}
