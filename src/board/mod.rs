//! Chess board representation and game logic.
//!
//! Uses bitboards for move generation and keeps the evaluation, material
//! and game-phase accumulators incrementally up to date across make/unmake.
//!
//! # Example
//! ```
//! use rampart::board::Board;
//!
//! let mut board = Board::new();
//! let moves = board.generate_moves();
//! assert_eq!(moves.len(), 20);
//! ```

mod attack_tables;
mod error;
mod eval;
mod fen;
mod make_unmake;
mod movegen;
mod pst;
mod state;
mod types;

#[cfg(test)]
mod tests;

pub use error::{FenError, MoveParseError, SquareError};
pub use movegen::PerftStats;
pub use state::{Board, NullMoveInfo, UnmakeInfo};
pub use types::{
    Bitboard, Color, Move, MoveKind, MoveList, Piece, ScoredMove, ScoredMoveList, Square, MAX_PLY,
};

pub(crate) use types::{
    castle_bit, file_to_index, rank_to_index, CASTLE_BLACK_K, CASTLE_BLACK_Q, CASTLE_WHITE_K,
    CASTLE_WHITE_Q,
};
