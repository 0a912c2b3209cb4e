//! A small built-in opening book.
//!
//! A handful of mainline opening sequences is compiled into a map from
//! position hash to the known replies; lookups pick one at random so the
//! engine does not open every game identically. Time-controlled searches
//! consult the book until the game leaves it.

use std::collections::HashMap;

use rand::prelude::*;

use crate::board::{Board, Move};

/// Mainline openings, as UCI move sequences from the starting position.
const BOOK_LINES: &[&str] = &[
    // Ruy Lopez, closed
    "e2e4 e7e5 g1f3 b8c6 f1b5 a7a6 b5a4 g8f6 e1g1 f8e7 f1e1 b7b5 a4b3 d7d6",
    // Italian game
    "e2e4 e7e5 g1f3 b8c6 f1c4 f8c5 c2c3 g8f6 d2d3 d7d6",
    // Sicilian, Najdorf
    "e2e4 c7c5 g1f3 d7d6 d2d4 c5d4 f3d4 g8f6 b1c3 a7a6",
    // Sicilian, Taimanov
    "e2e4 c7c5 g1f3 e7e6 d2d4 c5d4 f3d4 b8c6",
    // French, classical
    "e2e4 e7e6 d2d4 d7d5 b1c3 g8f6 c1g5 f8e7",
    // Caro-Kann, classical
    "e2e4 c7c6 d2d4 d7d5 b1c3 d5e4 c3e4 c8f5",
    // Queen's gambit declined
    "d2d4 d7d5 c2c4 e7e6 b1c3 g8f6 c1g5 f8e7 e2e3 e8g8",
    // Slav defense
    "d2d4 d7d5 c2c4 c7c6 g1f3 g8f6 b1c3 d5c4",
    // Nimzo-Indian
    "d2d4 g8f6 c2c4 e7e6 b1c3 f8b4 e2e3 e8g8",
    // King's Indian, classical
    "d2d4 g8f6 c2c4 g7g6 b1c3 f8g7 e2e4 d7d6 g1f3 e8g8",
    // Grunfeld
    "d2d4 g8f6 c2c4 g7g6 b1c3 d7d5 c4d5 f6d5",
    // English, four knights
    "c2c4 e7e5 b1c3 g8f6 g1f3 b8c6",
    // Reti
    "g1f3 d7d5 c2c4 e7e6 g2g3 g8f6 f1g2 f8e7",
    // London system
    "d2d4 d7d5 c1f4 g8f6 e2e3 c7c5 c2c3 b8c6",
];

pub struct OpeningBook {
    entries: HashMap<u64, Vec<Move>>,
}

impl OpeningBook {
    /// The compiled-in book.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_lines(BOOK_LINES)
    }

    /// An empty book; every lookup misses.
    #[must_use]
    pub fn empty() -> Self {
        OpeningBook {
            entries: HashMap::new(),
        }
    }

    fn from_lines(lines: &[&str]) -> Self {
        let mut entries: HashMap<u64, Vec<Move>> = HashMap::new();
        for line in lines {
            let mut board = Board::new();
            for token in line.split_whitespace() {
                let hash = board.hash();
                let Ok(mv) = board.parse_move(token) else {
                    debug_assert!(false, "illegal book move {token} in line {line}");
                    break;
                };
                let replies = entries.entry(hash).or_default();
                if !replies.contains(&mv) {
                    replies.push(mv);
                }
                board.make_move(mv);
            }
        }
        OpeningBook { entries }
    }

    /// A book reply for this position, randomly chosen among the known
    /// continuations.
    #[must_use]
    pub fn lookup(&self, board: &Board) -> Option<Move> {
        let replies = self.entries.get(&board.hash())?;
        replies.choose(&mut rand::thread_rng()).copied()
    }

    #[must_use]
    pub fn positions(&self) -> usize {
        self.entries.len()
    }
}
