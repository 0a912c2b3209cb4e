//! Transposition table keyed by Zobrist position hash.
//!
//! A flat array of 16-byte entries, sized to the nearest power of two
//! fitting the configured byte budget, indexed by `hash & mask`. Each
//! entry packs key and payload into two words so a future multi-threaded
//! port can replace whole entries atomically.
//!
//! Mate scores are stored ply-neutral: `store` rewrites them as distance
//! from the root of the subtree (`value +/- ply`), `probe` translates
//! them back, so an entry is reusable at any ply.

use crate::board::Move;
use crate::search::constants::MATE_THRESHOLD;

/// Bound classification of a stored value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    /// Value is exact (PV node).
    Exact,
    /// Value is at most this (failed low, score <= alpha).
    Upper,
    /// Value is at least this (failed high, beta cutoff).
    Lower,
}

const BOUND_UPPER: u64 = 1;
const BOUND_LOWER: u64 = 2;
const BOUND_EXACT: u64 = 3;

/// Decoded result of a successful probe.
#[derive(Clone, Copy, Debug)]
pub struct TtHit {
    pub value: i32,
    pub depth: i32,
    pub bound: Bound,
    pub best_move: Move,
    pub mate_threat: bool,
}

// Payload layout: move 0-23 | value 24-39 | depth 40-47 | bound 48-49
//                 | mate threat 50 | generation 51-58
#[derive(Clone, Copy, Default)]
struct TtEntry {
    key: u64,
    data: u64,
}

impl TtEntry {
    #[inline]
    fn is_empty(self) -> bool {
        self.data == 0
    }

    #[inline]
    fn pack(mv: Move, value: i32, depth: i32, bound: Bound, mate_threat: bool, gen: u8) -> u64 {
        let bound_bits = match bound {
            Bound::Upper => BOUND_UPPER,
            Bound::Lower => BOUND_LOWER,
            Bound::Exact => BOUND_EXACT,
        };
        (mv.as_u32() as u64 & 0xFF_FFFF)
            | (((value as i16 as u16) as u64) << 24)
            | (((depth as u8) as u64) << 40)
            | (bound_bits << 48)
            | ((mate_threat as u64) << 50)
            | ((gen as u64) << 51)
    }

    #[inline]
    fn best_move(self) -> Move {
        Move::from_u32((self.data & 0xFF_FFFF) as u32)
    }

    #[inline]
    fn value(self) -> i32 {
        ((self.data >> 24) as u16 as i16) as i32
    }

    #[inline]
    fn depth(self) -> i32 {
        ((self.data >> 40) as u8) as i32
    }

    #[inline]
    fn bound(self) -> Bound {
        match (self.data >> 48) & 0x3 {
            BOUND_UPPER => Bound::Upper,
            BOUND_LOWER => Bound::Lower,
            _ => Bound::Exact,
        }
    }

    #[inline]
    fn mate_threat(self) -> bool {
        (self.data >> 50) & 1 != 0
    }

    #[inline]
    fn generation(self) -> u8 {
        (self.data >> 51) as u8
    }
}

pub struct TranspositionTable {
    entries: Vec<TtEntry>,
    mask: usize,
    generation: u8,
    occupied: usize,
}

impl TranspositionTable {
    /// Create a table using at most `size_mb` mebibytes.
    #[must_use]
    pub fn new(size_mb: usize) -> Self {
        let budget = (size_mb * 1024 * 1024) / std::mem::size_of::<TtEntry>();
        let num_entries = if budget.is_power_of_two() {
            budget
        } else {
            (budget.next_power_of_two() / 2).max(1024)
        };

        TranspositionTable {
            entries: vec![TtEntry::default(); num_entries],
            mask: num_entries - 1,
            generation: 0,
            occupied: 0,
        }
    }

    #[inline]
    fn index(&self, hash: u64) -> usize {
        (hash as usize) & self.mask
    }

    /// Advance the generation counter; called at the start of each search
    /// so stale entries lose replacement priority.
    pub fn age_entries(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Drop every entry (new game).
    pub fn clear(&mut self) {
        self.entries.fill(TtEntry::default());
        self.generation = 0;
        self.occupied = 0;
    }

    /// Look up a position. `ply` translates stored mate distances back to
    /// values relative to the probing node.
    #[must_use]
    pub fn probe(&self, hash: u64, ply: usize) -> Option<TtHit> {
        let entry = self.entries[self.index(hash)];
        if entry.is_empty() || entry.key != hash {
            return None;
        }

        let mut value = entry.value();
        if value >= MATE_THRESHOLD {
            value -= ply as i32;
        } else if value <= -MATE_THRESHOLD {
            value += ply as i32;
        }

        Some(TtHit {
            value,
            depth: entry.depth(),
            bound: entry.bound(),
            best_move: entry.best_move(),
            mate_threat: entry.mate_threat(),
        })
    }

    /// Store a search result, applying the per-slot replacement policy:
    /// empty slots always take the entry; the same position is replaced
    /// unless the stored entry is exact and deeper; a different position
    /// is replaced when the stored entry is from an older search or not
    /// deeper than the new one.
    pub fn store(
        &mut self,
        hash: u64,
        depth: i32,
        ply: usize,
        mut value: i32,
        bound: Bound,
        best_move: Move,
        mate_threat: bool,
    ) {
        let idx = self.index(hash);
        let stored = self.entries[idx];

        if stored.is_empty() {
            self.occupied += 1;
        } else if stored.key == hash {
            if stored.bound() == Bound::Exact && stored.depth() > depth {
                return;
            }
        } else if stored.generation() == self.generation && stored.depth() > depth {
            return;
        }

        if value >= MATE_THRESHOLD {
            value += ply as i32;
        } else if value <= -MATE_THRESHOLD {
            value -= ply as i32;
        }
        debug_assert!(
            value >= i32::from(i16::MIN) && value <= i32::from(i16::MAX),
            "TT value out of i16 range: {value}"
        );

        self.entries[idx] = TtEntry {
            key: hash,
            data: TtEntry::pack(
                best_move,
                value,
                depth.clamp(0, 255),
                bound,
                mate_threat,
                self.generation,
            ),
        };
    }

    /// Fraction of used entries in per-mille, for `info hashfull`.
    #[must_use]
    pub fn hashfull_per_mille(&self) -> u32 {
        ((self.occupied as u64 * 1000) / self.entries.len() as u64) as u32
    }
}
