//! Search driver: iterative-deepening principal-variation search.
//!
//! `Search` owns the transposition table and the single worker thread.
//! The protocol layer drives it through `start_search` / `stop_search` /
//! `ponder_hit` and receives output through a `SearchSink`. All search
//! state lives in `Worker`, whose per-ply arrays are reused across
//! searches to keep the hot path allocation-free.

pub mod constants;
mod alphabeta;
mod iterative;
mod ordering;
mod params;
mod quiescence;
mod timing;

#[cfg(test)]
mod tests;

pub use params::SearchParams;
pub use timing::TimeController;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::board::{Board, Move, MoveList, PerftStats, MAX_PLY};
use crate::book::OpeningBook;
use crate::tt::{Bound, TranspositionTable};
use ordering::{KillerTable, StagedMoveGen};

/// Default transposition table size in MiB.
pub const DEFAULT_TT_MB: usize = 64;

/// What kind of search `go` requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchMode {
    /// Search until stopped.
    Infinite,
    /// Ponder on the expected reply; converted by `ponderhit`.
    Ponder {
        wtime: u64,
        btime: u64,
        winc: u64,
        binc: u64,
        movestogo: u32,
        movetime: u64,
    },
    FixedDepth(i32),
    FixedNodes(u64),
    FixedTime(u64),
    TimeControl {
        wtime: u64,
        btime: u64,
        winc: u64,
        binc: u64,
        movestogo: u32,
    },
    /// Search for a mate in the given number of moves.
    MateIn(i32),
    /// Count leaf nodes instead of searching.
    Perft(i32),
}

/// One `go` command, ready for the worker.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub mode: SearchMode,
    /// UCI `searchmoves`: restrict the root to these moves.
    pub search_moves: Vec<String>,
    pub use_book: bool,
    pub debug: bool,
}

/// Outcome of a completed (or aborted) search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub best_move: Move,
    pub ponder_move: Option<Move>,
    /// Centipawns, or a mate distance encoding beyond `MATE_THRESHOLD`.
    pub value: i32,
    pub depth: i32,
    pub sel_depth: i32,
    pub nodes: u64,
    pub elapsed: Duration,
}

/// Telemetry collected during one search. Pure data.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchCounters {
    pub nodes_visited: u64,
    pub tt_probes: u64,
    pub tt_hits: u64,
    pub tt_cutoffs: u64,
    pub beta_cutoffs: u64,
    pub null_cutoffs: u64,
    pub rfp_prunings: u64,
    pub razor_drops: u64,
    pub futility_prunings: u64,
    pub extended_futility_prunings: u64,
    pub limited_razor_reductions: u64,
    pub lmp_prunings: u64,
    pub lmr_reductions: u64,
    pub minor_promotion_prunings: u64,
    pub aspiration_researches: u64,
}

impl SearchCounters {
    pub fn reset(&mut self) {
        *self = SearchCounters::default();
    }
}

/// Streaming output from the worker, one variant per UCI info shape.
#[derive(Debug, Clone)]
pub enum SearchReport {
    /// End-of-iteration (or aspiration fail) line.
    Iteration {
        depth: i32,
        sel_depth: i32,
        value: i32,
        bound: Bound,
        nodes: u64,
        nps: u64,
        time_ms: u64,
        hashfull: u32,
        pv: String,
    },
    /// Periodic progress while inside the tree.
    Status {
        nodes: u64,
        nps: u64,
        time_ms: u64,
        hashfull: u32,
    },
    /// Root move currently being searched.
    CurrentMove { mv: Move, number: usize },
    /// Line from root to the current node (debug only).
    CurrentLine { line: String },
    /// Result of a perft run.
    Perft {
        depth: i32,
        stats: PerftStats,
        time_ms: u64,
    },
}

/// Receives search output. The engine side of the narrow interface
/// between search and protocol driver.
pub trait SearchSink: Send + Sync {
    fn send_report(&self, report: SearchReport);
    fn send_result(&self, result: &SearchResult);
}

/// Error from the control surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    AlreadySearching,
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::AlreadySearching => write!(f, "a search is already running"),
        }
    }
}

impl std::error::Error for SearchError {}

/// Flags and slots shared between the controller and the worker.
struct SearchShared {
    stop: AtomicBool,
    ponder: AtomicBool,
    searching: AtomicBool,
    last_result: Mutex<Option<SearchResult>>,
}

/// The search engine: owns the TT, the opening book state and the worker.
pub struct Search {
    tt: Arc<Mutex<TranspositionTable>>,
    book: Arc<OpeningBook>,
    params: SearchParams,
    shared: Arc<SearchShared>,
    worker: Option<JoinHandle<()>>,
    out_of_book: Arc<AtomicBool>,
}

impl Search {
    #[must_use]
    pub fn new(tt_mb: usize) -> Self {
        Search {
            tt: Arc::new(Mutex::new(TranspositionTable::new(tt_mb))),
            book: Arc::new(OpeningBook::builtin()),
            params: SearchParams::default(),
            shared: Arc::new(SearchShared {
                stop: AtomicBool::new(false),
                ponder: AtomicBool::new(false),
                searching: AtomicBool::new(false),
                last_result: Mutex::new(None),
            }),
            worker: None,
            out_of_book: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut SearchParams {
        &mut self.params
    }

    #[must_use]
    pub fn is_searching(&self) -> bool {
        self.shared.searching.load(Ordering::Acquire)
    }

    /// Reset for a new game: clear the hash table and re-arm the book.
    pub fn new_game(&mut self) {
        self.stop_search();
        self.tt.lock().clear();
        self.out_of_book.store(false, Ordering::Release);
    }

    /// Replace the hash table. Ignored while a search is running.
    pub fn resize_tt(&mut self, size_mb: usize) -> bool {
        if self.is_searching() {
            return false;
        }
        *self.tt.lock() = TranspositionTable::new(size_mb);
        true
    }

    /// Clear the hash table. Ignored while a search is running.
    pub fn clear_tt(&mut self) -> bool {
        if self.is_searching() {
            return false;
        }
        self.tt.lock().clear();
        true
    }

    /// Launch the worker. Returns once it has published its initial state;
    /// rejects the call if a search is already in flight.
    pub fn start_search(
        &mut self,
        board: &Board,
        request: SearchRequest,
        sink: Arc<dyn SearchSink>,
    ) -> Result<(), SearchError> {
        if self.is_searching() {
            return Err(SearchError::AlreadySearching);
        }
        // Reap the previous worker, if any
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }

        self.shared.stop.store(false, Ordering::Release);
        self.shared.ponder.store(
            matches!(request.mode, SearchMode::Ponder { .. }),
            Ordering::Release,
        );
        self.shared.searching.store(true, Ordering::Release);

        // Defensive copy: the caller's board must not be touched
        let board = board.clone();
        let params = self.params;
        let tt = Arc::clone(&self.tt);
        let shared = Arc::clone(&self.shared);
        let book = Arc::clone(&self.book);
        let out_of_book = Arc::clone(&self.out_of_book);

        let (latch_tx, latch_rx) = mpsc::channel::<()>();

        let handle = std::thread::spawn(move || {
            let mut tt_guard = tt.lock();
            let mut worker = Worker::new(
                board,
                &mut tt_guard,
                params,
                &shared,
                sink,
                &book,
                &out_of_book,
                request,
            );
            // Initial state is published; unblock the controller
            let _ = latch_tx.send(());

            let result = worker.run();
            *shared.last_result.lock() = Some(result);
            shared.searching.store(false, Ordering::Release);
        });

        // One-shot latch: return only after the worker started up
        let _ = latch_rx.recv();
        self.worker = Some(handle);
        Ok(())
    }

    /// Request termination and wait for the worker to unwind. Stopping an
    /// idle search is a no-op and leaves the last result intact.
    pub fn stop_search(&mut self) {
        self.shared.stop.store(true, Ordering::Release);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }

    /// Convert an in-flight ponder search into a normal timed search.
    pub fn ponder_hit(&self) {
        self.shared.ponder.store(false, Ordering::Release);
    }

    #[must_use]
    pub fn last_result(&self) -> Option<SearchResult> {
        self.shared.last_result.lock().clone()
    }

    #[must_use]
    pub fn hashfull_per_mille(&self) -> u32 {
        self.tt.lock().hashfull_per_mille()
    }
}

impl Drop for Search {
    fn drop(&mut self) {
        self.stop_search();
    }
}

/// A root move with its latest iteration value, kept sorted best-first.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RootMove {
    pub mv: Move,
    pub value: i32,
}

/// The worker: all mutable state of one running search.
pub(crate) struct Worker<'a> {
    pub(crate) board: Board,
    pub(crate) tt: &'a mut TranspositionTable,
    pub(crate) params: SearchParams,
    shared: &'a SearchShared,
    sink: Arc<dyn SearchSink>,
    book: &'a OpeningBook,
    out_of_book: &'a AtomicBool,

    pub(crate) mode: SearchMode,
    search_moves: Vec<String>,
    use_book: bool,
    pub(crate) debug: bool,

    pub(crate) timing: TimeController,
    pub(crate) counters: SearchCounters,
    pub(crate) max_depth: i32,
    pub(crate) node_limit: u64,

    // Per-ply state, reused across searches
    pub(crate) pv: Vec<MoveList>,
    pub(crate) killers: KillerTable,
    pub(crate) gens: Vec<StagedMoveGen>,
    pub(crate) mate_threat: Vec<bool>,
    pub(crate) single_reply: Vec<bool>,
    pub(crate) current_variation: MoveList,

    pub(crate) root_moves: Vec<RootMove>,
    pub(crate) best_move_changes: u32,
    pub(crate) sel_depth: i32,
    pub(crate) stopped: bool,
    pub(crate) pondering: bool,
    last_status: Instant,
}

impl<'a> Worker<'a> {
    #[allow(clippy::too_many_arguments)]
    fn new(
        board: Board,
        tt: &'a mut TranspositionTable,
        params: SearchParams,
        shared: &'a SearchShared,
        sink: Arc<dyn SearchSink>,
        book: &'a OpeningBook,
        out_of_book: &'a AtomicBool,
        request: SearchRequest,
    ) -> Self {
        let pondering = matches!(request.mode, SearchMode::Ponder { .. });
        let timing = TimeController::for_mode(&request.mode, board.white_to_move());
        let max_depth = match request.mode {
            SearchMode::FixedDepth(d) => d.clamp(1, MAX_PLY as i32 - 1),
            _ => MAX_PLY as i32 - 1,
        };
        let node_limit = match request.mode {
            SearchMode::FixedNodes(n) => n,
            _ => 0,
        };

        Worker {
            board,
            tt,
            params,
            shared,
            sink,
            book,
            out_of_book,
            mode: request.mode,
            search_moves: request.search_moves,
            use_book: request.use_book,
            debug: request.debug,
            timing,
            counters: SearchCounters::default(),
            max_depth,
            node_limit,
            pv: vec![MoveList::new(); MAX_PLY + 1],
            killers: KillerTable::new(),
            gens: std::iter::repeat_with(StagedMoveGen::new)
                .take(MAX_PLY + 1)
                .collect(),
            mate_threat: vec![false; MAX_PLY + 1],
            single_reply: vec![false; MAX_PLY + 1],
            current_variation: MoveList::new(),
            root_moves: Vec::new(),
            best_move_changes: 0,
            sel_depth: 0,
            stopped: false,
            pondering,
            last_status: Instant::now(),
        }
    }

    /// Stop-flag, node-budget and hard-time check, run at every node
    /// entry. Also hosts the periodic status emission and the ponderhit
    /// conversion so the tree needs no other polling point.
    #[inline]
    pub(crate) fn check_abort(&mut self) -> bool {
        if self.stopped {
            return true;
        }
        if self.shared.stop.load(Ordering::Relaxed) {
            self.stopped = true;
            return true;
        }
        if self.node_limit > 0 && self.counters.nodes_visited >= self.node_limit {
            self.stopped = true;
            return true;
        }
        if self.counters.nodes_visited & 1023 == 0 {
            if self.pondering && !self.shared.ponder.load(Ordering::Relaxed) {
                // ponderhit: the clock starts now
                self.pondering = false;
                self.timing.rebase();
            }
            if !self.pondering && self.timing.hard_limit_exceeded() {
                self.stopped = true;
                return true;
            }
            if self.last_status.elapsed() >= Duration::from_millis(500) {
                self.last_status = Instant::now();
                self.send_status();
                if self.debug {
                    self.sink.send_report(SearchReport::CurrentLine {
                        line: self.current_variation.to_string(),
                    });
                }
            }
        }
        false
    }

    /// Draw score for in-search repetitions, biased against easy draws
    /// in proportion to how much material is still on the board.
    #[inline]
    pub(crate) fn contempt(&self) -> i32 {
        -(self.board.phase() * self.params.contempt_factor)
    }

    pub(crate) fn tt_store(&mut self, depth: i32, ply: usize, value: i32, bound: Bound, mv: Move) {
        if self.stopped {
            return;
        }
        self.tt.store(
            self.board.hash(),
            depth,
            ply,
            value,
            bound,
            mv,
            self.mate_threat[ply],
        );
    }

    /// `pv[ply] = mv ++ pv[ply + 1]`
    pub(crate) fn write_pv(&mut self, ply: usize, mv: Move) {
        let (head, tail) = self.pv.split_at_mut(ply + 1);
        head[ply].set_line(mv, &tail[0]);
    }

    pub(crate) fn nps(&self) -> u64 {
        let ms = self.timing.elapsed_ms().max(1);
        self.counters.nodes_visited * 1000 / ms
    }

    pub(crate) fn send_report(&self, report: SearchReport) {
        self.sink.send_report(report);
    }

    fn send_status(&self) {
        self.sink.send_report(SearchReport::Status {
            nodes: self.counters.nodes_visited,
            nps: self.nps(),
            time_ms: self.timing.elapsed_ms(),
            hashfull: self.tt.hashfull_per_mille(),
        });
    }

    /// Hold a finished ponder search until the GUI resolves it, then
    /// publish the result through the sink.
    pub(crate) fn finish(&mut self, result: SearchResult) -> SearchResult {
        while self.pondering
            && self.shared.ponder.load(Ordering::Relaxed)
            && !self.shared.stop.load(Ordering::Relaxed)
        {
            std::thread::sleep(Duration::from_millis(2));
        }
        self.sink.send_result(&result);
        result
    }

    pub(crate) fn search_moves_cloned(&self) -> Vec<String> {
        self.search_moves.clone()
    }

    pub(crate) fn book_move(&self) -> Option<Move> {
        if !self.use_book
            || self.out_of_book.load(Ordering::Relaxed)
            || !matches!(self.mode, SearchMode::TimeControl { .. })
        {
            return None;
        }
        self.book.lookup(&self.board)
    }

    pub(crate) fn leave_book(&mut self) {
        if self.use_book && !self.out_of_book.swap(true, Ordering::Relaxed) {
            // First move on our own: budget extra thinking time
            self.timing.add_extra(200);
        }
    }
}
