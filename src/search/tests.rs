//! Behavioral tests for the search driver.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::board::Board;
use crate::search::constants::{CHECKMATE, DRAW};
use crate::search::{
    Search, SearchMode, SearchReport, SearchRequest, SearchResult, SearchSink,
};

/// Sink that records everything the worker emits.
#[derive(Default)]
struct CollectingSink {
    reports: Mutex<Vec<SearchReport>>,
    results: Mutex<Vec<SearchResult>>,
}

impl SearchSink for CollectingSink {
    fn send_report(&self, report: SearchReport) {
        self.reports.lock().push(report);
    }

    fn send_result(&self, result: &SearchResult) {
        self.results.lock().push(result.clone());
    }
}

fn request(mode: SearchMode) -> SearchRequest {
    SearchRequest {
        mode,
        search_moves: Vec::new(),
        use_book: false,
        debug: false,
    }
}

fn wait_for(search: &Search) {
    while search.is_searching() {
        std::thread::sleep(Duration::from_millis(1));
    }
}

/// Run a search to completion and return (result, sink).
fn search_sync(fen: &str, req: SearchRequest) -> (SearchResult, Arc<CollectingSink>) {
    let board = Board::from_fen(fen);
    let mut search = Search::new(8);
    let sink = Arc::new(CollectingSink::default());
    search
        .start_search(&board, req, sink.clone())
        .expect("search must start");
    wait_for(&search);
    search.stop_search();
    let result = search.last_result().expect("search must produce a result");
    assert_eq!(
        sink.results.lock().len(),
        1,
        "exactly one bestmove per search"
    );
    (result, sink)
}

fn assert_best_is_legal(fen: &str, result: &SearchResult) {
    let mut board = Board::from_fen(fen);
    assert!(
        board.generate_moves().contains(result.best_move),
        "best move {} is not legal in {fen}",
        result.best_move
    );
}

#[test]
fn test_fixed_depth_returns_legal_move() {
    for fen in [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    ] {
        let (result, _) = search_sync(fen, request(SearchMode::FixedDepth(4)));
        assert_best_is_legal(fen, &result);
        assert!(result.depth >= 1);
        assert!(result.nodes > 0);
    }
}

#[test]
fn test_finds_mate_in_one() {
    let fen = "7k/R7/6K1/8/8/8/8/8 w - - 0 1";
    let (result, _) = search_sync(fen, request(SearchMode::FixedDepth(4)));
    assert_eq!(result.best_move.to_string(), "a7a8");
    assert_eq!(result.value, CHECKMATE - 1);
}

#[test]
fn test_finds_mate_in_two() {
    // Rook ladder: 1.Rb7 (or Ra7) and mate on the eighth rank next move
    let fen = "7k/8/8/8/8/8/R7/1R5K w - - 0 1";
    let (result, _) = search_sync(fen, request(SearchMode::FixedDepth(6)));
    assert_eq!(result.value, CHECKMATE - 3);
    assert_best_is_legal(fen, &result);
}

#[test]
fn test_mtdf_agrees_on_mate() {
    let board = Board::from_fen("7k/8/8/8/8/8/R7/1R5K w - - 0 1");

    let mut search = Search::new(8);
    search.params_mut().use_mtdf = true;
    let sink = Arc::new(CollectingSink::default());
    search
        .start_search(&board, request(SearchMode::FixedDepth(6)), sink)
        .unwrap();
    wait_for(&search);
    let result = search.last_result().unwrap();
    assert_eq!(result.value, CHECKMATE - 3);
}

#[test]
fn test_checkmated_position_yields_null_move() {
    // Black is already mated: there is nothing to search
    let fen = "R6k/8/6K1/8/8/8/8/8 b - - 0 1";
    let (result, _) = search_sync(fen, request(SearchMode::FixedDepth(3)));
    assert!(result.best_move.is_none());
    assert_eq!(result.value, -CHECKMATE);
}

#[test]
fn test_stalemate_yields_null_move_and_draw_score() {
    let fen = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1";
    let (result, _) = search_sync(fen, request(SearchMode::FixedDepth(3)));
    assert!(result.best_move.is_none());
    assert_eq!(result.value, DRAW);
}

#[test]
fn test_single_reply_is_found_immediately() {
    // Only Ka7 is legal
    let fen = "k6R/8/2K5/8/8/8/8/8 b - - 0 1";
    let (result, _) = search_sync(fen, request(SearchMode::FixedDepth(5)));
    assert_eq!(result.best_move.to_string(), "a8a7");
}

#[test]
fn test_searchmoves_restricts_root() {
    let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    let mut req = request(SearchMode::FixedDepth(3));
    req.search_moves = vec!["a2a3".to_string()];
    let (result, _) = search_sync(fen, req);
    assert_eq!(result.best_move.to_string(), "a2a3");
}

#[test]
fn test_quiescence_takes_the_hanging_queen() {
    let fen = "k7/8/8/3q4/4P3/8/8/K7 w - - 0 1";
    let (result, _) = search_sync(fen, request(SearchMode::FixedDepth(1)));
    assert_eq!(result.best_move.to_string(), "e4d5");
}

#[test]
fn test_node_limit_is_respected() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    let (result, _) = search_sync(fen, request(SearchMode::FixedNodes(5_000)));
    assert_best_is_legal(fen, &result);
    // The budget check runs at node entry, so overshoot is at most a
    // handful of nodes
    assert!(result.nodes <= 5_100, "nodes = {}", result.nodes);
}

#[test]
fn test_seeks_repetition_when_losing() {
    // White is a rook down but holds a perpetual: Qh5+ Kg8 Qe8+ Kh7 ...
    let fen = "4Q3/q5pk/8/8/8/r7/5PPP/6K1 w - - 0 1";
    let (result, _) = search_sync(fen, request(SearchMode::FixedDepth(7)));
    assert_eq!(result.best_move.to_string(), "e8h5");
    // Draw score adjusted by contempt, far from the lost evaluation
    assert!(
        result.value > -150 && result.value < 100,
        "value = {}",
        result.value
    );
}

#[test]
fn test_avoids_repetition_when_winning() {
    // Same structure, but the rook is White's: the perpetual is still
    // available and must not be taken (Rxa7 simply wins the queen)
    let fen = "4Q3/q5pk/8/8/8/R7/5PPP/6K1 w - - 0 1";
    let (result, _) = search_sync(fen, request(SearchMode::FixedDepth(7)));
    assert_ne!(result.best_move.to_string(), "e8h5");
    assert!(result.value > 300, "value = {}", result.value);
}

#[test]
fn test_infinite_search_stops_on_request() {
    let board = Board::new();
    let mut search = Search::new(8);
    let sink = Arc::new(CollectingSink::default());
    search
        .start_search(&board, request(SearchMode::Infinite), sink.clone())
        .unwrap();
    std::thread::sleep(Duration::from_millis(50));
    assert!(search.is_searching());
    search.stop_search();
    assert!(!search.is_searching());
    assert_eq!(sink.results.lock().len(), 1);
    let result = search.last_result().unwrap();
    assert!(!result.best_move.is_none());
}

#[test]
fn test_stop_is_idempotent() {
    let board = Board::new();
    let mut search = Search::new(8);
    let sink = Arc::new(CollectingSink::default());
    search
        .start_search(&board, request(SearchMode::FixedDepth(3)), sink.clone())
        .unwrap();
    wait_for(&search);
    search.stop_search();
    let first = search.last_result().unwrap();

    // Stopping again must change nothing
    search.stop_search();
    search.stop_search();
    let second = search.last_result().unwrap();
    assert_eq!(first.best_move, second.best_move);
    assert_eq!(first.value, second.value);
    assert_eq!(sink.results.lock().len(), 1);
}

#[test]
fn test_start_while_running_is_rejected() {
    let board = Board::new();
    let mut search = Search::new(8);
    let sink = Arc::new(CollectingSink::default());
    search
        .start_search(&board, request(SearchMode::Infinite), sink.clone())
        .unwrap();
    let err = search.start_search(&board, request(SearchMode::FixedDepth(2)), sink.clone());
    assert!(err.is_err());
    search.stop_search();
    // The original search still delivered its single bestmove
    assert_eq!(sink.results.lock().len(), 1);
}

#[test]
fn test_ponder_holds_result_until_resolved() {
    let board = Board::new();
    let mut search = Search::new(8);
    let sink = Arc::new(CollectingSink::default());
    let mode = SearchMode::Ponder {
        wtime: 0,
        btime: 0,
        winc: 0,
        binc: 0,
        movestogo: 0,
        movetime: 50,
    };
    search.start_search(&board, request(mode), sink.clone()).unwrap();

    // Give the worker ample time to finish its fixed-time budget; the
    // result must still be held back while pondering
    std::thread::sleep(Duration::from_millis(250));
    assert!(sink.results.lock().is_empty());
    assert!(search.is_searching());

    search.ponder_hit();
    wait_for(&search);
    assert_eq!(sink.results.lock().len(), 1);
}

#[test]
fn test_perft_mode_reports_counts() {
    let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    let (result, sink) = search_sync(fen, request(SearchMode::Perft(3)));
    assert_eq!(result.nodes, 8_902);
    assert!(result.best_move.is_none());

    let reports = sink.reports.lock();
    let perft = reports.iter().find_map(|r| match r {
        SearchReport::Perft { stats, .. } => Some(*stats),
        _ => None,
    });
    let stats = perft.expect("perft report must be emitted");
    assert_eq!(stats.nodes, 8_902);
    assert_eq!(stats.captures, 34);
    assert_eq!(stats.checks, 12);
}

#[test]
fn test_iteration_reports_have_pv() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    let (result, sink) = search_sync(fen, request(SearchMode::FixedDepth(5)));

    let reports = sink.reports.lock();
    let mut saw_iteration = false;
    for report in reports.iter() {
        if let SearchReport::Iteration { depth, pv, .. } = report {
            saw_iteration = true;
            assert!(*depth >= 1);
            assert!(!pv.is_empty());
        }
    }
    assert!(saw_iteration, "at least one iteration report expected");
    // The final PV starts with the chosen best move
    let last_pv = reports
        .iter()
        .rev()
        .find_map(|r| match r {
            SearchReport::Iteration { pv, .. } => Some(pv.clone()),
            _ => None,
        })
        .unwrap();
    assert!(last_pv.starts_with(&result.best_move.to_string()));
}

#[test]
fn test_deeper_search_visits_more_nodes() {
    let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 0 3";
    let (shallow, _) = search_sync(fen, request(SearchMode::FixedDepth(2)));
    let (deep, _) = search_sync(fen, request(SearchMode::FixedDepth(5)));
    assert!(deep.nodes > shallow.nodes);
}

#[test]
fn test_book_answers_known_position_instantly() {
    let board = Board::new();
    let mut search = Search::new(8);
    let sink = Arc::new(CollectingSink::default());
    let req = SearchRequest {
        mode: SearchMode::TimeControl {
            wtime: 60_000,
            btime: 60_000,
            winc: 0,
            binc: 0,
            movestogo: 0,
        },
        search_moves: Vec::new(),
        use_book: true,
        debug: false,
    };
    search.start_search(&board, req, sink.clone()).unwrap();
    wait_for(&search);
    let result = search.last_result().unwrap();
    assert_eq!(result.depth, 0, "book answers do not search");
    assert_eq!(result.nodes, 0);

    let mut startpos = Board::new();
    assert!(startpos.generate_moves().contains(result.best_move));
}

#[test]
fn test_mate_search_mode_stops_at_mate() {
    let fen = "7k/8/8/8/8/8/R7/1R5K w - - 0 1";
    let (result, _) = search_sync(fen, request(SearchMode::MateIn(2)));
    assert_eq!(result.value, CHECKMATE - 3);
}

#[test]
fn test_counters_are_monotonic_in_result() {
    let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    let (result, _) = search_sync(fen, request(SearchMode::FixedDepth(4)));
    assert!(result.nodes > 0);
    assert!(result.sel_depth >= result.depth - 1);
    assert!(result.elapsed >= Duration::ZERO);
}

#[test]
fn test_tt_seeds_later_searches_of_same_position() {
    let board = Board::from_fen("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 0 3");
    let mut search = Search::new(8);

    let sink = Arc::new(CollectingSink::default());
    search
        .start_search(&board, request(SearchMode::FixedDepth(5)), sink.clone())
        .unwrap();
    wait_for(&search);
    let first = search.last_result().unwrap();

    // The second search of the same position starts from the table and
    // spends far fewer nodes reaching the same depth
    let sink2 = Arc::new(CollectingSink::default());
    search
        .start_search(&board, request(SearchMode::FixedDepth(5)), sink2)
        .unwrap();
    wait_for(&search);
    let second = search.last_result().unwrap();

    assert_eq!(first.best_move, second.best_move);
    assert!(second.nodes < first.nodes);
}
