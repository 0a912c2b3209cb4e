//! Benchmarks for move generation, perft and the search.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use rampart::board::Board;
use rampart::search::{
    Search, SearchMode, SearchReport, SearchRequest, SearchResult, SearchSink,
};
use std::sync::Arc;

struct NullSink;

impl SearchSink for NullSink {
    fn send_report(&self, _report: SearchReport) {}
    fn send_result(&self, _result: &SearchResult) {}
}

fn run_search(board: &Board, depth: i32) -> SearchResult {
    let mut search = Search::new(16);
    let request = SearchRequest {
        mode: SearchMode::FixedDepth(depth),
        search_moves: Vec::new(),
        use_book: false,
        debug: false,
    };
    search
        .start_search(board, request, Arc::new(NullSink))
        .expect("search must start");
    while search.is_searching() {
        std::thread::sleep(Duration::from_micros(100));
    }
    search.stop_search();
    search.last_result().expect("result must exist")
}

fn bench_perft(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");

    let mut board = Board::new();
    for depth in 1..=4 {
        group.bench_with_input(BenchmarkId::new("startpos", depth), &depth, |b, &depth| {
            b.iter(|| board.perft(black_box(depth)))
        });
    }

    let mut kiwipete =
        Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
    for depth in 1..=3 {
        group.bench_with_input(BenchmarkId::new("kiwipete", depth), &depth, |b, &depth| {
            b.iter(|| kiwipete.perft(black_box(depth)))
        });
    }

    group.finish();
}

fn bench_movegen(c: &mut Criterion) {
    let mut group = c.benchmark_group("movegen");

    let mut startpos = Board::new();
    group.bench_function("startpos", |b| {
        b.iter(|| black_box(startpos.generate_moves()))
    });

    let mut kiwipete =
        Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
    group.bench_function("kiwipete", |b| {
        b.iter(|| black_box(kiwipete.generate_moves()))
    });

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(10);

    let startpos = Board::new();
    for depth in [3, 4, 5] {
        group.bench_with_input(BenchmarkId::new("startpos", depth), &depth, |b, &depth| {
            b.iter(|| run_search(&startpos, depth))
        });
    }

    let tactical =
        Board::from_fen("r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10");
    for depth in [3, 4] {
        group.bench_with_input(BenchmarkId::new("tactical", depth), &depth, |b, &depth| {
            b.iter(|| run_search(&tactical, depth))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_perft, bench_movegen, bench_search);
criterion_main!(benches);
