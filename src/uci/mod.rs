//! Universal Chess Interface protocol driver.
//!
//! Reads commands line by line, owns the board the GUI sets up, and
//! drives the search through its control surface. Malformed input never
//! aborts the loop: bad lines are logged to stderr and ignored.

pub mod command;
pub mod options;
pub mod report;

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Instant;

use crate::board::Board;
use crate::search::{Search, SearchError, DEFAULT_TT_MB};

pub use command::{parse_go_params, parse_uci_command, GoParams, UciCommand};
pub use options::{parse_setoption, UciOptions};
pub use report::StdoutSink;

/// Apply a `position` command to the board.
///
/// Supports `position startpos` and `position fen <fen>`, each optionally
/// followed by `moves ...`. Application of the move list stops at the
/// first invalid move, keeping what was applied so far.
pub fn parse_position_command(board: &mut Board, parts: &[&str]) {
    let mut i = 1;

    if i >= parts.len() {
        eprintln!("position: missing arguments");
        return;
    }

    if parts[i] == "startpos" {
        *board = Board::new();
        i += 1;
    } else if parts[i] == "fen" {
        if i + 6 >= parts.len() {
            eprintln!("position: incomplete FEN");
            return;
        }
        let fen = parts[i + 1..i + 7].join(" ");
        match Board::try_from_fen(&fen) {
            Ok(parsed) => *board = parsed,
            Err(e) => {
                eprintln!("position: {e}");
                return;
            }
        }
        i += 7;
    } else {
        eprintln!("position: expected 'startpos' or 'fen'");
        return;
    }

    if i < parts.len() && parts[i] == "moves" {
        i += 1;
        while i < parts.len() {
            match board.parse_move(parts[i]) {
                Ok(mv) => {
                    board.make_move(mv);
                }
                Err(e) => {
                    eprintln!("position: {e}");
                    break;
                }
            }
            i += 1;
        }
    }
}

/// The blocking UCI main loop; returns on `quit` or closed stdin.
pub fn run_uci_loop() {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    let mut board = Board::new();
    let mut search = Search::new(DEFAULT_TT_MB);
    let mut options = UciOptions::new(DEFAULT_TT_MB);
    let sink = Arc::new(StdoutSink);
    let mut debug = false;

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let Some(cmd) = parse_uci_command(&line) else {
            continue;
        };
        let parts: Vec<&str> = line.split_whitespace().collect();

        match cmd {
            UciCommand::Uci => options.print(search.params()),
            UciCommand::IsReady => println!("readyok"),
            UciCommand::Debug(arg) => {
                debug = arg.as_deref() != Some("off");
            }
            UciCommand::UciNewGame => {
                search.new_game();
                board = Board::new();
            }
            UciCommand::Position(_) => parse_position_command(&mut board, &parts),
            UciCommand::SetOption(_) => {
                if let Some((name, value)) = parse_setoption(&parts) {
                    options.apply(&name, value.as_deref(), &mut search);
                } else {
                    eprintln!("setoption: missing name");
                }
            }
            UciCommand::Go(_) => {
                let request = parse_go_params(&parts).into_request(options.own_book, debug);
                match search.start_search(&board, request, sink.clone()) {
                    Ok(()) => {}
                    Err(e @ SearchError::AlreadySearching) => {
                        // Keep the running search; just log the rejection
                        eprintln!("go: {e}");
                        #[cfg(feature = "logging")]
                        log::warn!("rejected go command: {e}");
                    }
                }
            }
            UciCommand::Stop => search.stop_search(),
            UciCommand::PonderHit => search.ponder_hit(),
            UciCommand::Perft(depth) => {
                let start = Instant::now();
                let stats = board.clone().perft_detailed(depth);
                println!(
                    "info string perft depth {depth} nodes {} captures {} ep {} checks {} \
                     mates {} time {}",
                    stats.nodes,
                    stats.captures,
                    stats.en_passants,
                    stats.checks,
                    stats.checkmates,
                    start.elapsed().as_millis()
                );
            }
            UciCommand::Quit => {
                search.stop_search();
                break;
            }
            UciCommand::Unknown(text) => {
                eprintln!("Unknown command: {text}");
                #[cfg(feature = "logging")]
                log::debug!("ignored unknown command: {text}");
            }
        }

        let _ = stdout.flush();
    }
}
