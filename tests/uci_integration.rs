//! End-to-end tests driving the engine binary over its UCI pipe.

use std::io::Write;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

struct Engine {
    child: Child,
}

impl Engine {
    fn spawn() -> Self {
        let child = Command::new(env!("CARGO_BIN_EXE_rampart"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("engine binary must start");
        Engine { child }
    }

    fn send(&mut self, line: &str) {
        let stdin = self.child.stdin.as_mut().expect("stdin is piped");
        writeln!(stdin, "{line}").expect("write to engine");
        stdin.flush().expect("flush to engine");
    }

    fn quit_and_collect(mut self) -> (String, bool) {
        self.send("quit");
        let output = self
            .child
            .wait_with_output()
            .expect("engine must terminate");
        (
            String::from_utf8_lossy(&output.stdout).to_string(),
            output.status.success(),
        )
    }
}

fn count_bestmoves(output: &str) -> usize {
    output
        .lines()
        .filter(|l| l.starts_with("bestmove "))
        .count()
}

#[test]
fn test_uci_handshake_shape() {
    let mut engine = Engine::spawn();
    engine.send("uci");
    let (output, clean_exit) = engine.quit_and_collect();

    assert!(clean_exit, "engine must exit 0 on quit");
    assert!(output.contains("id name Rampart"));
    assert!(output.contains("id author"));
    assert!(output.contains("option name Hash type spin"));
    assert!(output.contains("option name Ponder type check"));
    assert!(output.contains("option name Clear_Hash type button"));
    assert!(output.contains("option name OwnBook type check"));
    assert!(output.contains("uciok"));

    // id lines precede uciok
    let id_pos = output.find("id name").unwrap();
    let ok_pos = output.find("uciok").unwrap();
    assert!(id_pos < ok_pos);
}

#[test]
fn test_isready_answers_readyok() {
    let mut engine = Engine::spawn();
    engine.send("uci");
    engine.send("isready");
    let (output, _) = engine.quit_and_collect();
    assert!(output.contains("readyok"));
}

#[test]
fn test_go_infinite_stop_emits_one_bestmove() {
    let mut engine = Engine::spawn();
    engine.send("uci");
    engine.send("isready");
    engine.send("position startpos");
    engine.send("go infinite");
    std::thread::sleep(Duration::from_millis(300));
    engine.send("stop");
    std::thread::sleep(Duration::from_millis(100));
    let (output, _) = engine.quit_and_collect();

    assert!(output.contains("info depth"), "info lines expected");
    assert_eq!(count_bestmoves(&output), 1, "output was:\n{output}");
}

#[test]
fn test_go_depth_terminates_on_its_own() {
    let mut engine = Engine::spawn();
    engine.send("position startpos");
    engine.send("go depth 4");
    std::thread::sleep(Duration::from_millis(2000));
    let (output, _) = engine.quit_and_collect();
    assert_eq!(count_bestmoves(&output), 1, "output was:\n{output}");
    // The iteration info carries a pv
    assert!(output.lines().any(|l| l.starts_with("info depth") && l.contains(" pv ")));
}

#[test]
fn test_ponder_then_ponderhit_single_bestmove() {
    let mut engine = Engine::spawn();
    engine.send("position startpos moves e2e4");
    engine.send("go ponder movetime 200");
    std::thread::sleep(Duration::from_millis(150));
    engine.send("ponderhit");
    std::thread::sleep(Duration::from_millis(600));
    let (output, _) = engine.quit_and_collect();
    assert_eq!(count_bestmoves(&output), 1, "output was:\n{output}");
}

#[test]
fn test_ponder_finished_result_held_until_stop() {
    let mut engine = Engine::spawn();
    engine.send("position startpos");
    engine.send("go ponder depth 1");
    // No bestmove may appear while the search is pondering
    std::thread::sleep(Duration::from_millis(300));
    engine.send("stop");
    std::thread::sleep(Duration::from_millis(100));
    let (output, _) = engine.quit_and_collect();
    assert_eq!(count_bestmoves(&output), 1, "output was:\n{output}");
}

#[test]
fn test_bestmove_0000_when_no_moves() {
    let mut engine = Engine::spawn();
    // Stalemate: black to move has nothing
    engine.send("position fen 7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
    engine.send("go depth 3");
    std::thread::sleep(Duration::from_millis(300));
    let (output, _) = engine.quit_and_collect();
    assert!(output.contains("bestmove 0000"), "output was:\n{output}");
}

#[test]
fn test_perft_command_reports_counts() {
    let mut engine = Engine::spawn();
    engine.send("position startpos");
    engine.send("perft 3");
    let (output, _) = engine.quit_and_collect();
    assert!(
        output.contains("nodes 8902"),
        "perft output missing: {output}"
    );
}

#[test]
fn test_go_perft_reports_counts() {
    let mut engine = Engine::spawn();
    engine.send("position startpos");
    engine.send("go perft 4");
    std::thread::sleep(Duration::from_millis(3000));
    let (output, _) = engine.quit_and_collect();
    assert!(
        output.contains("nodes 197281"),
        "go perft output missing: {output}"
    );
    assert_eq!(count_bestmoves(&output), 1);
}

#[test]
fn test_setoption_and_newgame_are_accepted() {
    let mut engine = Engine::spawn();
    engine.send("uci");
    engine.send("setoption name Hash value 8");
    engine.send("setoption name OwnBook value false");
    engine.send("setoption name Clear_Hash");
    engine.send("ucinewgame");
    engine.send("isready");
    engine.send("position startpos moves e2e4 e7e5");
    engine.send("go depth 3");
    std::thread::sleep(Duration::from_millis(1000));
    let (output, _) = engine.quit_and_collect();
    assert!(output.contains("readyok"));
    assert_eq!(count_bestmoves(&output), 1);
}

#[test]
fn test_malformed_lines_are_ignored() {
    let mut engine = Engine::spawn();
    engine.send("bogus command");
    engine.send("position fen not a fen at all 0 0");
    engine.send("position startpos moves e9e9");
    engine.send("isready");
    let (output, _) = engine.quit_and_collect();
    assert!(output.contains("readyok"));
}

#[test]
fn test_searchmoves_restriction() {
    let mut engine = Engine::spawn();
    engine.send("position startpos");
    engine.send("go depth 3 searchmoves a2a3");
    std::thread::sleep(Duration::from_millis(500));
    let (output, _) = engine.quit_and_collect();
    assert!(
        output.contains("bestmove a2a3"),
        "restricted search must pick a2a3: {output}"
    );
}

#[test]
fn test_movetime_search_finishes() {
    let mut engine = Engine::spawn();
    engine.send("setoption name OwnBook value false");
    engine.send("position startpos moves d2d4 g8f6");
    engine.send("go movetime 200");
    std::thread::sleep(Duration::from_millis(900));
    let (output, _) = engine.quit_and_collect();
    assert_eq!(count_bestmoves(&output), 1, "output was:\n{output}");
    assert!(output.contains("info depth"));
}
