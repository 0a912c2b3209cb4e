//! UCI command and `go` parameter parsing.

use crate::search::{SearchMode, SearchRequest};

#[derive(Debug, Clone)]
pub enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    Position(Vec<String>),
    Go(Vec<String>),
    Perft(usize),
    SetOption(Vec<String>),
    Debug(Option<String>),
    Stop,
    PonderHit,
    Quit,
    Unknown(String),
}

/// Everything a `go` line can carry.
#[derive(Default, Debug, Clone)]
pub struct GoParams {
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub movetime: Option<u64>,
    pub movestogo: Option<u64>,
    pub depth: Option<i32>,
    pub nodes: Option<u64>,
    pub mate: Option<i32>,
    pub perft: Option<i32>,
    pub ponder: bool,
    pub infinite: bool,
    pub search_moves: Vec<String>,
}

#[inline]
fn parse_next<T: std::str::FromStr>(parts: &[&str], i: usize) -> Option<T> {
    parts.get(i + 1).and_then(|v| v.parse::<T>().ok())
}

fn looks_like_move(token: &str) -> bool {
    let bytes = token.as_bytes();
    (4..=5).contains(&bytes.len())
        && bytes[0].is_ascii_lowercase()
        && bytes[1].is_ascii_digit()
        && bytes[2].is_ascii_lowercase()
        && bytes[3].is_ascii_digit()
}

#[must_use]
pub fn parse_go_params(parts: &[&str]) -> GoParams {
    let mut params = GoParams::default();
    let mut i = 1;

    while i < parts.len() {
        let consumed = match parts[i] {
            "wtime" => {
                params.wtime = parse_next(parts, i);
                2
            }
            "btime" => {
                params.btime = parse_next(parts, i);
                2
            }
            "winc" => {
                params.winc = parse_next(parts, i);
                2
            }
            "binc" => {
                params.binc = parse_next(parts, i);
                2
            }
            "movetime" => {
                params.movetime = parse_next(parts, i);
                2
            }
            "movestogo" => {
                params.movestogo = parse_next(parts, i);
                2
            }
            "nodes" => {
                params.nodes = parse_next(parts, i);
                2
            }
            "depth" => {
                params.depth = parse_next(parts, i);
                2
            }
            "mate" => {
                params.mate = parse_next(parts, i);
                2
            }
            "perft" => {
                params.perft = parse_next(parts, i);
                2
            }
            "ponder" => {
                params.ponder = true;
                1
            }
            "infinite" => {
                params.infinite = true;
                1
            }
            "searchmoves" => {
                let mut consumed = 1;
                while let Some(token) = parts.get(i + consumed) {
                    if !looks_like_move(token) {
                        break;
                    }
                    params.search_moves.push((*token).to_string());
                    consumed += 1;
                }
                consumed
            }
            // Unknown token: skip (protocol errors never kill the line)
            _ => 1,
        };
        i += consumed;
    }
    params
}

impl GoParams {
    /// Resolve the parameters into a search request. Zero-valued depth,
    /// node, time and mate limits fall back to an infinite search.
    #[must_use]
    pub fn into_request(self, use_book: bool, debug: bool) -> SearchRequest {
        let mode = if let Some(d) = self.perft {
            SearchMode::Perft(d.max(1))
        } else if self.ponder {
            SearchMode::Ponder {
                wtime: self.wtime.unwrap_or(0),
                btime: self.btime.unwrap_or(0),
                winc: self.winc.unwrap_or(0),
                binc: self.binc.unwrap_or(0),
                movestogo: self.movestogo.unwrap_or(0) as u32,
                movetime: self.movetime.unwrap_or(0),
            }
        } else if let Some(d) = self.depth.filter(|d| *d > 0) {
            SearchMode::FixedDepth(d)
        } else if let Some(n) = self.nodes.filter(|n| *n > 0) {
            SearchMode::FixedNodes(n)
        } else if let Some(t) = self.movetime.filter(|t| *t > 0) {
            SearchMode::FixedTime(t)
        } else if let Some(m) = self.mate.filter(|m| *m > 0) {
            SearchMode::MateIn(m)
        } else if self.wtime.is_some() || self.btime.is_some() {
            SearchMode::TimeControl {
                wtime: self.wtime.unwrap_or(0),
                btime: self.btime.unwrap_or(0),
                winc: self.winc.unwrap_or(0),
                binc: self.binc.unwrap_or(0),
                movestogo: self.movestogo.unwrap_or(0) as u32,
            }
        } else {
            SearchMode::Infinite
        };

        SearchRequest {
            mode,
            search_moves: self.search_moves,
            use_book,
            debug,
        }
    }
}

#[must_use]
pub fn parse_uci_command(line: &str) -> Option<UciCommand> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parts: Vec<&str> = trimmed.split_whitespace().collect();

    let owned_parts = || {
        parts
            .iter()
            .map(|p| (*p).to_string())
            .collect::<Vec<String>>()
    };

    let cmd = match parts[0] {
        "uci" => UciCommand::Uci,
        "isready" => UciCommand::IsReady,
        "ucinewgame" => UciCommand::UciNewGame,
        "position" => UciCommand::Position(owned_parts()),
        "go" => UciCommand::Go(owned_parts()),
        "perft" => {
            let depth = parts
                .get(1)
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(1);
            UciCommand::Perft(depth)
        }
        "setoption" => UciCommand::SetOption(owned_parts()),
        "debug" => UciCommand::Debug(parts.get(1).map(|v| (*v).to_string())),
        "stop" => UciCommand::Stop,
        "ponderhit" => UciCommand::PonderHit,
        "quit" => UciCommand::Quit,
        _ => UciCommand::Unknown(trimmed.to_string()),
    };

    Some(cmd)
}
