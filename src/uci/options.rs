//! The UCI option table.

use crate::search::{Search, SearchParams, DEFAULT_TT_MB};

fn print_spin(
    name: &str,
    default: impl std::fmt::Display,
    min: impl std::fmt::Display,
    max: impl std::fmt::Display,
) {
    println!("option name {name} type spin default {default} min {min} max {max}");
}

fn print_check(name: &str, default: bool) {
    println!(
        "option name {name} type check default {}",
        if default { "true" } else { "false" }
    );
}

fn parse_bool(value: Option<&str>) -> Option<bool> {
    value.map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1"))
}

pub struct UciOptions {
    pub hash_mb: usize,
    pub ponder: bool,
    pub own_book: bool,
}

impl UciOptions {
    #[must_use]
    pub fn new(hash_mb: usize) -> Self {
        UciOptions {
            hash_mb,
            ponder: false,
            own_book: true,
        }
    }

    /// Answer `uci`: identity, the option table, `uciok`.
    pub fn print(&self, params: &SearchParams) {
        println!("id name Rampart");
        println!("id author the Rampart authors");

        print_spin("Hash", self.hash_mb, 1, 4096);
        print_check("Ponder", self.ponder);
        println!("option name Clear_Hash type button");
        print_check("OwnBook", self.own_book);

        // Search toggles and margins
        print_check("UsePVS", params.use_pvs);
        print_check("UseAspiration", params.use_aspiration);
        print_check("UseMtdf", params.use_mtdf);
        print_check("UseQuiescence", params.use_quiescence);
        print_check("UseNullMove", params.use_null_move);
        print_check("UseRazoring", params.use_razoring);
        print_check("UseFutility", params.use_futility);
        print_check("UseLmr", params.use_lmr);
        print_spin("RfpMargin", params.rfp_margin, 50, 500);
        print_spin("RazorMargin", params.razor_margin, 200, 1200);
        print_spin("AspirationWindow", params.aspiration_window, 10, 100);
        print_spin("ContemptFactor", params.contempt_factor, 0, 10);

        println!("uciok");
    }

    /// Apply one `setoption`. Unknown names are logged and ignored.
    pub fn apply(&mut self, name: &str, value: Option<&str>, search: &mut Search) {
        let normalized = name.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "hash" => {
                let mb = value
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(DEFAULT_TT_MB)
                    .clamp(1, 4096);
                if mb != self.hash_mb && search.resize_tt(mb) {
                    self.hash_mb = mb;
                }
            }
            "clear_hash" => {
                search.clear_tt();
            }
            "ponder" => {
                if let Some(v) = parse_bool(value) {
                    self.ponder = v;
                }
            }
            "ownbook" => {
                if let Some(v) = parse_bool(value) {
                    self.own_book = v;
                }
            }
            "usepvs" => {
                if let Some(v) = parse_bool(value) {
                    search.params_mut().use_pvs = v;
                }
            }
            "useaspiration" => {
                if let Some(v) = parse_bool(value) {
                    search.params_mut().use_aspiration = v;
                }
            }
            "usemtdf" => {
                if let Some(v) = parse_bool(value) {
                    search.params_mut().use_mtdf = v;
                }
            }
            "usequiescence" => {
                if let Some(v) = parse_bool(value) {
                    search.params_mut().use_quiescence = v;
                }
            }
            "usenullmove" => {
                if let Some(v) = parse_bool(value) {
                    search.params_mut().use_null_move = v;
                }
            }
            "userazoring" => {
                if let Some(v) = parse_bool(value) {
                    search.params_mut().use_razoring = v;
                }
            }
            "usefutility" => {
                if let Some(v) = parse_bool(value) {
                    search.params_mut().use_futility = v;
                }
            }
            "uselmr" => {
                if let Some(v) = parse_bool(value) {
                    search.params_mut().use_lmr = v;
                }
            }
            "rfpmargin" => {
                if let Some(v) = value.and_then(|v| v.parse::<i32>().ok()) {
                    search.params_mut().rfp_margin = v.clamp(50, 500);
                }
            }
            "razormargin" => {
                if let Some(v) = value.and_then(|v| v.parse::<i32>().ok()) {
                    search.params_mut().razor_margin = v.clamp(200, 1200);
                }
            }
            "aspirationwindow" => {
                if let Some(v) = value.and_then(|v| v.parse::<i32>().ok()) {
                    search.params_mut().aspiration_window = v.clamp(10, 100);
                }
            }
            "contemptfactor" => {
                if let Some(v) = value.and_then(|v| v.parse::<i32>().ok()) {
                    search.params_mut().contempt_factor = v.clamp(0, 10);
                }
            }
            _ => {
                eprintln!("Unknown option: {name}");
            }
        }
    }
}

/// Split a `setoption` line into name and optional value.
#[must_use]
pub fn parse_setoption(parts: &[&str]) -> Option<(String, Option<String>)> {
    if parts.is_empty() || parts[0] != "setoption" {
        return None;
    }

    let mut name_parts: Vec<&str> = Vec::new();
    let mut value_parts: Vec<&str> = Vec::new();
    let mut mode = "";

    for part in parts.iter().skip(1) {
        match *part {
            "name" => mode = "name",
            "value" => mode = "value",
            _ => match mode {
                "name" => name_parts.push(part),
                "value" => value_parts.push(part),
                _ => {}
            },
        }
    }

    if name_parts.is_empty() {
        return None;
    }

    let name = name_parts.join(" ");
    let value = if value_parts.is_empty() {
        None
    } else {
        Some(value_parts.join(" "))
    };

    Some((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_setoption_name_and_value() {
        let parts: Vec<&str> = "setoption name Hash value 128".split_whitespace().collect();
        let (name, value) = parse_setoption(&parts).unwrap();
        assert_eq!(name, "Hash");
        assert_eq!(value.as_deref(), Some("128"));
    }

    #[test]
    fn test_parse_setoption_button() {
        let parts: Vec<&str> = "setoption name Clear_Hash".split_whitespace().collect();
        let (name, value) = parse_setoption(&parts).unwrap();
        assert_eq!(name, "Clear_Hash");
        assert!(value.is_none());
    }

    #[test]
    fn test_parse_setoption_multiword_name() {
        let parts: Vec<&str> = "setoption name Some Long Name value x y"
            .split_whitespace()
            .collect();
        let (name, value) = parse_setoption(&parts).unwrap();
        assert_eq!(name, "Some Long Name");
        assert_eq!(value.as_deref(), Some("x y"));
    }

    #[test]
    fn test_apply_toggles_and_margins() {
        let mut options = UciOptions::new(DEFAULT_TT_MB);
        let mut search = Search::new(1);

        options.apply("UseMtdf", Some("true"), &mut search);
        assert!(search.params().use_mtdf);

        options.apply("RfpMargin", Some("200"), &mut search);
        assert_eq!(search.params().rfp_margin, 200);

        options.apply("OwnBook", Some("false"), &mut search);
        assert!(!options.own_book);
    }
}
