//! Tunable search parameters.
//!
//! Feature toggles and margins live here rather than in constants so the
//! UCI option table can adjust them without a rebuild.

#[derive(Debug, Clone, Copy)]
pub struct SearchParams {
    /// Principal variation search (null-window siblings with re-search).
    pub use_pvs: bool,
    /// Narrow-window root searches seeded by the previous iteration.
    pub use_aspiration: bool,
    /// Drive iterations with MTD(f) zero-window probes instead of aspiration.
    pub use_mtdf: bool,
    /// Extend noisy lines past the horizon.
    pub use_quiescence: bool,

    pub use_null_move: bool,
    /// Minimum remaining depth for a null-move attempt.
    pub null_move_depth: i32,
    /// Confirm null-move cutoffs with a reduced re-search at depth above
    /// `null_verification_depth` (costs one extra reduction ply).
    pub null_verification: bool,
    pub null_verification_depth: i32,

    pub use_rfp: bool,
    pub rfp_margin: i32,

    pub use_razoring: bool,
    pub razor_depth: i32,
    pub razor_margin: i32,

    /// Frontier/pre-frontier futility family including limited razoring.
    pub use_futility: bool,

    pub use_lmp: bool,
    pub lmp_min_depth: i32,
    pub lmp_min_moves: usize,

    pub use_lmr: bool,
    pub lmr_min_depth: i32,
    pub lmr_min_moves: usize,
    pub lmr_reduction: i32,

    pub aspiration_start_depth: i32,
    pub aspiration_window: i32,
    pub aspiration_window_wide: i32,

    /// Centipawns per point of game phase a within-search draw is
    /// penalized by, from the mover's viewpoint.
    pub contempt_factor: i32,
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            use_pvs: true,
            use_aspiration: true,
            use_mtdf: false,
            use_quiescence: true,

            use_null_move: true,
            null_move_depth: 3,
            null_verification: true,
            null_verification_depth: 6,

            use_rfp: true,
            rfp_margin: 150,

            use_razoring: true,
            razor_depth: 3,
            razor_margin: 600,

            use_futility: true,

            use_lmp: true,
            lmp_min_depth: 3,
            lmp_min_moves: 6,

            use_lmr: true,
            lmr_min_depth: 3,
            lmr_min_moves: 3,
            lmr_reduction: 1,

            aspiration_start_depth: 4,
            aspiration_window: 30,
            aspiration_window_wide: 200,

            contempt_factor: 2,
        }
    }
}
