use rayon::prelude::*;

use crate::board::Board;
use crate::engine::Move;
use crate::tables::{self, Tables};

use super::search_seq::evaluate_root;
use super::{pick_best, BranchEval, SearchConfig, SearchStats};

/// Parallel Expectimax: the four root moves are scored concurrently on rayon.
///
/// Each root move still gets its own private cache and counters, so results
/// match [`super::Expectimax`] exactly.
pub struct ExpectimaxParallel<'t> {
    tables: &'t Tables,
    cfg: SearchConfig,
    stats: SearchStats,
}

impl ExpectimaxParallel<'static> {
    pub fn new() -> Self { Self::with_config(SearchConfig::default()) }

    pub fn with_config(cfg: SearchConfig) -> Self { Self::with_tables(tables::init(), cfg) }
}

impl<'t> ExpectimaxParallel<'t> {
    pub fn with_tables(tables: &'t Tables, cfg: SearchConfig) -> Self {
        Self { tables, cfg, stats: SearchStats::default() }
    }

    /// Compute the best move using parallel expectimax.
    ///
    /// This is a convenience wrapper around `branch_evals` that just picks the best move.
    #[inline]
    pub fn best_move(&mut self, board: Board) -> Option<Move> {
        let branches = self.branch_evals(board);
        pick_best(&branches)
    }

    /// Get both the best move and all branch evaluations from one search.
    #[inline]
    pub fn best_move_with_branches(&mut self, board: Board) -> (Option<Move>, [BranchEval; 4]) {
        let branches = self.branch_evals(board);
        (pick_best(&branches), branches)
    }

    /// Compute EV for each direction in parallel.
    ///
    /// Returns a fixed array in order: `[Up, Down, Left, Right]` and marks
    /// illegal moves as `legal=false`.
    pub fn branch_evals(&mut self, board: Board) -> [BranchEval; 4] {
        let depth_limit = self.cfg.depth_limit(board);
        let tables = self.tables;
        let cfg = &self.cfg;
        let out_vec: Vec<(BranchEval, SearchStats)> = Move::ALL
            .par_iter()
            .map(|&dir| evaluate_root(tables, cfg, board, dir, depth_limit))
            .collect();
        let mut totals = SearchStats::default();
        let mut out = Move::ALL.map(BranchEval::illegal);
        // collect() keeps the input order
        for (slot, (branch, stats)) in out.iter_mut().zip(out_vec) {
            totals.absorb(&stats);
            *slot = branch;
        }
        let peak_nodes = self.stats.peak_nodes.max(totals.nodes);
        self.stats = SearchStats { peak_nodes, ..totals };
        out
    }

    /// Value of the best branch, or the static heuristic when no move is legal.
    pub fn state_value(&mut self, board: Board) -> f64 {
        let branches = self.branch_evals(board);
        branches
            .iter()
            .filter(|branch| branch.legal)
            .map(|branch| branch.ev)
            .reduce(f64::max)
            .unwrap_or_else(|| self.tables.heuristics().evaluate(board))
    }

    /// Statistics collected from the last call to [`Self::best_move`],
    /// [`Self::branch_evals`] or [`Self::state_value`].
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    /// Reset accumulated stats to zero.
    #[inline]
    pub fn reset_stats(&mut self) { self.stats = SearchStats::default(); }
}

impl Default for ExpectimaxParallel<'static> { fn default() -> Self { Self::new() } }
