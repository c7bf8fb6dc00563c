//! Expectimax move selection (single-threaded and root-parallel) for 2048.
//!
//! This module provides two policy implementations:
//! - [`Expectimax`]: evaluates the four root moves one after another.
//! - [`ExpectimaxParallel`]: evaluates the four root moves on rayon.
//!
//! Each root move is scored by a chance node over the moved board, with its own
//! transposition cache and counters. Nothing is shared between root moves or
//! between calls, so both variants return identical values.
//!
//! Quick start
//! ```
//! use slide2048::board::Board;
//! use slide2048::engine::Move;
//! use slide2048::expectimax::{Expectimax, ExpectimaxParallel, SearchConfig};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(123);
//! let b0 = Board::new_game(&mut rng);
//!
//! let cfg = SearchConfig { depth_cap: Some(2), ..Default::default() };
//! let mut ex = Expectimax::with_config(cfg.clone());
//! let m = ex.best_move(b0);
//! assert!(m.is_some());
//!
//! let mut ex_par = ExpectimaxParallel::with_config(cfg);
//! assert_eq!(ex_par.best_move(b0), m);
//! assert!(Move::code_of(m) >= 0);
//! ```

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::board::Board;
use crate::engine::Move;

mod search_par;
mod search_seq;

pub use search_par::ExpectimaxParallel;
pub use search_seq::Expectimax;

/// Hard ceiling on the search depth; bounds recursion regardless of configuration.
pub const MAX_DEPTH_LIMIT: u32 = 16;

/// Configurable knobs for Expectimax.
///
/// - `prob_threshold`: chance nodes reached with a smaller cumulative probability are leaves.
/// - `cache_depth_limit`: chance nodes at this depth or deeper skip the cache.
/// - `cache_enabled`: enable/disable transposition table usage.
/// - `depth_cap`: optional cap applied to the dynamic depth.
/// - `node_budget`: optional node limit per root move; once reached, chance nodes are leaves.
/// - `cancel`: optional external flag; once set, chance nodes are leaves.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub prob_threshold: f32,
    pub cache_depth_limit: u32,
    pub cache_enabled: bool,
    pub depth_cap: Option<u32>,
    pub node_budget: Option<u64>,
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            prob_threshold: 1e-4,
            cache_depth_limit: 15,
            cache_enabled: true,
            depth_cap: None,
            node_budget: None,
            cancel: None,
        }
    }
}

impl SearchConfig {
    /// Depth limit for a root board: `max(3, distinct_tiles - 2)`, then the cap.
    pub fn depth_limit(&self, board: Board) -> u32 {
        let dyn_depth = 3.max(board.count_distinct_tiles() as i32 - 2) as u32;
        let depth = match self.depth_cap {
            Some(cap) => dyn_depth.min(cap),
            None => dyn_depth,
        };
        debug_assert!(depth <= MAX_DEPTH_LIMIT);
        depth.min(MAX_DEPTH_LIMIT)
    }
}

/// Per-branch expected value at the root.
///
/// - `ev` is the chance-node value of the board after `dir`.
/// - `legal` is false when the move is a no-op for the current board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchEval {
    pub dir: Move,
    pub ev: f64,
    pub legal: bool,
}

impl BranchEval {
    fn illegal(dir: Move) -> Self { BranchEval { dir, ev: 0.0, legal: false } }
}

/// Diagnostics for the last evaluation, summed over its root moves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Max and chance nodes visited.
    pub nodes: u64,
    pub cache_hits: u64,
    /// Entries left in the per-root caches when each root move finished.
    pub cache_size: u64,
    /// Deepest chance node turned into a leaf.
    pub max_depth: u32,
    /// Largest `nodes` seen since the last reset.
    pub peak_nodes: u64,
}

impl SearchStats {
    fn absorb(&mut self, other: &SearchStats) {
        self.nodes += other.nodes;
        self.cache_hits += other.cache_hits;
        self.cache_size += other.cache_size;
        self.max_depth = self.max_depth.max(other.max_depth);
    }
}

/// First legal branch with the strictly greatest value.
fn pick_best(branches: &[BranchEval; 4]) -> Option<Move> {
    let mut best: Option<&BranchEval> = None;
    for branch in branches.iter().filter(|b| b.legal) {
        if best.map_or(true, |b| branch.ev > b.ev) {
            best = Some(branch);
        }
    }
    best.map(|b| b.dir)
}

/// Select a move for `board` with default settings.
///
/// `None` means no direction changes the board.
pub fn select_move(board: Board) -> Option<Move> { Expectimax::new().best_move(board) }

/// Like [`select_move`], but as the integer code callers expect:
/// 0 up, 1 down, 2 left, 3 right, -1 no legal move.
pub fn select_move_code(board: Board) -> i32 { Move::code_of(select_move(board)) }

/// Bench-only: expose the raw heuristic value for a board.
///
/// Enabled only with the `bench-internal` feature to keep the public API small.
#[cfg(feature = "bench-internal")]
#[inline]
pub fn heuristic_value(board: Board) -> f64 { crate::tables::init().heuristics().evaluate(board) }
