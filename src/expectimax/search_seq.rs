use std::collections::HashMap;
use std::sync::atomic::Ordering;

use ahash::RandomState as AHasher;

use crate::board::Board;
use crate::engine::Move;
use crate::tables::{self, Tables};

use super::{pick_best, BranchEval, SearchConfig, SearchStats};

#[derive(Debug, Clone, Copy)]
struct CacheEntry { depth: u32, value: f64 }

/// State for scoring one root move: its cache, depth limit and counters.
///
/// Created fresh for each root move and dropped once that move is scored.
pub(super) struct SearchState<'a> {
    tables: &'a Tables,
    cfg: &'a SearchConfig,
    cache: HashMap<Board, CacheEntry, AHasher>,
    depth_limit: u32,
    stats: SearchStats,
}

impl<'a> SearchState<'a> {
    pub(super) fn new(tables: &'a Tables, cfg: &'a SearchConfig, depth_limit: u32) -> Self {
        Self {
            tables,
            cfg,
            cache: HashMap::with_hasher(AHasher::new()),
            depth_limit,
            stats: SearchStats::default(),
        }
    }

    /// Expected value over every tile nature can place on `board`.
    pub(super) fn chance_node(&mut self, board: Board, depth: u32, cprob: f32) -> f64 {
        self.stats.nodes += 1;
        if depth >= self.depth_limit || cprob < self.cfg.prob_threshold || self.exhausted() {
            self.stats.max_depth = self.stats.max_depth.max(depth);
            return self.tables.heuristics().evaluate(board);
        }

        let cacheable = self.cfg.cache_enabled && depth < self.cfg.cache_depth_limit;
        if cacheable {
            // an entry recorded at a shallower depth had at least as much budget left
            if let Some(entry) = self.cache.get(&board) {
                if entry.depth <= depth {
                    self.stats.cache_hits += 1;
                    return entry.value;
                }
            }
        }

        let num_empty_tiles = board.count_empty();
        if num_empty_tiles == 0 {
            // only reachable if the caller skipped the legality check
            return self.tables.heuristics().evaluate(board);
        }
        let base_prob = cprob / num_empty_tiles as f32;
        let mut tiles_searched = 0;
        let mut tmp = board.raw();
        let mut insert_tile = 1u64;
        let mut expectation = 0.0;
        while tiles_searched < num_empty_tiles {
            if (tmp & 0xf) == 0 {
                let with_two = Board::from_raw(board.raw() | insert_tile);
                expectation += self.max_node(with_two, depth + 1, base_prob * 0.9) * 0.9;
                let with_four = Board::from_raw(board.raw() | (insert_tile << 1));
                expectation += self.max_node(with_four, depth + 1, base_prob * 0.1) * 0.1;
                tiles_searched += 1;
            }
            tmp >>= 4;
            insert_tile <<= 4;
        }
        expectation /= num_empty_tiles as f64;

        if cacheable {
            self.cache.insert(board, CacheEntry { depth, value: expectation });
        }
        expectation
    }

    /// Best chance value over the legal moves; a stuck board scores its own heuristic.
    pub(super) fn max_node(&mut self, board: Board, depth: u32, cprob: f32) -> f64 {
        self.stats.nodes += 1;
        let tables = self.tables;
        let mut best: Option<f64> = None;
        for (_, moved) in tables.moves().legal_moves(board) {
            let value = self.chance_node(moved, depth, cprob);
            best = Some(best.map_or(value, |b| b.max(value)));
        }
        best.unwrap_or_else(|| tables.heuristics().evaluate(board))
    }

    fn exhausted(&self) -> bool {
        self.cfg.node_budget.is_some_and(|budget| self.stats.nodes >= budget)
            || self.cfg.cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn finish(mut self) -> SearchStats {
        self.stats.cache_size = self.cache.len() as u64;
        self.stats
    }
}

/// Score one root direction under a fresh [`SearchState`].
pub(super) fn evaluate_root(
    tables: &Tables,
    cfg: &SearchConfig,
    board: Board,
    dir: Move,
    depth_limit: u32,
) -> (BranchEval, SearchStats) {
    let moved = tables.moves().shift(board, dir);
    if moved == board {
        return (BranchEval::illegal(dir), SearchStats::default());
    }
    let mut state = SearchState::new(tables, cfg, depth_limit);
    let ev = state.chance_node(moved, 0, 1.0);
    let stats = state.finish();
    tracing::debug!(
        dir = ?dir,
        ev,
        nodes = stats.nodes,
        cache_hits = stats.cache_hits,
        cache_size = stats.cache_size,
        max_depth = stats.max_depth,
        depth_limit,
        "scored root move"
    );
    (BranchEval { dir, ev, legal: true }, stats)
}

/// Single-threaded Expectimax search.
///
/// Holds the read-only tables and the configuration; all search state lives
/// only for the duration of one root move.
pub struct Expectimax<'t> {
    tables: &'t Tables,
    cfg: SearchConfig,
    stats: SearchStats,
}

impl Expectimax<'static> {
    /// Default configuration over the process-wide tables.
    pub fn new() -> Self { Self::with_config(SearchConfig::default()) }

    pub fn with_config(cfg: SearchConfig) -> Self { Self::with_tables(tables::init(), cfg) }
}

impl<'t> Expectimax<'t> {
    pub fn with_tables(tables: &'t Tables, cfg: SearchConfig) -> Self {
        Self { tables, cfg, stats: SearchStats::default() }
    }

    pub fn config(&self) -> &SearchConfig { &self.cfg }

    /// Compute the best move using expectimax; `None` when no move changes the board.
    ///
    /// Example
    /// ```
    /// use slide2048::board::Board;
    /// use slide2048::expectimax::{Expectimax, SearchConfig};
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(7);
    /// let b = Board::new_game(&mut rng);
    /// let mut ex = Expectimax::with_config(SearchConfig { depth_cap: Some(2), ..Default::default() });
    /// assert!(ex.best_move(b).is_some());
    /// assert_eq!(ex.best_move(Board::from_raw(0x1212_2121_1212_2121)), None);
    /// ```
    pub fn best_move(&mut self, board: Board) -> Option<Move> {
        let branches = self.branch_evals(board);
        pick_best(&branches)
    }

    /// Compute EV for each direction.
    ///
    /// Returns a fixed array in order: `[Up, Down, Left, Right]` and marks
    /// illegal moves as `legal=false`.
    pub fn branch_evals(&mut self, board: Board) -> [BranchEval; 4] {
        let depth_limit = self.cfg.depth_limit(board);
        let mut totals = SearchStats::default();
        let out = Move::ALL.map(|dir| {
            let (branch, stats) = evaluate_root(self.tables, &self.cfg, board, dir, depth_limit);
            totals.absorb(&stats);
            branch
        });
        self.record(totals);
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

    fn record(&mut self, totals: SearchStats) {
        let peak_nodes = self.stats.peak_nodes.max(totals.nodes);
        self.stats = SearchStats { peak_nodes, ..totals };
    }
}

impl Default for Expectimax<'static> { fn default() -> Self { Self::new() } }

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    use rand::{rngs::StdRng, SeedableRng};

    const STUCK: Board = Board::from_raw(0x1212_2121_1212_2121);

    fn quick_cfg() -> SearchConfig { SearchConfig { depth_cap: Some(2), ..Default::default() } }

    #[test]
    fn single_empty_cell_expectation_is_exact() {
        let tables = tables::init();
        let cfg = SearchConfig { cache_enabled: false, ..Default::default() };
        let board = Board::from_raw(0x1234_4321_1234_4320);
        assert_eq!(board.count_empty(), 1);

        let mut state = SearchState::new(tables, &cfg, 2);
        let expectation = state.chance_node(board, 0, 1.0);

        let mut state = SearchState::new(tables, &cfg, 2);
        let with_two = state.max_node(Board::from_raw(board.raw() | 0x1), 1, 0.9);
        let mut state = SearchState::new(tables, &cfg, 2);
        let with_four = state.max_node(Board::from_raw(board.raw() | 0x2), 1, 0.1);

        assert_eq!(expectation, with_two * 0.9 + with_four * 0.1);
    }

    #[test]
    fn leaves_return_static_heuristic() {
        let tables = tables::init();
        let cfg = SearchConfig::default();
        let board = Board::from_raw(0x1200_0000_0000_0001);
        let heuristic = tables.heuristics().evaluate(board);

        let mut state = SearchState::new(tables, &cfg, 3);
        assert_eq!(state.chance_node(board, 3, 1.0), heuristic);
        assert_eq!(state.chance_node(board, 0, 5e-5), heuristic);
        assert_eq!(state.stats.nodes, 2);
        assert_eq!(state.stats.max_depth, 3);
    }

    #[test]
    fn stuck_max_node_scores_its_own_board() {
        let tables = tables::init();
        let cfg = SearchConfig::default();
        let mut state = SearchState::new(tables, &cfg, 3);
        assert_eq!(state.max_node(STUCK, 1, 1.0), tables.heuristics().evaluate(STUCK));
    }

    #[test]
    fn repeated_query_hits_cache() {
        let tables = tables::init();
        let cfg = SearchConfig::default();
        let board = Board::from_raw(0x1234_4321_1234_0300);
        let mut state = SearchState::new(tables, &cfg, 3);

        let first = state.chance_node(board, 0, 1.0);
        let hits = state.stats.cache_hits;
        let nodes = state.stats.nodes;

        let second = state.chance_node(board, 0, 1.0);
        assert_eq!(second, first);
        assert_eq!(state.stats.cache_hits, hits + 1);
        assert_eq!(state.stats.nodes, nodes + 1);

        // deeper query may reuse the shallower entry
        let deeper = state.chance_node(board, 1, 1.0);
        assert_eq!(deeper, first);
        assert_eq!(state.stats.cache_hits, hits + 2);
    }

    #[test]
    fn deeper_entry_is_not_reused_shallower() {
        let tables = tables::init();
        let cfg = SearchConfig::default();
        let board = Board::from_raw(0x1234_4321_1234_0300);
        let mut state = SearchState::new(tables, &cfg, 3);

        state.chance_node(board, 1, 1.0);
        assert_eq!(state.cache.get(&board).map(|e| e.depth), Some(1));
        let nodes = state.stats.nodes;

        state.chance_node(board, 0, 1.0);
        assert!(state.stats.nodes > nodes + 1);
        assert_eq!(state.cache.get(&board).map(|e| e.depth), Some(0));
    }

    #[test]
    fn cache_respects_depth_limit_and_switch() {
        let tables = tables::init();
        let board = Board::from_raw(0x1234_4321_1234_0300);

        let shallow_only = SearchConfig { cache_depth_limit: 0, ..Default::default() };
        let mut state = SearchState::new(tables, &shallow_only, 3);
        state.chance_node(board, 0, 1.0);
        assert!(state.cache.is_empty());

        let disabled = SearchConfig { cache_enabled: false, ..Default::default() };
        let mut state = SearchState::new(tables, &disabled, 3);
        state.chance_node(board, 0, 1.0);
        state.chance_node(board, 0, 1.0);
        assert!(state.cache.is_empty());
        assert_eq!(state.stats.cache_hits, 0);
    }

    #[test]
    fn best_move_matches_branch_argmax() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut ex = Expectimax::with_config(quick_cfg());
        let mut board = Board::new_game(&mut rng);
        for _ in 0..8 {
            let branches = ex.branch_evals(board);
            for (branch, dir) in branches.iter().zip(Move::ALL) {
                assert_eq!(branch.dir, dir);
                assert_eq!(branch.legal, board.shift(dir) != board);
            }
            let best = ex.best_move(board).expect("live board has a move");
            let best_ev = branches.iter().find(|b| b.dir == best).map(|b| b.ev);
            let max_ev = branches.iter().filter(|b| b.legal).map(|b| b.ev).reduce(f64::max);
            assert_eq!(best_ev, max_ev);
            assert_eq!(ex.state_value(board), max_ev.unwrap());
            board = board.make_move(best, &mut rng);
        }
    }

    #[test]
    fn stuck_board_has_no_move() {
        let mut ex = Expectimax::new();
        assert_eq!(ex.best_move(STUCK), None);
        assert_eq!(Move::code_of(ex.best_move(STUCK)), -1);
        assert_eq!(ex.last_stats().nodes, 0);
        assert_eq!(ex.state_value(STUCK), tables::init().heuristics().evaluate(STUCK));
    }

    #[test]
    fn fresh_games_never_report_no_move() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut ex = Expectimax::with_config(quick_cfg());
        for _ in 0..20 {
            let board = Board::new_game(&mut rng);
            assert!(ex.best_move(board).is_some());
        }
    }

    #[test]
    fn stats_are_reported_per_call() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut ex = Expectimax::with_config(quick_cfg());
        let board = Board::new_game(&mut rng);
        ex.best_move(board);
        let stats = ex.last_stats();
        assert!(stats.nodes > 0);
        assert!(stats.max_depth <= 2);
        assert_eq!(stats.peak_nodes, stats.nodes);
        ex.reset_stats();
        assert_eq!(ex.last_stats(), SearchStats::default());
    }

    #[test]
    fn node_budget_bounds_each_root_move() {
        let mut rng = StdRng::seed_from_u64(17);
        let board = Board::new_game(&mut rng);
        let cfg = SearchConfig { node_budget: Some(50), ..Default::default() };
        let mut ex = Expectimax::with_config(cfg);
        assert!(ex.best_move(board).is_some());
        let legal = Move::ALL.iter().filter(|&&d| board.shift(d) != board).count() as u64;
        // past the budget, each of the (at most 3) open chance nodes finishes its
        // remaining spawns, and each spawn costs one max node plus at most 4 leaves
        assert!(ex.last_stats().nodes <= legal * (50 + 3 * 2 * 16 * 5));
    }

    #[test]
    fn cancelled_search_scores_moved_boards_statically() {
        let tables = tables::init();
        let flag = Arc::new(AtomicBool::new(true));
        let cfg = SearchConfig { cancel: Some(flag), ..Default::default() };
        let mut ex = Expectimax::with_tables(tables, cfg);
        let board = Board::from_raw(0x1000_0000_0000_0001);
        for branch in ex.branch_evals(board) {
            if branch.legal {
                let moved = tables.moves().shift(board, branch.dir);
                assert_eq!(branch.ev, tables.heuristics().evaluate(moved));
            }
        }
    }

    #[test]
    fn zero_depth_cap_is_one_ply_greedy() {
        let tables = tables::init();
        let cfg = SearchConfig { depth_cap: Some(0), ..Default::default() };
        let mut ex = Expectimax::with_tables(tables, cfg);
        let board = Board::from_raw(0x1100_2000_0000_0000);
        let expected = Move::ALL
            .into_iter()
            .filter(|&d| tables.moves().is_legal(board, d))
            .map(|d| (d, tables.heuristics().evaluate(tables.moves().shift(board, d))))
            .fold(None::<(Move, f64)>, |best, (d, v)| match best {
                Some((_, bv)) if bv >= v => best,
                _ => Some((d, v)),
            })
            .map(|(d, _)| d);
        assert_eq!(ex.best_move(board), expected);
    }
}
