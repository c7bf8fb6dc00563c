//! Process-wide precomputed tables.
//!
//! Built once, on the first call to [`init`], and read-only afterwards. The
//! search and move engine take `&Tables` so callers may also hold their own copy
//! from [`Tables::build`].

use std::sync::OnceLock;
use std::time::Instant;

use crate::engine::MoveTables;
use crate::heuristic::HeuristicTables;

pub struct Tables {
    moves: MoveTables,
    heuristics: HeuristicTables,
}

impl Tables {
    /// Build every table from scratch.
    pub fn build() -> Self {
        let start = Instant::now();
        let tables = Tables { moves: MoveTables::build(), heuristics: HeuristicTables::build() };
        tracing::trace!(elapsed_ms = start.elapsed().as_millis() as u64, "built move and heuristic tables");
        tables
    }

    #[inline]
    pub fn moves(&self) -> &MoveTables { &self.moves }

    #[inline]
    pub fn heuristics(&self) -> &HeuristicTables { &self.heuristics }
}

static TABLES: OnceLock<Tables> = OnceLock::new();

/// Initialize internal tables on first use. Safe to call multiple times.
#[inline]
pub fn init() -> &'static Tables { TABLES.get_or_init(Tables::build) }
