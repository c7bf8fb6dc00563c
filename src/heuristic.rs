//! Per-row score and heuristic tables, and the board evaluation built from them.

use crate::board::{row_to_cells, Board, Row};
use crate::engine::LINE_TABLE_SIZE;

/// Floor added once per board so that live positions score well above a lost one.
pub const LOST_PENALTY: f64 = 200_000.0;

const SUM_POWER: f64 = 3.5;
const SUM_WEIGHT: f64 = 11.0;
const MONOTONICITY_POWER: f64 = 4.0;
const MONOTONICITY_WEIGHT: f64 = 47.0;
const MERGES_WEIGHT: f64 = 700.0;
const EMPTY_WEIGHT: f64 = 270.0;

/// Exact merge score and heuristic utility for every packed row.
pub struct HeuristicTables {
    score: Box<[u64]>,
    heuristic: Box<[f64]>,
}

impl HeuristicTables {
    pub fn build() -> Self {
        let mut score = vec![0u64; LINE_TABLE_SIZE];
        let mut heuristic = vec![0.0f64; LINE_TABLE_SIZE];
        for (i, (s, h)) in score.iter_mut().zip(heuristic.iter_mut()).enumerate() {
            let cells = row_to_cells(i as Row);
            *s = calc_score(&cells);
            *h = calc_heuristic(&cells);
        }
        HeuristicTables { score: score.into_boxed_slice(), heuristic: heuristic.into_boxed_slice() }
    }

    #[inline]
    pub fn row_score(&self, row: Row) -> u64 { self.score[row as usize] }

    #[inline]
    pub fn row_heuristic(&self, row: Row) -> f64 { self.heuristic[row as usize] }

    /// Total game score implied by the tiles on the board.
    ///
    /// ```
    /// use slide2048::board::Board;
    /// use slide2048::tables;
    /// // a single 4 was built from two 2s
    /// assert_eq!(tables::init().heuristics().score(Board::from_raw(0x2000)), 4);
    /// ```
    pub fn score(&self, board: Board) -> u64 {
        (0..4).map(|idx| self.row_score(board.row(idx))).sum()
    }

    /// Static evaluation: the lost-board floor plus the four row utilities.
    ///
    /// Only rows are read. Column structure is reached through the search,
    /// which also explores vertical moves.
    #[inline]
    pub fn evaluate(&self, board: Board) -> f64 {
        (0..4).fold(LOST_PENALTY, |acc, idx| acc + self.row_heuristic(board.row(idx)))
    }
}

impl Board {
    /// Compute the total score for this board from the process-wide tables.
    #[inline]
    pub fn score(self) -> u64 { crate::tables::init().heuristics().score(self) }
}

// Credit to Nneonneo
fn calc_score(line: &[u8; 4]) -> u64 {
    line.iter()
        .filter(|&&tile| tile >= 2)
        // the score is the total sum of the tile and all intermediate merged tiles
        .map(|&tile| (tile as u64 - 1) * (1 << tile))
        .sum()
}

fn calc_heuristic(line: &[u8; 4]) -> f64 {
    calc_empty(line) + calc_merges(line) - calc_monotonicity(line) - calc_sum(line)
}

fn calc_sum(line: &[u8; 4]) -> f64 {
    line.iter().fold(0., |acc, &tile_val| acc + (tile_val as f64).powf(SUM_POWER)) * SUM_WEIGHT
}

fn calc_empty(line: &[u8; 4]) -> f64 {
    line.iter().filter(|&&tile_val| tile_val == 0).count() as f64 * EMPTY_WEIGHT
}

/// Runs of equal tiles, ignoring empty cells between them; a run of `k` earns `k`.
fn calc_merges(line: &[u8; 4]) -> f64 {
    let mut prev = 0;
    let mut counter = 0u32;
    let mut merges = 0u32;
    for &tile_val in line.iter().filter(|&&t| t != 0) {
        if prev == tile_val {
            counter += 1;
        } else if counter > 0 {
            merges += 1 + counter;
            counter = 0;
        }
        prev = tile_val;
    }
    if counter > 0 {
        merges += 1 + counter;
    }
    merges as f64 * MERGES_WEIGHT
}

/// Only the smaller of the two directional violation totals is charged.
fn calc_monotonicity(line: &[u8; 4]) -> f64 {
    let mut monotonicity_left = 0.;
    let mut monotonicity_right = 0.;
    for i in 1..4 {
        let tile1 = (line[i - 1] as f64).powf(MONOTONICITY_POWER);
        let tile2 = (line[i] as f64).powf(MONOTONICITY_POWER);
        if tile1 > tile2 {
            monotonicity_left += tile1 - tile2;
        } else {
            monotonicity_right += tile2 - tile1;
        }
    }
    f64::min(monotonicity_left, monotonicity_right) * MONOTONICITY_WEIGHT
}
