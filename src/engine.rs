//! Move tables, table-driven move application and random tile insertion.
//!
//! Every one of the 65,536 possible rows is resolved once into its left- and
//! right-slid result. Vertical moves reuse the same row resolution: the board is
//! transposed so each column reads as a row, and the up/down tables store the
//! result already laid out as a board column, so no second transpose is needed.

use rand::Rng;

use crate::board::{self, cells_to_row, extract_line, row_to_cells, Board, Row, MAX_EXPONENT};
use crate::error::EngineError;
use crate::tables;

pub(crate) const LINE_TABLE_SIZE: usize = 0x1_0000; // 65,536 possible 16-bit lines

/// A direction to move/merge tiles.
///
/// The discriminants are the wire codes expected by existing callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Move {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl Move {
    /// All directions in code order.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    /// Code reported when no direction changes the board.
    pub const NO_MOVE_CODE: i32 = -1;

    #[inline]
    pub fn code(self) -> i32 { self as i32 }

    /// Map a selector result to its integer code (`-1` for "no legal move").
    ///
    /// ```
    /// use slide2048::engine::Move;
    /// assert_eq!(Move::code_of(Some(Move::Left)), 2);
    /// assert_eq!(Move::code_of(None), -1);
    /// ```
    #[inline]
    pub fn code_of(selected: Option<Move>) -> i32 {
        selected.map_or(Self::NO_MOVE_CODE, Move::code)
    }
}

impl TryFrom<i32> for Move {
    type Error = EngineError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Move::Up),
            1 => Ok(Move::Down),
            2 => Ok(Move::Left),
            3 => Ok(Move::Right),
            other => Err(EngineError::InvalidMoveCode(other)),
        }
    }
}

/// Precomputed slide results for every packed row.
pub struct MoveTables {
    shift_left: Box<[Row]>,
    shift_right: Box<[Row]>,
    shift_up: Box<[u64]>,
    shift_down: Box<[u64]>,
}

impl MoveTables {
    /// Resolve all 65,536 rows. Pure and deterministic.
    pub fn build() -> Self {
        // Allocate on the heap to avoid large stack frames
        let mut shift_left = vec![0 as Row; LINE_TABLE_SIZE];
        let mut shift_right = vec![0 as Row; LINE_TABLE_SIZE];
        let mut shift_up = vec![0u64; LINE_TABLE_SIZE];
        let mut shift_down = vec![0u64; LINE_TABLE_SIZE];

        for val in 0..LINE_TABLE_SIZE {
            let merged = merge_cells(row_to_cells(val as Row));
            let left = cells_to_row(compact_left(merged));
            let right = cells_to_row(compact_right(merged));
            shift_left[val] = left;
            shift_right[val] = right;
            shift_up[val] = row_as_column(left);
            shift_down[val] = row_as_column(right);
        }

        MoveTables {
            shift_left: shift_left.into_boxed_slice(),
            shift_right: shift_right.into_boxed_slice(),
            shift_up: shift_up.into_boxed_slice(),
            shift_down: shift_down.into_boxed_slice(),
        }
    }

    /// Left-slid result of a single row.
    #[inline]
    pub fn slide_left(&self, row: Row) -> Row { get_line_entry(&self.shift_left, row) }

    /// Right-slid result of a single row.
    #[inline]
    pub fn slide_right(&self, row: Row) -> Row { get_line_entry(&self.shift_right, row) }

    /// Return the board resulting from sliding/merging tiles in `dir` (no random insert).
    #[inline]
    pub fn shift(&self, board: Board, dir: Move) -> Board {
        match dir {
            Move::Left => self.shift_rows(board, &self.shift_left),
            Move::Right => self.shift_rows(board, &self.shift_right),
            Move::Up => self.shift_cols(board, &self.shift_up),
            Move::Down => self.shift_cols(board, &self.shift_down),
        }
    }

    /// A move is legal iff it changes the board.
    #[inline]
    pub fn is_legal(&self, board: Board, dir: Move) -> bool { self.shift(board, dir) != board }

    /// Legal directions paired with the board each one produces, in code order.
    pub fn legal_moves(&self, board: Board) -> impl Iterator<Item = (Move, Board)> + '_ {
        Move::ALL.into_iter().filter_map(move |dir| {
            let moved = self.shift(board, dir);
            (moved != board).then_some((dir, moved))
        })
    }

    /// True if no move in any direction changes the board.
    #[inline]
    pub fn is_game_over(&self, board: Board) -> bool { self.legal_moves(board).next().is_none() }

    fn shift_rows(&self, board: Board, table: &[Row]) -> Board {
        let res = (0..4).fold(0u64, |new_board, row_idx| {
            let row_val = extract_line(board.raw(), row_idx) as Row;
            let new_row_val = get_line_entry(table, row_val) as u64;
            new_board | (new_row_val << (48 - (16 * row_idx)))
        });
        Board::from_raw(res)
    }

    fn shift_cols(&self, board: Board, table: &[u64]) -> Board {
        let transpose_board = board::transpose(board.raw());
        let res = (0..4).fold(0u64, |new_board, col_idx| {
            let col_val = extract_line(transpose_board, col_idx) as Row;
            let new_col_val = get_line_entry(table, col_val);
            new_board | (new_col_val << (12 - (4 * col_idx)))
        });
        Board::from_raw(res)
    }
}

#[inline(always)]
fn get_line_entry<T: Copy>(table: &[T], idx: Row) -> T {
    debug_assert_eq!(table.len(), LINE_TABLE_SIZE);
    // Row is u16 and every table has LINE_TABLE_SIZE entries.
    unsafe { *table.get_unchecked(idx as usize) }
}

/// Place a row in the bottom row of an otherwise empty board and transpose it,
/// giving the same cells as the rightmost column, top to bottom.
fn row_as_column(row: Row) -> u64 { board::transpose(row as u64) }

/// One merge pass, scanning from column 0. A tile produced by a merge is not
/// merged again, and pairs already at the ceiling stay apart.
pub(crate) fn merge_cells(mut cells: [u8; 4]) -> [u8; 4] {
    for i in 0..3 {
        if cells[i] == 0 {
            continue;
        }
        let Some(j) = (i + 1..4).find(|&j| cells[j] != 0) else { break };
        if cells[j] == cells[i] && cells[i] < MAX_EXPONENT {
            cells[i] += 1;
            cells[j] = 0;
        }
    }
    cells
}

/// Stable move of every empty cell to the trailing side.
pub(crate) fn compact_left(cells: [u8; 4]) -> [u8; 4] {
    let mut out = [0u8; 4];
    for (slot, v) in out.iter_mut().zip(cells.into_iter().filter(|&v| v != 0)) {
        *slot = v;
    }
    out
}

/// Stable move of every empty cell to the leading side.
pub(crate) fn compact_right(cells: [u8; 4]) -> [u8; 4] {
    let mut out = [0u8; 4];
    for (slot, v) in out.iter_mut().rev().zip(cells.into_iter().rev().filter(|&v| v != 0)) {
        *slot = v;
    }
    out
}

impl Board {
    /// Return the board resulting from sliding/merging tiles in `dir` (no random insert).
    ///
    /// Uses the process-wide tables, building them on first use.
    ///
    /// ```
    /// use slide2048::board::Board;
    /// use slide2048::engine::Move;
    /// assert_eq!(Board::from_raw(0x2020).shift(Move::Left), Board::from_raw(0x3000));
    /// ```
    #[inline]
    pub fn shift(self, dir: Move) -> Self { tables::init().moves().shift(self, dir) }

    /// Return true if no legal moves remain.
    ///
    /// ```
    /// use slide2048::board::Board;
    /// // Nothing slides on an empty board.
    /// assert!(Board::EMPTY.is_game_over());
    /// ```
    #[inline]
    pub fn is_game_over(self) -> bool { tables::init().moves().is_game_over(self) }

    /// Place `exponent` into the `empty_index`-th empty cell in row-major order.
    ///
    /// Returns the board unchanged if there are not that many empty cells.
    pub fn insert_tile(self, empty_index: u32, exponent: u8) -> Self {
        debug_assert!(exponent > 0 && exponent <= MAX_EXPONENT);
        let mut remaining = empty_index;
        for idx in 0..16 {
            let (r, c) = (idx / 4, idx % 4);
            if self.cell(r, c) != 0 {
                continue;
            }
            if remaining == 0 {
                let shift = 60 - 4 * idx as u32;
                return Board::from_raw(self.raw() | ((exponent as u64) << shift));
            }
            remaining -= 1;
        }
        self
    }

    /// Insert a random 2 (90%) or 4 (10%) tile into a uniformly chosen empty cell.
    ///
    /// A full board is returned unchanged.
    ///
    /// ```
    /// use slide2048::board::Board;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    pub fn with_random_tile<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let empty = self.count_empty();
        if empty == 0 {
            return self;
        }
        let index = rng.gen_range(0..empty);
        self.insert_tile(index, generate_random_tile(rng))
    }

    /// Empty board with two random tiles.
    pub fn new_game<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Board::EMPTY.with_random_tile(rng).with_random_tile(rng)
    }

    /// Perform a move then insert a random tile if the move changed the board.
    pub fn make_move<R: Rng + ?Sized>(self, dir: Move, rng: &mut R) -> Self {
        let moved = self.shift(dir);
        if moved != self { moved.with_random_tile(rng) } else { self }
    }
}

fn generate_random_tile<R: Rng + ?Sized>(rng: &mut R) -> u8 { if rng.gen_range(0..10) < 9 { 1 } else { 2 } }
