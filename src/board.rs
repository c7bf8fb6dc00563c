//! Packed 4x4 board: 16 four-bit exponents in a `u64`.
//!
//! Cell `(r, c)` sits at bit offset `60 - 16*r - 4*c`, so the most significant
//! nibble is the top-left cell and row 0 occupies the high 16 bits. A nibble
//! `v` stands for the tile `2^v`; 0 is an empty cell.

use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

pub(crate) type BoardRaw = u64;

/// One packed line of four cells; column 0 in the most significant nibble.
pub type Row = u16;

/// Largest storable exponent (tile 32768).
pub const MAX_EXPONENT: u8 = 15;

const ROW_MASK: u64 = 0xffff;

/// Packed 4x4 2048 board as 16 4-bit nibbles in a `u64`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board(BoardRaw);

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board(0);

    /// Construct a `Board` from its raw packed representation.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self { Board(raw) }

    /// Consume this `Board`, returning the raw packed `u64`.
    #[inline]
    pub const fn into_raw(self) -> u64 { self.0 }

    /// Borrow the raw packed `u64` for this `Board`.
    #[inline]
    pub const fn raw(&self) -> u64 { self.0 }

    /// Pack a row-major grid of exponents.
    ///
    /// ```
    /// use slide2048::board::Board;
    /// let b = Board::from_cells([[1, 2, 0, 0], [0; 4], [0; 4], [0, 0, 0, 15]]).unwrap();
    /// assert_eq!(b.raw(), 0x1200_0000_0000_000f);
    /// assert!(Board::from_cells([[16, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).is_err());
    /// ```
    pub fn from_cells(cells: [[u8; 4]; 4]) -> Result<Self, EngineError> {
        let mut raw = 0u64;
        for (r, line) in cells.iter().enumerate() {
            for (c, &exponent) in line.iter().enumerate() {
                if exponent > MAX_EXPONENT {
                    return Err(EngineError::InvalidBoard { row: r, col: c, exponent });
                }
                raw |= (exponent as u64) << cell_shift(r, c);
            }
        }
        Ok(Board(raw))
    }

    /// Unpack into a row-major grid of exponents.
    pub fn to_cells(self) -> [[u8; 4]; 4] {
        let mut cells = [[0u8; 4]; 4];
        for (r, line) in cells.iter_mut().enumerate() {
            *line = row_to_cells(self.row(r));
        }
        cells
    }

    /// Pack a row-major grid of displayed tile values (0, 2, 4, ..., 32768).
    pub fn from_tile_values(values: [[u32; 4]; 4]) -> Result<Self, EngineError> {
        let mut cells = [[0u8; 4]; 4];
        for (r, line) in values.iter().enumerate() {
            for (c, &value) in line.iter().enumerate() {
                cells[r][c] = match value {
                    0 => 0,
                    v if v.is_power_of_two() && (2..=32768).contains(&v) => v.trailing_zeros() as u8,
                    v => return Err(EngineError::InvalidTileValue { row: r, col: c, value: v }),
                };
            }
        }
        Board::from_cells(cells)
    }

    /// Assemble a board from four packed rows, top to bottom.
    #[inline]
    pub fn from_rows(rows: [Row; 4]) -> Self {
        Board(rows.iter().fold(0u64, |acc, &row| (acc << 16) | row as u64))
    }

    /// Packed row `idx` (0 = top).
    #[inline]
    pub fn row(self, idx: usize) -> Row { extract_line(self.0, idx) as Row }

    /// Exponent stored at `(row, col)`.
    #[inline]
    pub fn cell(self, row: usize, col: usize) -> u8 { ((self.0 >> cell_shift(row, col)) & 0xf) as u8 }

    /// Displayed value at row-major index `idx` in `0..16` (0 when empty).
    #[inline]
    pub fn tile_value(self, idx: usize) -> u32 {
        match self.cell(idx / 4, idx % 4) {
            0 => 0,
            e => 1 << e,
        }
    }

    /// Swap cell `(i, j)` with `(j, i)`.
    #[inline]
    pub fn transpose(self) -> Self { Board(transpose(self.0)) }

    /// Count the number of empty cells on the board.
    #[inline]
    pub fn count_empty(self) -> u32 { 16 - count_non_empty(self.0) }

    /// Number of distinct non-empty exponents present.
    pub fn count_distinct_tiles(self) -> u32 {
        let mut bitset = 0u16;
        let mut rest = self.0;
        while rest != 0 {
            bitset |= 1 << (rest & 0xf);
            rest >>= 4;
        }
        // bit 0 is the empty cell
        (bitset >> 1).count_ones()
    }

    /// Largest exponent on the board (0 for the empty board).
    pub fn max_exponent(self) -> u8 {
        (0..16).map(|idx| self.cell(idx / 4, idx % 4)).max().unwrap_or(0)
    }

    /// Return the highest tile value (e.g., 2048) present on the board, or 0 if empty.
    #[inline]
    pub fn highest_tile(self) -> u32 {
        match self.max_exponent() {
            0 => 0,
            e => 1 << e,
        }
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:#018x})", self.0)
    }
}

impl From<u64> for Board { fn from(v: u64) -> Self { Board::from_raw(v) } }
impl From<Board> for u64 { fn from(b: Board) -> Self { b.into_raw() } }

impl FromStr for Board {
    type Err = EngineError;

    /// Accepts a decimal `u64` or a `0x`-prefixed hexadecimal one.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
            None => trimmed.replace('_', "").parse::<u64>(),
        };
        parsed.map(Board).map_err(|_| EngineError::ParseBoard(s.to_string()))
    }
}

#[inline(always)]
const fn cell_shift(row: usize, col: usize) -> u32 { (60 - 16 * row - 4 * col) as u32 }

// Credit to Nneonneo
pub(crate) fn transpose(x: BoardRaw) -> BoardRaw {
    let a1 = x & 0xF0F00F0FF0F00F0F;
    let a2 = x & 0x0000F0F00000F0F0;
    let a3 = x & 0x0F0F00000F0F0000;
    let a = a1 | (a2 << 12) | (a3 >> 12);
    let b1 = a & 0xFF00FF0000FF00FF;
    let b2 = a & 0x00FF00FF00000000;
    let b3 = a & 0x00000000FF00FF00;
    b1 | (b2 >> 24) | (b3 << 24)
}

#[inline(always)]
pub(crate) fn extract_line(board: BoardRaw, line_idx: usize) -> u64 {
    (board >> ((3 - line_idx) * 16)) & ROW_MASK
}

/// Split a packed row into its four exponents, column 0 first.
#[inline]
pub fn row_to_cells(row: Row) -> [u8; 4] {
    [(row >> 12) as u8 & 0xf, (row >> 8) as u8 & 0xf, (row >> 4) as u8 & 0xf, row as u8 & 0xf]
}

/// Inverse of [`row_to_cells`]; each exponent must already be `<= 15`.
#[inline]
pub fn cells_to_row(cells: [u8; 4]) -> Row {
    debug_assert!(cells.iter().all(|&c| c <= MAX_EXPONENT));
    (cells[0] as Row) << 12 | (cells[1] as Row) << 8 | (cells[2] as Row) << 4 | cells[3] as Row
}

// https://stackoverflow.com/questions/38225571/count-number-of-zero-nibbles-in-an-unsigned-64-bit-integer
fn count_non_empty(board: BoardRaw) -> u32 {
    let mut board_copy = board;
    board_copy |= board_copy >> 1;
    board_copy |= board_copy >> 2;
    board_copy &= 0x1111111111111111;
    board_copy.count_ones()
}
