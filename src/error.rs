/// Errors surfaced at the edges of the engine (board construction, parsing, move codes).
///
/// The search itself is total over valid boards and never fails.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid board: exponent {exponent} at ({row}, {col}) exceeds 15")]
    InvalidBoard { row: usize, col: usize, exponent: u8 },
    #[error("invalid tile value {value} at ({row}, {col}): expected 0 or a power of two in 2..=32768")]
    InvalidTileValue { row: usize, col: usize, value: u32 },
    #[error("cannot parse board {0:?}: expected a decimal or 0x-prefixed hexadecimal u64")]
    ParseBoard(String),
    #[error("invalid move code {0}: expected 0 (up), 1 (down), 2 (left) or 3 (right)")]
    InvalidMoveCode(i32),
}
