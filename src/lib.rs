//! slide2048: move selection for the 4x4 sliding-merge tile game
//!
//! This crate provides:
//! - A packed `Board` (16 four-bit exponents in a `u64`) with codec helpers (`board` module)
//! - Table-driven moves and random tile insertion (`engine` module)
//! - Row score and heuristic tables (`heuristic` module)
//! - Depth- and probability-bounded expectimax with per-root-move caches (`expectimax` module)
//!
//! Tables are built once per process by [`tables::init`] (it is also called
//! lazily by the convenience constructors) and are read-only afterwards.
//!
//! Quick start:
//! ```
//! use slide2048::board::Board;
//! use slide2048::engine::Move;
//! use slide2048::expectimax::{self, Expectimax, SearchConfig};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Deterministic board initialization with a seeded RNG
//! let mut rng = StdRng::seed_from_u64(42);
//! let b0 = Board::new_game(&mut rng);
//!
//! let mut policy = Expectimax::with_config(SearchConfig { depth_cap: Some(2), ..Default::default() });
//! let dir = policy.best_move(b0).expect("a fresh board always has a move");
//! let b1 = b0.make_move(dir, &mut rng);
//! assert!(b1 != b0);
//!
//! // Integer codes: 0 up, 1 down, 2 left, 3 right, -1 no legal move
//! assert_eq!(Move::code_of(Some(Move::Left)), 2);
//! assert_eq!(expectimax::select_move_code(Board::from_raw(0x1212_2121_1212_2121)), -1);
//! ```
//!
pub mod board;
pub mod engine;
pub mod error;
pub mod expectimax;
pub mod heuristic;
pub mod tables;

pub use board::Board;
pub use engine::Move;
pub use error::EngineError;
pub use expectimax::{select_move, select_move_code};
