//! binary-2048: a bitboard 2048 game engine.
//!
//! The 4x4 board is packed into a single `u64`, 4 bits per tile storing the
//! log2 of the tile value (0 for empty). Every row/column transformation is
//! precomputed into 65536-entry XOR-delta lookup tables at startup, so
//! applying a move is four table lookups and four XORs; vertical moves reuse
//! the same machinery through a bit-permutation transpose. Tile spawning is
//! driven by a deterministic, seedable xorshift64 generator.
//!
//! This crate provides:
//! - [`Game`]: the playable engine (`play`, `restart`, `score`,
//!   `highest_tile`, `is_over`, `possible_moves`)
//! - [`BinaryBoard`]: the packed board with a read-only indexed view and a
//!   validated test-construction path
//! - [`MoveTables`]: the one-time table builder
//! - [`XorShiftRandom`]: the deterministic generator, integrated with the
//!   rand ecosystem via `RngCore`/`SeedableRng`
//!
//! Quick start:
//! ```
//! use binary_2048::{Game, Move};
//!
//! let mut game = Game::with_seed(42);
//! assert_eq!(game.score(), 0);
//! if game.possible_moves().contains(Move::Left) {
//!     game.play(Move::Left);
//! }
//! println!("{}", game);
//! ```
//!
//! `Game` and `XorShiftRandom` hold mutable state and are not safe for
//! concurrent use; own one instance per thread or serialize access
//! externally. The tables are process-wide immutable state, built once and
//! shared read-only by all games.

pub mod board;
pub mod game;
pub mod moves;
pub mod rng;
pub mod tables;

pub use board::{BinaryBoard, Board, BoardError};
pub use game::Game;
pub use moves::{Move, MoveSet};
pub use rng::XorShiftRandom;
pub use tables::{tables, MoveTables};
