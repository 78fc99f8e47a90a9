use std::fmt;

use log::trace;

use crate::board::{BinaryBoard, Board, BoardError};
use crate::moves::{Move, MoveSet};
use crate::rng::XorShiftRandom;
use crate::tables::{tables, MoveTables};

/// A playable 2048 game over a bit-packed board.
///
/// The game has two logical states, active and over, derived purely from the
/// board: it is over iff no direction changes the board. [`play`](Game::play)
/// either fully applies a move (including spawning one tile) or is a complete
/// no-op; [`restart`](Game::restart) always returns to a fresh two-tile
/// board. Instances are mutable and not thread-safe.
///
/// ```
/// use binary_2048::{Game, Move};
///
/// let mut game = Game::with_seed(42);
/// assert_eq!(game.score(), 0);
/// if game.possible_moves().contains(Move::Left) {
///     game.play(Move::Left);
/// }
/// assert!(game.highest_tile() >= 2);
/// ```
pub struct Game {
    board: BinaryBoard,
    rng: XorShiftRandom,
    tables: &'static MoveTables,
    /// The score value of the board before any merge happened. The score
    /// table assumes every tile is the result of a merge, even a 4 that
    /// spawned at the start, so this offset is subtracted from every score
    /// query.
    initial_score: u32,
    /// The moves that are available for the current state, recomputed
    /// lazily after a mutation.
    possible: MoveSet,
    moves_stale: bool,
}

impl Game {
    /// Create a game with a clock-seeded generator and spawn the two
    /// starting tiles.
    pub fn new() -> Self {
        Self::from_rng(XorShiftRandom::new())
    }

    /// Create a game with a deterministic generator seed and spawn the two
    /// starting tiles.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(XorShiftRandom::with_seed(seed))
    }

    fn from_rng(rng: XorShiftRandom) -> Self {
        let mut game = Game {
            board: BinaryBoard::EMPTY,
            rng,
            tables: tables(),
            initial_score: 0,
            possible: MoveSet::new(),
            moves_stale: true,
        };
        game.restart();
        game
    }

    /// Debug/test construction from an explicit board. No tiles are spawned
    /// and the score offset is zero, so merge credit already on the board
    /// counts in full.
    pub fn from_board(board: BinaryBoard, rng: XorShiftRandom) -> Self {
        let mut game = Game {
            board,
            rng,
            tables: tables(),
            initial_score: 0,
            possible: MoveSet::new(),
            moves_stale: true,
        };
        game.determine_possible_moves();
        game
    }

    /// Debug/test construction from 16 explicit tile ranks in row-major
    /// order, validated like [`BinaryBoard::from_tiles`].
    pub fn from_tiles(ranks: &[u8], seed: u64) -> Result<Self, BoardError> {
        Ok(Self::from_board(
            BinaryBoard::from_tiles(ranks)?,
            XorShiftRandom::with_seed(seed),
        ))
    }

    /// Apply a move. If it changed the board, spawn one random tile (rank 1
    /// with probability 0.9, rank 2 with probability 0.1) at a uniformly
    /// random empty field and invalidate the possible-moves cache. A no-op
    /// move leaves the game byte-for-byte unchanged and spawns nothing.
    pub fn play(&mut self, mv: Move) {
        let before = self.board.raw();
        let after = shift(self.tables, before, mv);
        if after != before {
            self.board = BinaryBoard::from_raw(after);
            let empties = self.board.count_empty();
            let rank = self.spawn_rank();
            self.board.insert_random_tile(rank, empties, &mut self.rng);
            self.moves_stale = true;
        }
    }

    /// Reset to an empty board, spawn two random tiles and rebase the score
    /// offset so the starting tiles never count toward the reported score.
    pub fn restart(&mut self) {
        self.board = BinaryBoard::EMPTY;
        let first = self.spawn_rank();
        self.board
            .insert_random_tile(first, BinaryBoard::SIZE as u32, &mut self.rng);
        let second = self.spawn_rank();
        self.board
            .insert_random_tile(second, BinaryBoard::SIZE as u32 - 1, &mut self.rng);
        self.initial_score = row_score(self.tables, self.board.raw());
        self.determine_possible_moves();
        trace!("restarted: {:?}", self.board);
    }

    /// The sum of all values created by merges since the last restart.
    pub fn score(&self) -> u32 {
        row_score(self.tables, self.board.raw()) - self.initial_score
    }

    /// The value of the highest tile, `2^rank` over the maximum rank.
    ///
    /// On an all-empty board this reports 1 (`2^0`), the empty sentinel fed
    /// through the same power-of-two formula; callers must not mistake that
    /// for a real tile.
    pub fn highest_tile(&self) -> u32 {
        let max_rank = self.board.ranks().max().unwrap_or(0);
        1 << max_rank
    }

    /// True if no move in any direction changes the board.
    pub fn is_over(&self) -> bool {
        Move::ALL
            .iter()
            .all(|&mv| shift(self.tables, self.board.raw(), mv) == self.board.raw())
    }

    /// The moves that are playable for the current board, in the fixed
    /// order left, right, up, down. Cached until the next mutation.
    pub fn possible_moves(&mut self) -> &MoveSet {
        if self.moves_stale {
            self.determine_possible_moves();
        }
        &self.possible
    }

    /// Read-only view of the underlying board.
    pub fn board(&self) -> &BinaryBoard {
        &self.board
    }

    /// Rank of the field at `index`, row-major with 0 = top-left.
    pub fn get(&self, index: usize) -> u8 {
        self.board.get(index)
    }

    /// Rank of the field at (`row`, `column`).
    pub fn get_rc(&self, row: usize, column: usize) -> u8 {
        self.board.get_rc(row, column)
    }

    fn determine_possible_moves(&mut self) {
        self.possible.clear();
        let mut amount = 0;
        for &mv in Move::ALL.iter() {
            if shift(self.tables, self.board.raw(), mv) != self.board.raw() {
                self.possible.set(amount, mv);
                amount += 1;
            }
        }
        self.moves_stale = false;
    }

    fn spawn_rank(&mut self) -> u8 {
        if self.rng.next(10) < 9 {
            1
        } else {
            2
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[score: {}]", self.score())?;
        for row in 0..BinaryBoard::LINE_SIZE {
            write!(f, "[")?;
            for column in 0..BinaryBoard::LINE_SIZE {
                if column > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", self.get_rc(row, column))?;
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}

/// Slide/merge tiles in the given direction via the delta tables. No
/// randomness.
fn shift(tables: &MoveTables, board: u64, mv: Move) -> u64 {
    match mv {
        Move::Left | Move::Right => shift_rows(tables, board, mv),
        Move::Up | Move::Down => shift_cols(tables, board, mv),
    }
}

fn shift_rows(tables: &MoveTables, board: u64, mv: Move) -> u64 {
    let mut ret = board;
    for row in 0..4 {
        let offset = 48 - 16 * row;
        let lane = ((board >> offset) & 0xFFFF) as u16;
        let delta = match mv {
            Move::Left => tables.row_left(lane),
            Move::Right => tables.row_right(lane),
            _ => unreachable!("vertical move in shift_rows"),
        };
        ret ^= (delta as u64) << offset;
    }
    ret
}

fn shift_cols(tables: &MoveTables, board: u64, mv: Move) -> u64 {
    let transposed = transpose(board);
    let mut ret = board;
    for col in 0..4 {
        let lane = ((transposed >> (48 - 16 * col)) & 0xFFFF) as u16;
        let delta = match mv {
            Move::Up => tables.col_up(lane),
            Move::Down => tables.col_down(lane),
            _ => unreachable!("horizontal move in shift_cols"),
        };
        ret ^= delta << (12 - 4 * col);
    }
    ret
}

/// Swap the packed board's rows and columns across the diagonal.
// Credit to Nneonneo
fn transpose(x: u64) -> u64 {
    let a1 = x & 0xF0F0_0F0F_F0F0_0F0F;
    let a2 = x & 0x0000_F0F0_0000_F0F0;
    let a3 = x & 0x0F0F_0000_0F0F_0000;
    let a = a1 | (a2 << 12) | (a3 >> 12);
    let b1 = a & 0xFF00_FF00_00FF_00FF;
    let b2 = a & 0x00FF_00FF_0000_0000;
    let b3 = a & 0x0000_0000_FF00_FF00;
    b1 | (b2 >> 24) | (b3 << 24)
}

fn row_score(tables: &MoveTables, board: u64) -> u32 {
    (0..4).fold(0, |acc, row| {
        let lane = ((board >> (48 - 16 * row)) & 0xFFFF) as u16;
        acc + tables.row_score(lane)
    })
}
