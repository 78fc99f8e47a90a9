use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rng::XorShiftRandom;

/// Errors from the validated tile-list construction path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("expected exactly 16 tile ranks, got {got}")]
    WrongLength { got: usize },
    #[error("tile rank {rank} at index {index} is out of range (0..=15)")]
    RankOutOfRange { index: usize, rank: u8 },
}

/// Capability set shared by tile containers: rank access, rank mutation and
/// row-major iteration.
///
/// The production implementation is the bit-packed [`BinaryBoard`]; tests use
/// a plain array-backed double through the same trait.
pub trait Board {
    /// Number of fields on the board (normally 16).
    fn size(&self) -> usize;

    /// Number of fields in one line (normally 4).
    fn line_size(&self) -> usize;

    /// Rank of the field at `index`, row-major with 0 = top-left.
    fn get(&self, index: usize) -> u8;

    /// Rank of the field at (`row`, `column`).
    fn get_rc(&self, row: usize, column: usize) -> u8 {
        debug_assert!(row < self.line_size() && column < self.line_size());
        self.get(row * self.line_size() + column)
    }

    /// Store `rank` at `index`.
    fn set(&mut self, index: usize, rank: u8);

    /// Iterate all ranks in row-major order.
    fn ranks(&self) -> Ranks<'_, Self>
    where
        Self: Sized,
    {
        Ranks { board: self, idx: 0 }
    }
}

/// Iterator over a board's ranks in row-major order.
pub struct Ranks<'a, B> {
    board: &'a B,
    idx: usize,
}

impl<'a, B: Board> Iterator for Ranks<'a, B> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.idx >= self.board.size() {
            return None;
        }
        let rank = self.board.get(self.idx);
        self.idx += 1;
        Some(rank)
    }
}

/// Packed 4x4 2048 board as 16 4-bit tile ranks in a `u64`.
///
/// Field 0 (top-left) lives in the most significant nibble; indices increase
/// left to right, then top to bottom. Each rank `r` encodes the tile value
/// `2^r`, with 0 for an empty field.
///
/// Public methods provide safe, validated operations while preserving an
/// escape hatch to the raw packed representation for advanced use.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BinaryBoard(u64);

impl BinaryBoard {
    /// Number of fields in one line.
    pub const LINE_SIZE: usize = 4;

    /// Number of fields on the board.
    pub const SIZE: usize = 16;

    /// Largest rank a nibble can hold. Two tiles of this rank never merge.
    pub const LARGEST_RANK: u8 = 0xF;

    const BITS_PER_TILE: usize = 4;

    /// A constant empty board (all zeros).
    pub const EMPTY: BinaryBoard = BinaryBoard(0);

    /// Construct a `BinaryBoard` from its raw packed representation.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        BinaryBoard(raw)
    }

    /// Consume this board, returning the raw packed `u64`.
    #[inline]
    pub fn into_raw(self) -> u64 {
        self.0
    }

    /// Borrow the raw packed `u64` for this board.
    #[inline]
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Construct a board from 16 explicit tile ranks in row-major order.
    ///
    /// This is the deterministic test-setup path: the slice length and every
    /// rank are validated, and nothing is clamped or truncated.
    ///
    /// ```
    /// use binary_2048::{BinaryBoard, Board};
    ///
    /// let board = BinaryBoard::from_tiles(&[
    ///     1, 0, 0, 0,
    ///     0, 0, 0, 0,
    ///     0, 0, 0, 0,
    ///     0, 0, 0, 2,
    /// ]).unwrap();
    /// assert_eq!(board.get(0), 1);
    /// assert_eq!(board.get(15), 2);
    /// ```
    pub fn from_tiles(ranks: &[u8]) -> Result<Self, BoardError> {
        if ranks.len() != Self::SIZE {
            return Err(BoardError::WrongLength { got: ranks.len() });
        }
        let mut board = BinaryBoard::EMPTY;
        for (index, &rank) in ranks.iter().enumerate() {
            if rank > Self::LARGEST_RANK {
                return Err(BoardError::RankOutOfRange { index, rank });
            }
            board.set(index, rank);
        }
        Ok(board)
    }

    /// Count the empty fields without looping over nibbles: OR-reduce each
    /// nibble down to one "non-empty" bit, invert, mask, then tree-sum the
    /// bits via shifts.
    pub fn count_empty(self) -> u32 {
        // The tree-sum wraps at 16, so the all-empty board is answered
        // before it.
        if self.0 == 0 {
            return Self::SIZE as u32;
        }
        let mut b = self.0;
        b |= (b >> 2) & 0x3333_3333_3333_3333;
        b |= b >> 1;
        b = !b & 0x1111_1111_1111_1111;
        b += b >> 32;
        b += b >> 16;
        b += b >> 8;
        b += b >> 4;
        (b & 0xf) as u32
    }

    /// Place `rank` at a uniformly random empty field, scanning left to right
    /// for the k-th empty cell with `k` drawn from `rng`.
    ///
    /// `empty_count` must be at least 1 and equal the board's actual number
    /// of empty fields; both are programmer errors checked in debug builds
    /// only, since this sits on the hot path of every move.
    pub fn insert_random_tile(&mut self, rank: u8, empty_count: u32, rng: &mut XorShiftRandom) {
        debug_assert!(empty_count >= 1, "insert_random_tile on a full board");
        debug_assert_eq!(empty_count, self.count_empty(), "stale empty-field count");
        let target = rng.next(empty_count as i32);
        let mut seen: i32 = -1;
        let mut spawn: usize = 0;
        loop {
            if self.get(spawn) == 0 {
                seen += 1;
                if seen == target {
                    break;
                }
            }
            spawn += 1;
        }
        self.set(spawn, rank);
    }
}

impl Board for BinaryBoard {
    fn size(&self) -> usize {
        Self::SIZE
    }

    fn line_size(&self) -> usize {
        Self::LINE_SIZE
    }

    #[inline]
    fn get(&self, index: usize) -> u8 {
        debug_assert!(index < Self::SIZE);
        ((self.0 >> ((Self::SIZE - index - 1) * Self::BITS_PER_TILE)) & 0xf) as u8
    }

    /// XORs the rank into place: on an empty field this stores the rank, and
    /// XOR-ing the current rank again clears the field. Used for explicit
    /// tile placement; move application goes through the delta tables
    /// instead.
    #[inline]
    fn set(&mut self, index: usize, rank: u8) {
        debug_assert!(index < Self::SIZE);
        debug_assert!(rank <= Self::LARGEST_RANK);
        self.0 ^= (rank as u64) << ((Self::SIZE - index - 1) * Self::BITS_PER_TILE);
    }
}

impl fmt::Debug for BinaryBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BinaryBoard({:#018x})", self.0)
    }
}

impl fmt::Display for BinaryBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<String> = self.ranks().map(format_value).collect();
        write!(
            f,
            "\n{}|{}|{}|{}\n--------------------------------\n{}|{}|{}|{}\n--------------------------------\n{}|{}|{}|{}\n--------------------------------\n{}|{}|{}|{}\n",
            cells[0], cells[1], cells[2], cells[3],
            cells[4], cells[5], cells[6], cells[7],
            cells[8], cells[9], cells[10], cells[11],
            cells[12], cells[13], cells[14], cells[15]
        )
    }
}

impl From<u64> for BinaryBoard {
    fn from(raw: u64) -> Self {
        BinaryBoard::from_raw(raw)
    }
}

impl From<BinaryBoard> for u64 {
    fn from(board: BinaryBoard) -> Self {
        board.into_raw()
    }
}

fn format_value(rank: u8) -> String {
    match rank {
        0 => String::from("       "),
        r => {
            let mut v = (1u32 << r).to_string();
            while v.len() < 7 {
                match v.len() {
                    6 => v = format!(" {}", v),
                    _ => v = format!(" {} ", v),
                }
            }
            v
        }
    }
}
