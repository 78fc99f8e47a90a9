use serde::{Deserialize, Serialize};

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Left,
    Right,
    Up,
    Down,
}

impl Move {
    /// Maximum number of distinct moves.
    pub const AMOUNT: usize = 4;

    /// All directions in their fixed enumeration order.
    pub const ALL: [Move; Move::AMOUNT] = [Move::Left, Move::Right, Move::Up, Move::Down];
}

/// An ordered collection of at most [`Move::AMOUNT`] moves, backed by a
/// fixed array so that recomputing the legal moves never allocates.
///
/// The logical size is derived from the last written index: `set(i, mv)`
/// makes the size `i + 1`. Callers populate it strictly left to right within
/// one pass; writing a lower index after a higher one shrinks the collection,
/// which the container does not defend against. [`clear`](MoveSet::clear)
/// only resets the size and leaves the backing storage untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveSet {
    slots: [Move; Move::AMOUNT],
    len: usize,
}

impl MoveSet {
    pub fn new() -> Self {
        MoveSet {
            // Dummy values only to initialize the array.
            slots: [Move::Left; Move::AMOUNT],
            len: 0,
        }
    }

    /// Logical size: the last set index + 1, or 0 after `clear`.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The move at `index`. Reading at or past the logical size is a caller
    /// error; it is caught in debug builds only.
    pub fn get(&self, index: usize) -> Move {
        debug_assert!(index < self.len, "index {} out of bounds (len {})", index, self.len);
        self.slots[index]
    }

    /// Store `mv` at `index` and make the size `index + 1`.
    pub fn set(&mut self, index: usize, mv: Move) {
        self.slots[index] = mv;
        self.len = index + 1;
    }

    /// Reset the logical size to 0 without touching the backing storage.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn as_slice(&self) -> &[Move] {
        &self.slots[..self.len]
    }

    pub fn contains(&self, mv: Move) -> bool {
        self.as_slice().contains(&mv)
    }

    pub fn iter(&self) -> impl Iterator<Item = Move> + '_ {
        self.as_slice().iter().copied()
    }
}

impl Default for MoveSet {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a MoveSet {
    type Item = Move;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, Move>>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_is_based_on_last_index() {
        let mut moves = MoveSet::new();
        assert_eq!(moves.len(), 0);
        let first_set = 3;
        moves.set(first_set, Move::Down);
        assert_eq!(moves.len(), first_set + 1);
        let second_set = 0;
        moves.set(second_set, Move::Up);
        assert_eq!(moves.len(), second_set + 1);
    }

    #[test]
    fn get_and_set_element() {
        let mut moves = MoveSet::new();
        let set_index = 2;
        let set_element = Move::Up;
        moves.set(set_index, set_element);
        assert_eq!(moves.get(set_index), set_element);
    }

    #[test]
    fn clear_resets_size() {
        let mut moves = MoveSet::new();
        moves.set(3, Move::Down);
        moves.clear();
        assert_eq!(moves.len(), 0);
        assert!(moves.is_empty());
        assert!(moves.as_slice().is_empty());
    }

    #[test]
    fn iterates_in_insertion_order() {
        let mut moves = MoveSet::new();
        moves.set(0, Move::Left);
        moves.set(1, Move::Up);
        moves.set(2, Move::Down);
        let collected: Vec<Move> = moves.iter().collect();
        assert_eq!(collected, vec![Move::Left, Move::Up, Move::Down]);
        assert!(moves.contains(Move::Up));
        assert!(!moves.contains(Move::Right));
    }
}
