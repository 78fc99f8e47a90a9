use std::sync::OnceLock;
use std::time::Instant;

use log::debug;

/// Number of possible 16-bit line encodings.
const LINE_STATES: usize = 0x1_0000;

const COL_MASK: u64 = 0x000F_000F_000F_000F;

/// Precomputed XOR-delta tables for all possible 4-tile lines.
///
/// Sliding/merging a row or column depends only on its 4 nibbles, so the
/// result of every move is precomputed for each of the 2^16 line encodings.
/// Each entry stores `original XOR result` rather than the result itself:
/// applying a move to a full board is then one XOR per lane, and a no-op
/// move has an all-zero delta, which makes the "did anything change" check
/// an exact 64-bit comparison.
///
/// Layout (lines are encoded most-significant-nibble first, matching the
/// packed board):
/// - `row_left/row_right[i]`: 16-bit delta for sliding the row left/right.
/// - `col_up/col_down[i]`: the same delta with each nibble expanded to one
///   16-bit lane of a 64-bit column, so a transpose + lookup applies the row
///   logic to columns.
/// - `score[i]`: merge-score credit of the line, `(r - 1) * 2^r` summed over
///   every rank `r >= 2`.
pub struct MoveTables {
    row_left: Box<[u16]>,
    row_right: Box<[u16]>,
    col_up: Box<[u64]>,
    col_down: Box<[u64]>,
    score: Box<[u32]>,
}

static TABLES: OnceLock<MoveTables> = OnceLock::new();

/// The process-wide table instance, built on first access and shared
/// read-only by every game afterwards.
pub fn tables() -> &'static MoveTables {
    TABLES.get_or_init(MoveTables::build)
}

impl MoveTables {
    /// Populate all five tables. Pure function of the line index; safe to
    /// call from tests that want an isolated instance.
    pub fn build() -> MoveTables {
        let started = Instant::now();
        // Allocate on the heap to keep stack frames small during init.
        let mut row_left = vec![0u16; LINE_STATES];
        let mut row_right = vec![0u16; LINE_STATES];
        let mut col_up = vec![0u64; LINE_STATES];
        let mut col_down = vec![0u64; LINE_STATES];
        let mut score = vec![0u32; LINE_STATES];

        for index in 0..LINE_STATES {
            let row = index as u16;
            let mut line = decode_line(row);
            score[index] = line_score(&line);

            slide_line(&mut line);
            let result = encode_line(&line);

            let rev_row = reverse_row(row);
            let rev_result = reverse_row(result);

            row_left[index] = row ^ result;
            row_right[rev_row as usize] = rev_row ^ rev_result;
            col_up[index] = unpack_col(row) ^ unpack_col(result);
            col_down[rev_row as usize] = unpack_col(rev_row) ^ unpack_col(rev_result);
        }

        debug!(
            "move tables built for {} line states in {:?}",
            LINE_STATES,
            started.elapsed()
        );

        MoveTables {
            row_left: row_left.into_boxed_slice(),
            row_right: row_right.into_boxed_slice(),
            col_up: col_up.into_boxed_slice(),
            col_down: col_down.into_boxed_slice(),
            score: score.into_boxed_slice(),
        }
    }

    #[inline(always)]
    pub(crate) fn row_left(&self, lane: u16) -> u16 {
        get_entry(&self.row_left, lane)
    }

    #[inline(always)]
    pub(crate) fn row_right(&self, lane: u16) -> u16 {
        get_entry(&self.row_right, lane)
    }

    #[inline(always)]
    pub(crate) fn col_up(&self, lane: u16) -> u64 {
        get_entry(&self.col_up, lane)
    }

    #[inline(always)]
    pub(crate) fn col_down(&self, lane: u16) -> u64 {
        get_entry(&self.col_down, lane)
    }

    #[inline(always)]
    pub(crate) fn row_score(&self, lane: u16) -> u32 {
        get_entry(&self.score, lane)
    }
}

#[inline(always)]
fn get_entry<T: Copy>(table: &[T], lane: u16) -> T {
    debug_assert!((lane as usize) < LINE_STATES);
    unsafe { *table.get_unchecked(lane as usize) }
}

/// Decode a 16-bit line into 4 ranks, index 0 = most significant nibble
/// (the leftmost field).
fn decode_line(row: u16) -> [u8; 4] {
    [
        ((row >> 12) & 0xf) as u8,
        ((row >> 8) & 0xf) as u8,
        ((row >> 4) & 0xf) as u8,
        (row & 0xf) as u8,
    ]
}

fn encode_line(line: &[u8; 4]) -> u16 {
    ((line[0] as u16) << 12) | ((line[1] as u16) << 8) | ((line[2] as u16) << 4) | line[3] as u16
}

/// Merge-score credit of a line: a tile of rank `r` arose from merging two
/// tiles of rank `r - 1`, so it credits `2^r` at its own merge plus the
/// credit of all intermediate merges, totalling `(r - 1) * 2^r`. Ranks 0
/// and 1 never resulted from a merge and contribute nothing.
fn line_score(line: &[u8; 4]) -> u32 {
    let mut score = 0;
    for &rank in line {
        if rank >= 2 {
            score += (rank as u32 - 1) * (1 << rank);
        }
    }
    score
}

/// Slide and merge the line toward index 0 in a single pass: pull the next
/// non-zero rank into the first open or matching slot, and re-evaluate the
/// current slot after a pull so chained collapses work. Two tiles of rank 15
/// never merge; there is no rank 16.
fn slide_line(line: &mut [u8; 4]) {
    let mut i = 0;
    while i < 3 {
        let mut j = i + 1;
        while j < 4 && line[j] == 0 {
            j += 1;
        }
        if j == 4 {
            break;
        }
        if line[i] == 0 {
            line[i] = line[j];
            line[j] = 0;
            // The slot just received a tile; evaluate it again.
            continue;
        }
        if line[i] == line[j] && line[i] != 0xF {
            line[i] += 1;
            line[j] = 0;
        }
        i += 1;
    }
}

/// Reverse the nibble order of a line, turning a left-slide result into the
/// right-slide result for the reversed encoding.
fn reverse_row(row: u16) -> u16 {
    (row >> 12) | ((row >> 4) & 0x00F0) | ((row << 4) & 0x0F00) | (row << 12)
}

/// Spread the 4 nibbles of a line across the 4 16-bit lanes of a 64-bit
/// column, top field in the highest lane.
fn unpack_col(row: u16) -> u64 {
    let row = row as u64;
    ((row << 36) | (row << 24) | (row << 12) | row) & COL_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Independent slow reference: compress the non-zero ranks, merge each
    /// adjacent equal pair once (rank 15 never merges), compress again.
    fn reference_slide(line: [u8; 4]) -> [u8; 4] {
        let packed: Vec<u8> = line.iter().copied().filter(|&r| r != 0).collect();
        let mut merged = Vec::new();
        let mut i = 0;
        while i < packed.len() {
            if i + 1 < packed.len() && packed[i] == packed[i + 1] && packed[i] != 0xF {
                merged.push(packed[i] + 1);
                i += 2;
            } else {
                merged.push(packed[i]);
                i += 1;
            }
        }
        let mut result = [0u8; 4];
        result[..merged.len()].copy_from_slice(&merged);
        result
    }

    fn reference_score(line: [u8; 4]) -> u32 {
        line.iter()
            .filter(|&&r| r >= 2)
            .map(|&r| (r as u32 - 1) * (1u32 << r))
            .sum()
    }

    #[test]
    fn left_deltas_match_reference_for_all_lines() {
        let tables = MoveTables::build();
        for index in 0..LINE_STATES {
            let row = index as u16;
            let moved = row ^ tables.row_left(row);
            let expected = encode_line(&reference_slide(decode_line(row)));
            assert_eq!(moved, expected, "row {:#06x}", row);
        }
    }

    #[test]
    fn right_deltas_are_the_mirrored_left_deltas() {
        let tables = MoveTables::build();
        for index in 0..LINE_STATES {
            let row = index as u16;
            let moved = row ^ tables.row_right(row);
            let mirrored = reverse_row(encode_line(&reference_slide(decode_line(reverse_row(
                row,
            )))));
            assert_eq!(moved, mirrored, "row {:#06x}", row);
        }
    }

    #[test]
    fn score_table_matches_reference_for_all_lines() {
        let tables = MoveTables::build();
        for index in 0..LINE_STATES {
            let row = index as u16;
            assert_eq!(
                tables.row_score(row),
                reference_score(decode_line(row)),
                "row {:#06x}",
                row
            );
        }
    }

    #[test]
    fn column_deltas_are_the_unpacked_row_deltas() {
        let tables = MoveTables::build();
        for &row in &[0x0000u16, 0x0002, 0x1332, 0x2020, 0x1234, 0xFFFF, 0xEE00] {
            let result = row ^ tables.row_left(row);
            assert_eq!(
                tables.col_up(row),
                unpack_col(row) ^ unpack_col(result),
                "row {:#06x}",
                row
            );
            let rev = reverse_row(row);
            assert_eq!(
                tables.col_down(rev),
                unpack_col(rev) ^ unpack_col(reverse_row(result)),
                "row {:#06x}",
                row
            );
        }
    }

    #[test]
    fn ceiling_rank_never_merges() {
        let tables = MoveTables::build();
        // A full line of rank 15 is a fixed point in every direction.
        assert_eq!(tables.row_left(0xFFFF), 0);
        assert_eq!(tables.row_right(0xFFFF), 0);
        assert_eq!(tables.col_up(0xFFFF), 0);
        assert_eq!(tables.col_down(0xFFFF), 0);
    }

    #[test]
    fn rank_fourteen_still_merges_to_fifteen() {
        let tables = MoveTables::build();
        let row = 0xEE00;
        assert_eq!(row ^ tables.row_left(row), 0xF000);
    }

    #[test]
    fn score_spot_checks() {
        let tables = MoveTables::build();
        assert_eq!(tables.row_score(0x0000), 0);
        // Ranks 0 and 1 contribute nothing.
        assert_eq!(tables.row_score(0x1100), 0);
        // A single rank-2 tile credits one merge worth 4.
        assert_eq!(tables.row_score(0x0002), 4);
        // Ranks 2 and 3: 4 + 2 * 8.
        assert_eq!(tables.row_score(0x0023), 20);
        // Four rank-15 tiles: 4 * 14 * 32768.
        assert_eq!(tables.row_score(0xFFFF), 1_835_008);
    }

    #[test]
    fn chained_collapse_merges_both_pairs() {
        // [1,1,1,1] collapses to [2,2,0,0], not [3,0,0,0].
        let mut line = [1, 1, 1, 1];
        slide_line(&mut line);
        assert_eq!(line, [2, 2, 0, 0]);

        // A freshly merged tile does not merge again within the same move.
        let mut line = [2, 1, 1, 0];
        slide_line(&mut line);
        assert_eq!(line, [2, 2, 0, 0]);
    }

    #[test]
    fn shared_tables_are_built_once() {
        assert!(std::ptr::eq(tables(), tables()));
    }
}
