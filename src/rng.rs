use std::time::{SystemTime, UNIX_EPOCH};

use rand_core::{impls, Error, RngCore, SeedableRng};

// An all-zero xorshift state is absorbing: every draw would return zero.
// Zero seeds are replaced with this constant instead.
const FALLBACK_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

/// George Marsaglia's xorshift64 generator (shift triple 21/35/4).
///
/// [`next`](XorShiftRandom::next) produces uniformly distributed bounded
/// integers and mutates the seed state on every call. Instances are mutable
/// and not safe for concurrent use; give each game its own generator or
/// serialize access externally.
///
/// ```
/// use binary_2048::XorShiftRandom;
///
/// let mut rng = XorShiftRandom::with_seed(42);
/// let n = rng.next(10);
/// assert!((0..10).contains(&n));
/// ```
#[derive(Debug, Clone)]
pub struct XorShiftRandom {
    seed: u64,
}

impl XorShiftRandom {
    /// Create a generator seeded from the wall clock (milliseconds since the
    /// Unix epoch).
    pub fn new() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(FALLBACK_SEED);
        Self::with_seed(millis)
    }

    /// Create a generator with an explicit seed. A zero seed falls back to a
    /// fixed nonzero default.
    pub fn with_seed(seed: u64) -> Self {
        XorShiftRandom {
            seed: if seed == 0 { FALLBACK_SEED } else { seed },
        }
    }

    /// Draw a number in `[0, bound)`.
    ///
    /// The raw 64-bit draw is truncated to 32 signed bits and reduced with a
    /// floored modulo, so the result is never negative.
    ///
    /// # Panics
    ///
    /// Panics if `bound` is not positive.
    pub fn next(&mut self, bound: i32) -> i32 {
        assert!(bound > 0, "bound must be positive, got {}", bound);
        (self.raw() as i32).rem_euclid(bound)
    }

    /// One raw xorshift step over the full 64-bit state.
    fn raw(&mut self) -> u64 {
        self.seed ^= self.seed << 21;
        self.seed ^= self.seed >> 35;
        self.seed ^= self.seed << 4;
        self.seed
    }
}

impl Default for XorShiftRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RngCore for XorShiftRandom {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.raw() as u32
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.raw()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for XorShiftRandom {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::with_seed(u64::from_le_bytes(seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_negative() {
        let mut rng = XorShiftRandom::with_seed(0x853c_49e6_748f_ea9b);
        for _ in 0..1_000 {
            assert!(rng.next(12) >= 0);
        }
    }

    #[test]
    fn below_max() {
        let max = 15;
        let mut rng = XorShiftRandom::new();
        for _ in 0..1_000 {
            assert!(rng.next(max) < max);
        }
    }

    #[test]
    fn distributed_numbers() {
        let max = 10;
        let runs = 100_000;
        let error = 0.05;
        let mut counts = [0u32; 10];
        let mut rng = XorShiftRandom::with_seed(0x2545_f491_4f6c_dd1d);
        for _ in 0..runs {
            counts[rng.next(max) as usize] += 1;
        }
        let expected = runs as f64 / max as f64;
        let min_expected = expected - expected * error;
        let max_expected = expected + expected * error;
        for (value, &count) in counts.iter().enumerate() {
            assert!(
                min_expected < count as f64 && (count as f64) < max_expected,
                "value {} drawn {} times, expected between {} and {}; all: {:?}",
                value,
                count,
                min_expected,
                max_expected,
                counts
            );
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = XorShiftRandom::with_seed(77);
        let mut b = XorShiftRandom::with_seed(77);
        for _ in 0..100 {
            assert_eq!(a.next(1_000), b.next(1_000));
        }
    }

    #[test]
    fn zero_seed_is_not_absorbing() {
        let mut rng = XorShiftRandom::with_seed(0);
        let all_zero = (0..32).all(|_| rng.next(1_000_000) == 0);
        assert!(!all_zero);
    }

    #[test]
    #[should_panic(expected = "bound must be positive")]
    fn zero_bound_is_rejected() {
        XorShiftRandom::with_seed(1).next(0);
    }

    #[test]
    fn composes_with_the_rand_ecosystem() {
        use rand::Rng;

        let mut rng = XorShiftRandom::with_seed(13);
        for _ in 0..100 {
            let n: u32 = rng.gen_range(0..16);
            assert!(n < 16);
        }
    }
}
