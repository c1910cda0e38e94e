//! Rayon-backed bulk insertion.

use num_traits::PrimInt;
use rayon::prelude::*;

use super::AtomicSparseBitset;
use crate::concurrency::AtomicWord;

impl<const CAPACITY: usize, const WIDTH: u32, W, const MAX_TRIES: usize, I>
    AtomicSparseBitset<CAPACITY, WIDTH, W, MAX_TRIES, I>
where
    W: AtomicWord,
    I: PrimInt + Send + Sync,
{
    /// Sets every position in `positions` using the rayon pool.
    ///
    /// Returns how many positions could not be set (out of range or failed).
    pub fn set_all_par(&self, positions: &[I]) -> usize {
        positions
            .par_iter()
            .filter(|&&pos| self.set(pos).is_failure())
            .count()
    }
}
