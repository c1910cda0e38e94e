//! Occupancy snapshot of a bitset.

use serde::{Deserialize, Serialize};

/// Point-in-time summary returned by
/// [`AtomicSparseBitset::stats`](crate::AtomicSparseBitset::stats).
///
/// Counts are gathered with relaxed loads and are not a consistent snapshot
/// while other threads are writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitsetStats {
    /// Number of slots.
    pub capacity: usize,
    /// Bits covered by one bucket.
    pub bucket_bits: usize,
    /// Bits per atomic word.
    pub word_bits: u32,
    /// Slots holding a bucket.
    pub allocated_buckets: usize,
    /// Set bits across all buckets.
    pub set_bits: usize,
    /// Heap bytes held by allocated buckets.
    pub allocated_bytes: usize,
}

impl BitsetStats {
    /// Fraction of slots that have been allocated, in `[0, 1]`.
    pub fn occupancy(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.allocated_buckets as f64 / self.capacity as f64
    }
}
