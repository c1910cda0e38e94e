//! Mapping from a global bit position to its bucket, word and bit offset.
//!
//! A bucket covers `2^width` consecutive positions; inside a bucket the
//! positions are packed into words of `word_bits` bits. Everything here is
//! pure arithmetic on `usize` and never fails. Whether the resulting bucket
//! actually exists is for the caller to check.

/// Where a single bit lives inside a bucketed bitset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitAddress {
    /// Bucket (slot) index.
    pub bucket: usize,
    /// Word index within the bucket.
    pub word: usize,
    /// Bit offset within the word.
    pub offset: u32,
}

impl BitAddress {
    /// Decomposes `pos` for buckets of `2^width` bits and words of
    /// `word_bits` bits.
    ///
    /// `word_bits` must be a power of two no larger than `2^width`.
    #[inline(always)]
    pub const fn decompose(pos: usize, width: u32, word_bits: u32) -> Self {
        let sub = pos & bucket_mask(width);
        let word_bits = word_bits as usize;
        Self {
            bucket: pos >> width,
            word: sub / word_bits,
            offset: (sub % word_bits) as u32,
        }
    }

    /// Inverse of [`decompose`](Self::decompose).
    #[inline]
    pub const fn position(&self, width: u32, word_bits: u32) -> usize {
        (self.bucket << width) + self.word * word_bits as usize + self.offset as usize
    }
}

/// Mask selecting the in-bucket part of a position.
#[inline(always)]
pub const fn bucket_mask(width: u32) -> usize {
    (1usize << width) - 1
}

/// Number of buckets of `2^width` bits needed to cover `bits` positions.
///
/// Handy for picking a `CAPACITY`:
///
/// ```
/// use sparse_atomic_bitset::{buckets_for, AtomicSparseBitset};
///
/// const CAP: usize = buckets_for(1 << 24, 16);
/// let set: AtomicSparseBitset<CAP> = AtomicSparseBitset::new();
/// assert_eq!(set.capacity_bits(), 1 << 24);
/// ```
pub const fn buckets_for(bits: usize, width: u32) -> usize {
    let per_bucket = 1usize << width;
    bits.div_ceil(per_bucket)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decompose_default_layout() {
        // 2^16 bits per bucket, 32-bit words.
        let a = BitAddress::decompose(0, 16, 32);
        assert_eq!(a, BitAddress { bucket: 0, word: 0, offset: 0 });

        let a = BitAddress::decompose(33, 16, 32);
        assert_eq!(a, BitAddress { bucket: 0, word: 1, offset: 1 });

        let a = BitAddress::decompose((3 << 16) + 65_535, 16, 32);
        assert_eq!(a, BitAddress { bucket: 3, word: 2047, offset: 31 });
    }

    #[test]
    fn decompose_small_buckets() {
        // 16 bits per bucket, 8-bit words: two words per bucket.
        assert_eq!(
            BitAddress::decompose(5, 4, 8),
            BitAddress { bucket: 0, word: 0, offset: 5 }
        );
        assert_eq!(
            BitAddress::decompose(13, 4, 8),
            BitAddress { bucket: 0, word: 1, offset: 5 }
        );
        assert_eq!(
            BitAddress::decompose(16, 4, 8),
            BitAddress { bucket: 1, word: 0, offset: 0 }
        );
    }

    #[test]
    fn position_inverts_decompose() {
        for pos in [0usize, 1, 7, 8, 15, 16, 17, 255, 1023, 70_000] {
            let a = BitAddress::decompose(pos, 4, 8);
            assert_eq!(a.position(4, 8), pos);
            let a = BitAddress::decompose(pos, 16, 64);
            assert_eq!(a.position(16, 64), pos);
        }
    }

    #[test]
    fn buckets_for_rounds_up() {
        assert_eq!(buckets_for(0, 4), 0);
        assert_eq!(buckets_for(1, 4), 1);
        assert_eq!(buckets_for(16, 4), 1);
        assert_eq!(buckets_for(17, 4), 2);
        assert_eq!(buckets_for(1 << 26, 16), 1024);
    }
}
