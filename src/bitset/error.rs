//! Error type for the `Result`-returning bitset API.

/// Why a `try_*` bitset operation did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitsetError {
    /// The position does not fit in the bitset.
    OutOfRange {
        /// Offending position, saturated to `usize::MAX` if it did not fit.
        pos: usize,
        /// First position past the end, `CAPACITY << WIDTH`.
        limit: usize,
    },
    /// The bucket could not be installed within the retry bound.
    Contended {
        /// Attempts made before giving up.
        tries: usize,
    },
    /// A slot holds a bucket tagged for a different bucket id.
    Corrupted {
        /// Slot that was addressed.
        bucket: usize,
        /// Tag found in the installed bucket.
        tag: usize,
    },
}

impl core::fmt::Display for BitsetError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BitsetError::OutOfRange { pos, limit } => {
                write!(f, "bit position {pos} out of range (limit {limit})")
            }
            BitsetError::Contended { tries } => {
                write!(f, "bucket installation gave up after {tries} attempts")
            }
            BitsetError::Corrupted { bucket, tag } => {
                write!(f, "slot {bucket} holds a bucket tagged {tag}")
            }
        }
    }
}

impl std::error::Error for BitsetError {}
