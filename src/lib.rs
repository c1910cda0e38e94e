//! # `sparse-atomic-bitset` - Lock-Free Sparse Bitset
//!
//! A concurrent bitset over a large integer range whose storage is allocated
//! lazily, one bucket at a time, the first time a bit inside that bucket is
//! set. Many threads may set, clear and test bits on a shared instance
//! without any lock.
//!
//! ## Guarantees
//!
//! ### Memory Safety
//! - **Write-once slots**: each slot goes from empty to owning a bucket
//!   exactly once, through a compare-and-swap. Losing candidates are dropped
//!   by the thread that built them; installed buckets are freed once, when the
//!   bitset is dropped.
//! - **Checked positions**: positions outside `[0, CAPACITY << WIDTH)` are
//!   reported as [`Status::OutOfRange`], never indexed.
//!
//! ### Concurrency
//! - **Lock-free**: every call is a bounded loop of atomic operations. A failed
//!   install means another thread's install succeeded.
//! - **No lost updates**: bit flips are single-word `fetch_or` / `fetch_and`,
//!   so concurrent flips of different bits in one word are all kept.
//! - **Relaxed bits**: there is no ordering between operations on different
//!   bits. Callers needing happens-before add their own synchronization.
//!
//! ## Architecture
//!
//! 1. **Address decomposition** ([`BitAddress`]): position to
//!    `(bucket, word, offset)`; pure arithmetic.
//! 2. **Bucket store**: a fixed array of `CAPACITY` slots, each an atomic
//!    pointer to a tagged bucket of [`AtomicWord`]s.
//! 3. **Bit operations** ([`AtomicSparseBitset`]): `set`, `reset`, `test`,
//!    `reset_all`, each returning a [`Status`].
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//!
//! use sparse_atomic_bitset::{AtomicSparseBitset, Status};
//!
//! let set: Arc<AtomicSparseBitset<64>> = Arc::new(AtomicSparseBitset::new());
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|t| {
//!         let set = Arc::clone(&set);
//!         thread::spawn(move || {
//!             for i in 0..100 {
//!                 assert_eq!(set.set(t * 1_000_000 + i), Status::Success);
//!             }
//!         })
//!     })
//!     .collect();
//! for h in handles {
//!     h.join().unwrap();
//! }
//!
//! assert_eq!(set.count_ones(), 400);
//! assert_eq!(set.test(2_000_050), Status::Yes);
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod bitset;
pub mod concurrency;

pub use bitset::{buckets_for, AtomicSparseBitset, BitAddress, BitsetError, BitsetStats, Status};
pub use concurrency::AtomicWord;

// Compile-time layout checks.
const _: () = {
    use core::mem;

    // Status travels by value through every call.
    assert!(mem::size_of::<Status>() == 1);
};
