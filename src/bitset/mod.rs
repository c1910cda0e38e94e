//! Lock-free sparse bitset.
//!
//! The position space `[0, CAPACITY << WIDTH)` is split into `CAPACITY`
//! buckets of `2^WIDTH` bits. A bucket's storage is only allocated the first
//! time a bit inside it is set, so a mostly empty set over a huge range stays
//! small. Any number of threads may call [`set`](AtomicSparseBitset::set),
//! [`reset`](AtomicSparseBitset::reset), [`test`](AtomicSparseBitset::test)
//! and [`reset_all`](AtomicSparseBitset::reset_all) on a shared instance.
//!
//! # Progress
//! Every call is a bounded loop of atomic operations. Bucket installation is
//! a compare-and-swap on the slot pointer; when it fails another thread has
//! installed, so the system as a whole always makes progress. A single call
//! gives up after `MAX_TRIES` spurious failures and reports it.
//!
//! # Ordering
//! Bit flips are `Relaxed` `fetch_or` / `fetch_and`: each bit is atomic, but
//! there is no ordering between different bits. Slot pointers are published
//! with `Release` and read with `Acquire` so an observed bucket is always fully
//! initialized. Callers needing happens-before across calls must synchronize
//! themselves.
//!
//! # Example
//!
//! ```
//! use sparse_atomic_bitset::{AtomicSparseBitset, Status};
//!
//! let set: AtomicSparseBitset<1024> = AtomicSparseBitset::new();
//! assert_eq!(set.set(70_000), Status::Success);
//! assert_eq!(set.test(70_000), Status::Yes);
//! assert_eq!(set.test(70_001), Status::No);
//! assert_eq!(set.allocated_buckets(), 1);
//! ```

pub mod address;
mod bucket;
pub mod error;
#[cfg(feature = "parallel")]
mod parallel;
pub mod stats;
pub mod status;

use core::marker::PhantomData;

use crossbeam_utils::Backoff;
use num_traits::{PrimInt, Zero};

use crate::concurrency::sync::AtomicU32;
use crate::concurrency::AtomicWord;

pub use address::{buckets_for, BitAddress};
use bucket::{Bucket, Install, Slot};
pub use error::BitsetError;
pub use stats::BitsetStats;
pub use status::Status;

/// A lock-free, lazily allocated bitset over `[0, CAPACITY << WIDTH)`.
///
/// - `CAPACITY`: number of buckets.
/// - `WIDTH`: log2 of the bits per bucket (default 16).
/// - `W`: atomic word bits are packed into (default `AtomicU32`).
/// - `MAX_TRIES`: attempts at installing a bucket before `set` fails.
/// - `I`: integer type of positions (default `usize`).
///
/// Invalid combinations (zero capacity or retries, buckets smaller than one
/// word, `WIDTH` not below `usize::BITS`) fail to compile.
pub struct AtomicSparseBitset<
    const CAPACITY: usize,
    const WIDTH: u32 = 16,
    W = AtomicU32,
    const MAX_TRIES: usize = 32,
    I = usize,
> {
    slots: Box<[Slot<W>]>,
    _index: PhantomData<fn(I)>,
}

impl<const CAPACITY: usize, const WIDTH: u32, W, const MAX_TRIES: usize, I>
    AtomicSparseBitset<CAPACITY, WIDTH, W, MAX_TRIES, I>
where
    W: AtomicWord,
    I: PrimInt,
{
    /// Bits covered by one bucket.
    pub const BUCKET_BITS: usize = 1 << WIDTH;

    /// Atomic words per bucket.
    pub const WORDS_PER_BUCKET: usize = Self::BUCKET_BITS / W::BITS as usize;

    const LAYOUT_OK: () = {
        assert!(CAPACITY > 0, "CAPACITY must be non-zero");
        assert!(MAX_TRIES > 0, "MAX_TRIES must be non-zero");
        assert!(WIDTH < usize::BITS, "WIDTH must be below usize::BITS");
        assert!(
            (1usize << WIDTH) >= W::BITS as usize,
            "a bucket must hold at least one word"
        );
    };

    /// Creates an empty bitset. No bucket is allocated until the first `set`.
    pub fn new() -> Self {
        let () = Self::LAYOUT_OK;
        Self {
            slots: (0..CAPACITY).map(|_| Slot::empty()).collect(),
            _index: PhantomData,
        }
    }

    /// One past the largest valid position.
    #[inline]
    pub const fn capacity_bits(&self) -> usize {
        CAPACITY.saturating_mul(1 << WIDTH)
    }

    /// Sets bit `pos`.
    ///
    /// Returns [`Status::Success`], [`Status::Failed`] if the bucket could not
    /// be installed or is inconsistent, or [`Status::OutOfRange`].
    pub fn set(&self, pos: I) -> Status {
        match self.try_set(pos) {
            Ok(_) => Status::Success,
            Err(BitsetError::OutOfRange { .. }) => Status::OutOfRange,
            Err(_) => Status::Failed,
        }
    }

    /// Clears bit `pos`. Clearing inside a never-allocated bucket is a no-op.
    ///
    /// Returns [`Status::Success`], [`Status::NotFound`] if the bucket is
    /// inconsistent, or [`Status::OutOfRange`].
    pub fn reset(&self, pos: I) -> Status {
        match self.try_reset(pos) {
            Ok(_) => Status::Success,
            Err(BitsetError::OutOfRange { .. }) => Status::OutOfRange,
            Err(_) => Status::NotFound,
        }
    }

    /// Queries bit `pos`.
    ///
    /// Returns [`Status::Yes`], [`Status::No`], [`Status::NotFound`] if the
    /// bucket is inconsistent, or [`Status::OutOfRange`].
    pub fn test(&self, pos: I) -> Status {
        match self.try_test(pos) {
            Ok(true) => Status::Yes,
            Ok(false) => Status::No,
            Err(BitsetError::OutOfRange { .. }) => Status::OutOfRange,
            Err(_) => Status::NotFound,
        }
    }

    /// Clears every bit. Always returns [`Status::Success`].
    ///
    /// Allocated buckets are zeroed word by word and stay allocated. There is
    /// no snapshot semantics: a `set` racing with this call may survive or be
    /// wiped, independently for each bit.
    pub fn reset_all(&self) -> Status {
        for bucket in self.buckets() {
            bucket.clear_all();
        }
        Status::Success
    }

    /// Sets bit `pos`, returning `Ok(true)` if this call flipped it from clear.
    pub fn try_set(&self, pos: I) -> Result<bool, BitsetError> {
        let addr = self.locate(pos)?;
        let slot = &self.slots[addr.bucket];
        let backoff = Backoff::new();
        let mut candidate: Option<Box<Bucket<W>>> = None;

        for _ in 0..MAX_TRIES {
            if let Some(bucket) = slot.get() {
                return Self::verify(bucket, addr.bucket).map(|b| b.set(addr.word, addr.offset));
            }

            let fresh = candidate.take().unwrap_or_else(|| {
                let b = Box::new(Bucket::new(addr.bucket, Self::WORDS_PER_BUCKET));
                b.set(addr.word, addr.offset);
                b
            });

            match slot.try_install(fresh) {
                Install::Installed(bucket) => {
                    debug_assert!(bucket.is_owned_by(addr.bucket));
                    #[cfg(feature = "tracing")]
                    tracing::trace!(bucket = addr.bucket, "installed bucket");
                    return Ok(true);
                }
                Install::Lost { winner, candidate } => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(bucket = addr.bucket, "lost bucket install race");
                    drop(candidate);
                    return Self::verify(winner, addr.bucket).map(|b| b.set(addr.word, addr.offset));
                }
                Install::Spurious(c) => {
                    candidate = Some(c);
                    backoff.spin();
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(bucket = addr.bucket, tries = MAX_TRIES, "bucket install retries exhausted");
        Err(BitsetError::Contended { tries: MAX_TRIES })
    }

    /// Clears bit `pos`, returning `Ok(true)` if it was set.
    pub fn try_reset(&self, pos: I) -> Result<bool, BitsetError> {
        let addr = self.locate(pos)?;
        match self.slots[addr.bucket].get() {
            None => Ok(false),
            Some(bucket) => {
                Self::verify(bucket, addr.bucket).map(|b| b.clear(addr.word, addr.offset))
            }
        }
    }

    /// Returns whether bit `pos` is set.
    pub fn try_test(&self, pos: I) -> Result<bool, BitsetError> {
        let addr = self.locate(pos)?;
        match self.slots[addr.bucket].get() {
            None => Ok(false),
            Some(bucket) => Self::verify(bucket, addr.bucket).map(|b| b.test(addr.word, addr.offset)),
        }
    }

    /// Number of set bits. A relaxed snapshot under concurrent writers.
    pub fn count_ones(&self) -> usize {
        self.buckets().map(Bucket::count_ones).sum()
    }

    /// `true` if no bit is set.
    pub fn is_empty(&self) -> bool {
        self.buckets()
            .all(|b| (0..b.len_words()).all(|w| b.word(w).is_zero()))
    }

    /// Number of buckets whose storage has been allocated.
    pub fn allocated_buckets(&self) -> usize {
        self.buckets().count()
    }

    /// Whether bucket `bucket` has storage. `false` for out-of-range ids.
    pub fn is_allocated(&self, bucket: usize) -> bool {
        self.slots.get(bucket).is_some_and(|s| s.get().is_some())
    }

    /// Positions of set bits in ascending order.
    ///
    /// Words are read one at a time with relaxed loads, so concurrent writes
    /// may or may not be reflected.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(bucket, slot)| slot.get().map(|b| (bucket, b)))
            .flat_map(|(bucket, b)| {
                (0..b.len_words()).flat_map(move |word| {
                    let base = BitAddress { bucket, word, offset: 0 }.position(WIDTH, W::BITS);
                    Ones::new(b.word(word)).map(move |offset| base + offset as usize)
                })
            })
    }

    /// Occupancy summary.
    pub fn stats(&self) -> BitsetStats {
        let allocated_buckets = self.allocated_buckets();
        let bucket_bytes = core::mem::size_of::<Bucket<W>>()
            + Self::WORDS_PER_BUCKET * core::mem::size_of::<W>();
        BitsetStats {
            capacity: CAPACITY,
            bucket_bits: Self::BUCKET_BITS,
            word_bits: W::BITS,
            allocated_buckets,
            set_bits: self.count_ones(),
            allocated_bytes: allocated_buckets * bucket_bytes,
        }
    }

    fn buckets(&self) -> impl Iterator<Item = &Bucket<W>> + '_ {
        self.slots.iter().filter_map(Slot::get)
    }

    fn locate(&self, pos: I) -> Result<BitAddress, BitsetError> {
        let out_of_range = |pos| BitsetError::OutOfRange {
            pos,
            limit: self.capacity_bits(),
        };
        let pos = pos.to_usize().ok_or_else(|| out_of_range(usize::MAX))?;
        let addr = BitAddress::decompose(pos, WIDTH, W::BITS);
        if addr.bucket < CAPACITY {
            Ok(addr)
        } else {
            Err(out_of_range(pos))
        }
    }

    fn verify(bucket: &Bucket<W>, id: usize) -> Result<&Bucket<W>, BitsetError> {
        if bucket.is_owned_by(id) {
            Ok(bucket)
        } else {
            #[cfg(feature = "tracing")]
            tracing::warn!(bucket = id, tag = bucket.tag(), "bucket identity tag mismatch");
            Err(BitsetError::Corrupted {
                bucket: id,
                tag: bucket.tag(),
            })
        }
    }
}

impl<const CAPACITY: usize, const WIDTH: u32, W, const MAX_TRIES: usize, I> Default
    for AtomicSparseBitset<CAPACITY, WIDTH, W, MAX_TRIES, I>
where
    W: AtomicWord,
    I: PrimInt,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAPACITY: usize, const WIDTH: u32, W, const MAX_TRIES: usize, I> core::fmt::Debug
    for AtomicSparseBitset<CAPACITY, WIDTH, W, MAX_TRIES, I>
where
    W: AtomicWord,
    I: PrimInt,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AtomicSparseBitset")
            .field("capacity", &CAPACITY)
            .field("bucket_bits", &Self::BUCKET_BITS)
            .field("word_bits", &W::BITS)
            .field("allocated_buckets", &self.allocated_buckets())
            .finish()
    }
}

// A slot is exactly one pointer; the bucket lives behind it.
#[cfg(not(loom))]
const _: () = assert!(core::mem::size_of::<Slot<AtomicU32>>() == core::mem::size_of::<usize>());

/// Offsets of the set bits of one word, lowest first.
struct Ones<V> {
    bits: V,
}

impl<V: PrimInt> Ones<V> {
    fn new(bits: V) -> Self {
        Self { bits }
    }
}

impl<V: PrimInt> Iterator for Ones<V> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.bits.is_zero() {
            return None;
        }
        let offset = self.bits.trailing_zeros();
        self.bits = self.bits & (self.bits - V::one());
        Some(offset)
    }
}
