use num_traits::{One, PrimInt, Unsigned, Zero};

use crate::concurrency::sync::{AtomicU16, AtomicU32, AtomicU64, AtomicU8, AtomicUsize, Ordering};

/// An unsigned hardware atomic that bits can be packed into.
///
/// Only single-word read-modify-write operations are exposed: every bit flip
/// the bitset performs is one of these, so two threads flipping different
/// bits of the same word can never lose each other's update.
pub trait AtomicWord: Send + Sync + Sized {
    /// The plain integer stored in the atomic.
    type Value: PrimInt + Unsigned;

    /// Number of bits in one word.
    const BITS: u32;

    /// Creates a word with every bit cleared.
    fn zeroed() -> Self;

    /// Loads the current value.
    fn load(&self, order: Ordering) -> Self::Value;

    /// Stores a new value.
    fn store(&self, value: Self::Value, order: Ordering);

    /// Bitwise OR with the current value, returning the previous value.
    fn fetch_or(&self, value: Self::Value, order: Ordering) -> Self::Value;

    /// Bitwise AND with the current value, returning the previous value.
    fn fetch_and(&self, value: Self::Value, order: Ordering) -> Self::Value;

    /// Mask with only bit `offset` set.
    ///
    /// `offset` must be below [`Self::BITS`].
    #[inline(always)]
    fn mask(offset: u32) -> Self::Value {
        debug_assert!(offset < Self::BITS);
        <Self::Value as One>::one() << offset as usize
    }

    /// Sets bit `offset`, returning `true` if it was previously clear.
    #[inline(always)]
    fn set_bit(&self, offset: u32, order: Ordering) -> bool {
        let mask = Self::mask(offset);
        Zero::is_zero(&(self.fetch_or(mask, order) & mask))
    }

    /// Clears bit `offset`, returning `true` if it was previously set.
    #[inline(always)]
    fn clear_bit(&self, offset: u32, order: Ordering) -> bool {
        let mask = Self::mask(offset);
        !Zero::is_zero(&(self.fetch_and(!mask, order) & mask))
    }

    /// Returns whether bit `offset` is set.
    #[inline(always)]
    fn test_bit(&self, offset: u32, order: Ordering) -> bool {
        !Zero::is_zero(&(self.load(order) & Self::mask(offset)))
    }
}

macro_rules! impl_atomic_word {
    ($($atomic:ident => $raw:ty),* $(,)?) => {
        $(
            impl AtomicWord for $atomic {
                type Value = $raw;

                const BITS: u32 = <$raw>::BITS;

                #[inline(always)]
                fn zeroed() -> Self {
                    $atomic::new(0)
                }

                #[inline(always)]
                fn load(&self, order: Ordering) -> $raw {
                    $atomic::load(self, order)
                }

                #[inline(always)]
                fn store(&self, value: $raw, order: Ordering) {
                    $atomic::store(self, value, order);
                }

                #[inline(always)]
                fn fetch_or(&self, value: $raw, order: Ordering) -> $raw {
                    $atomic::fetch_or(self, value, order)
                }

                #[inline(always)]
                fn fetch_and(&self, value: $raw, order: Ordering) -> $raw {
                    $atomic::fetch_and(self, value, order)
                }
            }
        )*
    };
}

impl_atomic_word! {
    AtomicU8 => u8,
    AtomicU16 => u16,
    AtomicU32 => u32,
    AtomicU64 => u64,
    AtomicUsize => usize,
}
