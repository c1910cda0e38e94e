//! Lazily allocated bucket storage.
//!
//! A [`Slot`] starts out empty and is filled at most once with a heap
//! allocated [`Bucket`]. Installation is a single compare-and-swap from null
//! to the candidate pointer, so exactly one candidate ever wins; a thread whose
//! candidate loses gets the box back and drops it itself. Installed buckets are
//! only freed when the slot itself is dropped, at which point no other thread
//! can hold a reference into it.

use core::marker::PhantomData;
use core::ptr;

use num_traits::PrimInt;

use crate::concurrency::sync::{AtomicPtr, Ordering};
use crate::concurrency::AtomicWord;

/// Storage for one `2^width` range of bit positions.
pub(crate) struct Bucket<W> {
    /// Bucket id this storage was allocated for.
    tag: usize,
    words: Box<[W]>,
}

impl<W: AtomicWord> Bucket<W> {
    /// Creates an all-zero bucket of `words` words tagged with `tag`.
    pub(crate) fn new(tag: usize, words: usize) -> Self {
        let words = (0..words).map(|_| W::zeroed()).collect();
        Self { tag, words }
    }

    #[inline(always)]
    pub(crate) fn tag(&self) -> usize {
        self.tag
    }

    /// Whether this bucket was allocated for bucket id `bucket`.
    #[inline(always)]
    pub(crate) fn is_owned_by(&self, bucket: usize) -> bool {
        self.tag == bucket
    }

    #[inline(always)]
    pub(crate) fn set(&self, word: usize, offset: u32) -> bool {
        self.words[word].set_bit(offset, Ordering::Relaxed)
    }

    #[inline(always)]
    pub(crate) fn clear(&self, word: usize, offset: u32) -> bool {
        self.words[word].clear_bit(offset, Ordering::Relaxed)
    }

    #[inline(always)]
    pub(crate) fn test(&self, word: usize, offset: u32) -> bool {
        self.words[word].test_bit(offset, Ordering::Relaxed)
    }

    /// Zeroes every word with relaxed stores. Not atomic as a whole.
    pub(crate) fn clear_all(&self) {
        let zero = <W::Value as num_traits::Zero>::zero();
        for w in self.words.iter() {
            w.store(zero, Ordering::Relaxed);
        }
    }

    pub(crate) fn count_ones(&self) -> usize {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Relaxed).count_ones() as usize)
            .sum()
    }

    /// Snapshot of word `idx`.
    #[inline]
    pub(crate) fn word(&self, idx: usize) -> W::Value {
        self.words[idx].load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn len_words(&self) -> usize {
        self.words.len()
    }
}

/// Result of [`Slot::try_install`].
pub(crate) enum Install<'a, W> {
    /// The candidate is now the slot's bucket.
    Installed(&'a Bucket<W>),
    /// Another bucket was installed first; the candidate is handed back.
    Lost {
        winner: &'a Bucket<W>,
        candidate: Box<Bucket<W>>,
    },
    /// The exchange failed spuriously and the slot is still empty.
    Spurious(Box<Bucket<W>>),
}

/// A write-once owning pointer to a [`Bucket`].
pub(crate) struct Slot<W> {
    ptr: AtomicPtr<Bucket<W>>,
    _owns: PhantomData<Box<Bucket<W>>>,
}

impl<W: AtomicWord> Slot<W> {
    pub(crate) fn empty() -> Self {
        Self {
            ptr: AtomicPtr::new(ptr::null_mut()),
            _owns: PhantomData,
        }
    }

    /// Returns the installed bucket, if any.
    #[inline(always)]
    pub(crate) fn get(&self) -> Option<&Bucket<W>> {
        // Acquire pairs with the Release in `try_install`, so the bucket's
        // initialized words are visible before we touch them.
        let p = self.ptr.load(Ordering::Acquire);
        // SAFETY: a non-null pointer was produced by `Box::into_raw` in
        // `try_install` and stays valid until `self` is dropped, which cannot
        // happen while `&self` is borrowed.
        unsafe { p.as_ref() }
    }

    /// Attempts to publish `candidate` into the empty slot.
    pub(crate) fn try_install(&self, candidate: Box<Bucket<W>>) -> Install<'_, W> {
        #[cfg(test)]
        if spurious::forced() {
            return Install::Spurious(candidate);
        }
        let raw = Box::into_raw(candidate);
        match self
            .ptr
            .compare_exchange_weak(ptr::null_mut(), raw, Ordering::Release, Ordering::Acquire)
        {
            // SAFETY: `raw` now belongs to the slot and lives as long as it.
            Ok(_) => Install::Installed(unsafe { &*raw }),
            Err(current) => {
                // SAFETY: the exchange failed, so `raw` was never published and
                // this thread still owns it exclusively.
                let candidate = unsafe { Box::from_raw(raw) };
                // SAFETY: see `get`; the Acquire failure ordering synchronizes
                // with the winner's Release.
                match unsafe { current.as_ref() } {
                    Some(winner) => Install::Lost { winner, candidate },
                    None => Install::Spurious(candidate),
                }
            }
        }
    }

    /// Places `bucket` into the slot unconditionally. Test-only.
    #[cfg(test)]
    pub(crate) fn force(&mut self, bucket: Box<Bucket<W>>) {
        let old = self.ptr.swap(Box::into_raw(bucket), Ordering::AcqRel);
        if !old.is_null() {
            // SAFETY: `&mut self` means nobody else can be reading `old`.
            drop(unsafe { Box::from_raw(old) });
        }
    }
}

/// Test hook making every exchange on the current thread fail spuriously.
#[cfg(test)]
pub(crate) mod spurious {
    use std::cell::Cell;

    thread_local! {
        static FORCED: Cell<bool> = const { Cell::new(false) };
    }

    pub(crate) fn forced() -> bool {
        FORCED.with(Cell::get)
    }

    /// Runs `f` with spurious install failures forced on this thread.
    pub(crate) fn with<R>(f: impl FnOnce() -> R) -> R {
        struct Reset;
        impl Drop for Reset {
            fn drop(&mut self) {
                FORCED.with(|c| c.set(false));
            }
        }
        FORCED.with(|c| c.set(true));
        let _reset = Reset;
        f()
    }
}

impl<W> Drop for Slot<W> {
    fn drop(&mut self) {
        let p = self.ptr.load(Ordering::Acquire);
        if !p.is_null() {
            // SAFETY: `&mut self` guarantees exclusive access; the pointer came
            // from `Box::into_raw` and is released exactly once, here.
            drop(unsafe { Box::from_raw(p) });
        }
    }
}
