//! Concurrency building blocks for the bitset.
//!
//! Everything here is lock-free: callers only ever spin for a bounded number
//! of attempts, never block.

pub mod atomic;
pub mod sync;

pub use atomic::AtomicWord;
