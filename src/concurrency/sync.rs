//! Atomic primitives used by the crate.
//!
//! Under `--cfg loom` these resolve to loom's model-checked atomics so the
//! install protocol can be exhaustively explored. Otherwise they are the
//! `core` atomics.

#[cfg(loom)]
pub use loom::sync::atomic::{
    AtomicPtr, AtomicU16, AtomicU32, AtomicU64, AtomicU8, AtomicUsize, Ordering,
};

#[cfg(not(loom))]
pub use core::sync::atomic::{
    AtomicPtr, AtomicU16, AtomicU32, AtomicU64, AtomicU8, AtomicUsize, Ordering,
};
