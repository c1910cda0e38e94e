//! Atomic word abstraction.
//!
//! Bits are packed into hardware atomics. Which width is used is a
//! construction-time choice of the bitset, expressed through [`AtomicWord`].

/// Word trait plus its impls for the unsigned atomics.
pub mod word;

pub use word::AtomicWord;
