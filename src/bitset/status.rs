//! Result vocabulary shared by every bitset operation.

use serde::{Deserialize, Serialize};

/// Outcome of a bitset operation.
///
/// Mutations report [`Success`](Status::Success) or a failure kind; queries
/// report [`Yes`](Status::Yes) / [`No`](Status::No). No operation panics,
/// so the caller decides whether a failure is retried, ignored or escalated.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// The mutation was applied.
    Success,
    /// `set` could not install or reach its bucket within the retry bound.
    Failed,
    /// `reset`/`test` could not reach a consistent bucket.
    NotFound,
    /// The queried bit is set.
    Yes,
    /// The queried bit is clear.
    No,
    /// The position lies outside `[0, CAPACITY << WIDTH)`.
    OutOfRange,
}

impl Status {
    /// `true` for outcomes that are not failures (`Success`, `Yes`, `No`).
    #[inline]
    pub const fn is_success(self) -> bool {
        matches!(self, Status::Success | Status::Yes | Status::No)
    }

    /// `true` for `Failed`, `NotFound` and `OutOfRange`.
    #[inline]
    pub const fn is_failure(self) -> bool {
        !self.is_success()
    }

    /// Maps a query outcome to a boolean; `None` for anything else.
    #[inline]
    pub const fn as_bool(self) -> Option<bool> {
        match self {
            Status::Yes => Some(true),
            Status::No => Some(false),
            _ => None,
        }
    }
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Status::Success => "success",
            Status::Failed => "failed",
            Status::NotFound => "not found",
            Status::Yes => "yes",
            Status::No => "no",
            Status::OutOfRange => "out of range",
        })
    }
}
