//! Crate-wide error type.
//!
//! Every fallible operation in [`crate::lpm`], [`crate::heap`] and
//! [`crate::ring`] returns `Result<T, Error>`. Programming-bug-grade
//! invariant violations (an out-of-range prefix depth reaching the trie
//! internals, for instance) are not represented here — those abort via
//! `debug_assert!` at the call site instead of being reported to the
//! caller.

/// Failure modes shared by all three primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An argument failed validation (bad prefix depth, non-power-of-two
    /// ring count, zero-sized configuration, unknown flag bits).
    InvalidArgument,
    /// The operation would require capacity that is not available (rule
    /// table full, tbl8 pool exhausted, ring full).
    NoSpace,
    /// The requested entry does not exist (lookup miss, delete of an
    /// absent rule, dequeue from an empty ring).
    NotFound,
    /// Reserved for completeness with the original contract description.
    /// `Lpm::add` of an already-present identical rule is treated as
    /// success rather than surfaced through this variant; nothing in this
    /// crate currently returns it, but callers matching exhaustively on
    /// `Error` should still account for it.
    AlreadyExists,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Error::InvalidArgument => "invalid argument",
            Error::NoSpace => "no space available",
            Error::NotFound => "not found",
            Error::AlreadyExists => "already exists",
        };
        f.write_str(msg)
    }
}
