//! Error and status types emitted by the slicing layer.
//!
//! [`SliceError`] covers every way an inbound datagram can fail to be a
//! usable slice. The receive loop discards such datagrams; the variants exist
//! so tests and logs can say precisely why.

use thiserror::Error;

/// Result of appending a slice to an accumulating message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FragmentStatus {
    /// The message still expects more slices.
    Incomplete,
    /// The slice completed the message.
    Complete,
}

impl FragmentStatus {
    /// Whether the message is now complete.
    #[must_use]
    pub const fn is_complete(self) -> bool { matches!(self, Self::Complete) }
}

/// A malformed fragment: bytes that cannot be accepted as a slice.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SliceError {
    /// The datagram is shorter than the slice header.
    #[error("datagram of {length} bytes is shorter than the {minimum}-byte slice header")]
    Truncated { length: usize, minimum: usize },
    /// The header announces a message of zero slices.
    #[error("slice count must be at least one")]
    ZeroCount,
    /// The slice index lies outside the announced count.
    #[error("slice index {index} out of range for count {count}")]
    IndexOutOfRange { index: u32, count: u32 },
    /// The slice disagrees with earlier slices about the total count.
    #[error("slice count mismatch: expected {expected}, found {found}")]
    CountMismatch { expected: u32, found: u32 },
    /// The payload does not fit into one datagram.
    #[error("slice payload of {length} bytes exceeds {maximum}")]
    PayloadTooLarge { length: usize, maximum: usize },
    /// The announced count exceeds the receiver's configured bound.
    #[error("slice count {count} exceeds the configured maximum {maximum}")]
    CountTooLarge { count: u32, maximum: u32 },
}

/// Errors produced while slicing outbound messages.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FragmentationError {
    /// The payload needs more slices than a `u32` count can describe.
    #[error("payload of {length} bytes needs more than u32::MAX slices")]
    TooManySlices { length: usize },
}
