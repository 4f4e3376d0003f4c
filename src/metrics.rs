//! Metric helpers for `slicegram`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! the helpers compile to nothing.

#[cfg(feature = "metrics")]
use metrics::counter;

/// Name of the counter tracking slices sent and received.
pub const SLICES_PROCESSED: &str = "slicegram_slices_processed_total";
/// Name of the counter tracking datagrams discarded as malformed.
pub const MALFORMED_TOTAL: &str = "slicegram_malformed_datagrams_total";
/// Name of the counter tracking incomplete messages evicted from the cache.
pub const EVICTIONS_TOTAL: &str = "slicegram_evicted_messages_total";
/// Name of the counter tracking fully reassembled messages.
pub const MESSAGES_ASSEMBLED: &str = "slicegram_messages_assembled_total";

/// Direction of slice processing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Slices read from the transport.
    Inbound,
    /// Slices written to the transport.
    Outbound,
}

impl Direction {
    /// Label value used for this direction.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Record a slice processed in the given direction.
pub fn inc_slices(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(SLICES_PROCESSED, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record a datagram discarded as malformed.
pub fn inc_malformed() {
    #[cfg(feature = "metrics")]
    counter!(MALFORMED_TOTAL).increment(1);
}

/// Record an incomplete message evicted under capacity pressure.
pub fn inc_evictions() {
    #[cfg(feature = "metrics")]
    counter!(EVICTIONS_TOTAL).increment(1);
}

/// Record a message whose slices were all received.
pub fn inc_assembled() {
    #[cfg(feature = "metrics")]
    counter!(MESSAGES_ASSEMBLED).increment(1);
}
