//! Configuration for [`FragmentingSocket`](super::FragmentingSocket).

use std::{
    num::{NonZeroU32, NonZeroUsize},
    time::Duration,
};

use serde::{Deserialize, Serialize};

/// Default number of partially received messages kept in memory.
pub const DEFAULT_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(16) {
    Some(capacity) => capacity,
    None => panic!("cache capacity must be non-zero"),
};

/// Default bound on the slice count a peer may announce.
pub const DEFAULT_MAX_SLICE_COUNT: NonZeroU32 = match NonZeroU32::new(65_536) {
    Some(count) => count,
    None => panic!("slice count bound must be non-zero"),
};

/// Settings that bound reassembly memory and receive latency.
///
/// # Examples
///
/// ```
/// use std::{num::NonZeroUsize, time::Duration};
///
/// use slicegram::socket::SocketConfig;
///
/// let config = SocketConfig::default()
///     .with_cache_capacity(NonZeroUsize::new(64).expect("non-zero"))
///     .with_receive_timeout(Duration::from_secs(5));
/// assert_eq!(config.cache_capacity.get(), 64);
/// assert_eq!(config.receive_timeout, Some(Duration::from_secs(5)));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocketConfig {
    /// Maximum number of incomplete messages tracked at once. When exceeded,
    /// the least recently touched message is dropped without notice.
    pub cache_capacity: NonZeroUsize,
    /// How long `receive` waits for a complete message. `None` waits forever.
    pub receive_timeout: Option<Duration>,
    /// Largest slice count accepted from a peer. Slices announcing more are
    /// discarded before any reassembly state is allocated.
    pub max_slice_count: NonZeroU32,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            receive_timeout: None,
            max_slice_count: DEFAULT_MAX_SLICE_COUNT,
        }
    }
}

impl SocketConfig {
    /// Set the number of incomplete messages tracked at once.
    #[must_use]
    pub const fn with_cache_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Bound how long `receive` waits for a complete message.
    #[must_use]
    pub const fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = Some(timeout);
        self
    }

    /// Set the largest slice count accepted from a peer.
    #[must_use]
    pub const fn with_max_slice_count(mut self, count: NonZeroU32) -> Self {
        self.max_slice_count = count;
        self
    }
}
