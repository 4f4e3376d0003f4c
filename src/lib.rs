#![doc(html_root_url = "https://docs.rs/slicegram/latest")]
//! Public API for the `slicegram` library.
//!
//! This crate sends and receives payloads larger than one datagram over an
//! unreliable, MTU-bounded transport. Payloads are cut into fixed-size slices
//! on the way out and reassembled from a bounded cache on the way in. There
//! is no acknowledgement, retransmission or ordering beyond what the
//! transport already provides.

pub mod byte_codec;
pub mod cache;
pub mod fragment;
pub mod message;
pub mod metrics;
pub mod socket;

pub use cache::LruCache;
pub use fragment::{
    FragmentStatus,
    FragmentationError,
    HEADER_LEN,
    MAX_SLICE_PAYLOAD,
    SLICE_LEN,
    Slice,
    SliceError,
    SliceHeader,
    TransactionId,
};
pub use message::Message;
pub use socket::{DatagramTransport, FragmentingSocket, SocketConfig, SocketError};
