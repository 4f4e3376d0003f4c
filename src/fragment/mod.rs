//! Wire framing for slices, the fixed-size fragments of a logical message.
//!
//! Every datagram exchanged by [`FragmentingSocket`](crate::socket::FragmentingSocket)
//! is exactly one [`Slice`]. The layout is fixed and carries no version,
//! checksum or sequence number beyond the slice index:
//!
//! ```text
//! [0..16)   transaction id (opaque)
//! [16..20)  slice index, big-endian u32
//! [20..24)  slice count, big-endian u32
//! [24..)    payload, 0..=1000 bytes
//! ```

pub mod error;
pub mod header;
pub mod id;
pub mod slice;

pub use error::{FragmentStatus, FragmentationError, SliceError};
pub use header::{HEADER_LEN, MAX_SLICE_PAYLOAD, SLICE_LEN, SliceHeader};
pub use id::{TRANSACTION_ID_LEN, TransactionId};
pub use slice::Slice;
