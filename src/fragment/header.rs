use super::{SliceError, TRANSACTION_ID_LEN, TransactionId};
use crate::byte_codec::{read_network_u32, write_network_u32};

/// Size of one datagram on the wire, header included.
pub const SLICE_LEN: usize = 1024;

/// Bytes occupied by [`SliceHeader`]: the transaction id plus two `u32` fields.
pub const HEADER_LEN: usize = TRANSACTION_ID_LEN + 2 * size_of::<u32>();

/// Largest payload a single slice carries.
pub const MAX_SLICE_PAYLOAD: usize = SLICE_LEN - HEADER_LEN;

const INDEX_OFFSET: usize = TRANSACTION_ID_LEN;

/// Fixed 24-byte prefix of every slice.
///
/// Layout: `[0..16)` transaction id, `[16..20)` big-endian index,
/// `[20..24)` big-endian count.
///
/// # Examples
///
/// ```
/// use slicegram::fragment::{SliceHeader, TransactionId};
/// let header = SliceHeader::new(TransactionId::new([1; 16]), 2, 3);
/// let bytes = header.encode();
/// assert_eq!(&bytes[16..24], &[0, 0, 0, 2, 0, 0, 0, 3]);
/// assert_eq!(SliceHeader::decode(&bytes), Ok(header));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SliceHeader {
    transaction_id: TransactionId,
    index: u32,
    count: u32,
}

impl SliceHeader {
    /// Create a header. Consistency of `index` and `count` is checked by
    /// [`Slice::new`](super::Slice::new) and [`SliceHeader::decode`].
    #[must_use]
    pub const fn new(transaction_id: TransactionId, index: u32, count: u32) -> Self {
        Self {
            transaction_id,
            index,
            count,
        }
    }

    /// Identifier of the message this slice belongs to.
    #[must_use]
    pub const fn transaction_id(&self) -> TransactionId { self.transaction_id }

    /// Zero-based position of the slice.
    #[must_use]
    pub const fn index(&self) -> u32 { self.index }

    /// Total number of slices in the message.
    #[must_use]
    pub const fn count(&self) -> u32 { self.count }

    /// Serialise the header into its wire form.
    #[must_use]
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0_u8; HEADER_LEN];
        let (id, rest) = bytes.split_at_mut(INDEX_OFFSET);
        let (index, count) = rest.split_at_mut(size_of::<u32>());
        id.copy_from_slice(self.transaction_id.as_bytes());
        index.copy_from_slice(&write_network_u32(self.index));
        count.copy_from_slice(&write_network_u32(self.count));
        bytes
    }

    /// Parse a header from the first [`HEADER_LEN`] bytes of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`SliceError::Truncated`] when fewer than [`HEADER_LEN`] bytes
    /// are supplied, [`SliceError::ZeroCount`] when the count is zero and
    /// [`SliceError::IndexOutOfRange`] when `index >= count`.
    pub fn decode(bytes: &[u8]) -> Result<Self, SliceError> {
        let truncated = || SliceError::Truncated {
            length: bytes.len(),
            minimum: HEADER_LEN,
        };
        let (id, rest) = bytes
            .split_first_chunk::<TRANSACTION_ID_LEN>()
            .ok_or_else(truncated)?;
        let (index, rest) = rest.split_first_chunk::<4>().ok_or_else(truncated)?;
        let (count, _) = rest.split_first_chunk::<4>().ok_or_else(truncated)?;

        let header = Self::new(
            TransactionId::new(*id),
            read_network_u32(*index),
            read_network_u32(*count),
        );
        header.validate()?;
        Ok(header)
    }

    pub(crate) fn validate(&self) -> Result<(), SliceError> {
        if self.count == 0 {
            return Err(SliceError::ZeroCount);
        }
        if self.index >= self.count {
            return Err(SliceError::IndexOutOfRange {
                index: self.index,
                count: self.count,
            });
        }
        Ok(())
    }
}

const _: () = assert!(HEADER_LEN == 24 && MAX_SLICE_PAYLOAD == 1000);
