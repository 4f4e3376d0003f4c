//! The slice: one datagram's worth of a logical message.
//!
//! A slice is a [`SliceHeader`] followed by up to [`MAX_SLICE_PAYLOAD`] bytes
//! of payload. Parsing copies the payload out of the receive buffer so the
//! buffer can be reused for the next datagram.

use bytes::{BufMut, Bytes, BytesMut};

use super::{HEADER_LEN, MAX_SLICE_PAYLOAD, SliceError, SliceHeader, TransactionId};

/// Immutable wire fragment carrying part of a message.
///
/// # Examples
///
/// ```
/// use slicegram::fragment::{Slice, SliceHeader, TransactionId};
/// let header = SliceHeader::new(TransactionId::new([7; 16]), 0, 1);
/// let slice = Slice::new(header, &b"hello"[..]).expect("valid slice");
/// let wire = slice.serialize();
/// assert_eq!(wire.len(), 24 + 5);
/// assert_eq!(Slice::parse(&wire), Ok(slice));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slice {
    header: SliceHeader,
    payload: Bytes,
}

impl Slice {
    /// Build a slice, checking the header and the payload size.
    ///
    /// # Errors
    ///
    /// Returns [`SliceError::ZeroCount`] or [`SliceError::IndexOutOfRange`]
    /// for an inconsistent header and [`SliceError::PayloadTooLarge`] when the
    /// payload exceeds [`MAX_SLICE_PAYLOAD`].
    pub fn new(header: SliceHeader, payload: impl Into<Bytes>) -> Result<Self, SliceError> {
        header.validate()?;
        let payload = payload.into();
        if payload.len() > MAX_SLICE_PAYLOAD {
            return Err(SliceError::PayloadTooLarge {
                length: payload.len(),
                maximum: MAX_SLICE_PAYLOAD,
            });
        }
        Ok(Self { header, payload })
    }

    /// Build a slice whose header and payload size are correct by construction.
    pub(crate) fn from_trusted(header: SliceHeader, payload: Bytes) -> Self {
        debug_assert!(header.validate().is_ok(), "inconsistent slice header");
        debug_assert!(payload.len() <= MAX_SLICE_PAYLOAD, "oversize slice payload");
        Self { header, payload }
    }

    /// Parse a received datagram.
    ///
    /// `datagram` must be exactly the bytes the transport reported; the
    /// payload is everything after the header.
    ///
    /// # Errors
    ///
    /// Returns [`SliceError::Truncated`] for datagrams shorter than
    /// [`HEADER_LEN`], the header consistency errors of
    /// [`SliceHeader::decode`], and [`SliceError::PayloadTooLarge`] for
    /// oversize datagrams.
    pub fn parse(datagram: &[u8]) -> Result<Self, SliceError> {
        let header = SliceHeader::decode(datagram)?;
        let payload = datagram.get(HEADER_LEN..).unwrap_or_default();
        Self::new(header, Bytes::copy_from_slice(payload))
    }

    /// Serialise the slice into a single datagram.
    #[must_use]
    pub fn serialize(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.wire_len());
        buf.put_slice(&self.header.encode());
        buf.put_slice(&self.payload);
        buf.freeze()
    }

    /// Size of the serialised slice in bytes.
    #[must_use]
    pub fn wire_len(&self) -> usize { HEADER_LEN + self.payload.len() }

    /// Return the slice header.
    #[must_use]
    pub const fn header(&self) -> &SliceHeader { &self.header }

    /// Identifier of the message this slice belongs to.
    #[must_use]
    pub const fn transaction_id(&self) -> TransactionId { self.header.transaction_id() }

    /// Zero-based position of the slice.
    #[must_use]
    pub const fn index(&self) -> u32 { self.header.index() }

    /// Total number of slices in the message.
    #[must_use]
    pub const fn count(&self) -> u32 { self.header.count() }

    /// Borrow the payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] { &self.payload }

    /// Consume the slice, returning its components.
    #[must_use]
    pub fn into_parts(self) -> (SliceHeader, Bytes) { (self.header, self.payload) }
}
