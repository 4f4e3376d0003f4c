//! Logical messages exchanged by [`FragmentingSocket`](crate::socket::FragmentingSocket).
//!
//! A [`Message`] lives in one of two modes. Outbound messages hold a complete
//! payload and a destination; [`Message::to_slices`] cuts them into wire
//! slices. Inbound messages start empty, bound to the peer that sent the
//! first slice, and [`Message::append`] accumulates slices until every index
//! `0..count` has arrived.

use std::{
    collections::BTreeMap,
    net::{IpAddr, SocketAddr},
    num::NonZeroUsize,
};

use bytes::Bytes;
use tracing::trace;

use crate::{
    byte_codec::{merge, split},
    fragment::{
        FragmentStatus,
        FragmentationError,
        MAX_SLICE_PAYLOAD,
        Slice,
        SliceError,
        SliceHeader,
        TransactionId,
    },
};

const CHUNK_SIZE: NonZeroUsize = match NonZeroUsize::new(MAX_SLICE_PAYLOAD) {
    Some(size) => size,
    None => panic!("slice payload capacity must be non-zero"),
};

/// Slices collected so far for an inbound message.
#[derive(Clone, Debug)]
struct Assembly {
    count: u32,
    parts: BTreeMap<u32, Bytes>,
}

impl Assembly {
    fn new(count: u32) -> Self {
        Self {
            count,
            parts: BTreeMap::new(),
        }
    }

    fn is_complete(&self) -> bool {
        u32::try_from(self.parts.len()).is_ok_and(|stored| stored >= self.count)
    }

    /// Concatenate parts in index order. Only meaningful once complete, when
    /// the keys are exactly `0..count`.
    fn merge(&self) -> Vec<u8> { merge(self.parts.values()) }
}

/// One logical payload travelling between two endpoints.
///
/// # Examples
///
/// ```
/// use std::net::{Ipv4Addr, SocketAddr};
///
/// use slicegram::{fragment::FragmentStatus, message::Message};
///
/// let peer = SocketAddr::from((Ipv4Addr::LOCALHOST, 9000));
/// let outbound = Message::new(vec![1_u8; 2500], peer);
/// let slices = outbound.to_slices().expect("slice payload");
/// assert_eq!(slices.len(), 3);
///
/// let mut inbound = Message::new_accumulating(peer.ip(), peer.port());
/// let mut status = FragmentStatus::Incomplete;
/// for slice in slices.into_iter().rev() {
///     status = inbound.append(slice).expect("consistent slice");
/// }
/// assert!(status.is_complete());
/// assert_eq!(inbound.payload(), outbound.payload());
/// ```
#[derive(Clone, Debug)]
pub struct Message {
    transaction_id: Option<TransactionId>,
    peer: SocketAddr,
    payload: Option<Vec<u8>>,
    assembly: Option<Assembly>,
}

impl Message {
    /// Create an outbound message with a freshly generated transaction id.
    #[must_use]
    pub fn new(payload: impl Into<Vec<u8>>, destination: SocketAddr) -> Self {
        Self::for_sending(
            TransactionId::random(),
            destination.ip(),
            destination.port(),
            payload,
        )
    }

    /// Create an outbound message with an explicit transaction id.
    #[must_use]
    pub fn for_sending(
        transaction_id: TransactionId,
        address: IpAddr,
        port: u16,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            transaction_id: Some(transaction_id),
            peer: SocketAddr::new(address, port),
            payload: Some(payload.into()),
            assembly: None,
        }
    }

    /// Create an empty inbound message bound to the sending peer.
    #[must_use]
    pub fn new_accumulating(address: IpAddr, port: u16) -> Self {
        Self {
            transaction_id: None,
            peer: SocketAddr::new(address, port),
            payload: None,
            assembly: None,
        }
    }

    /// Transaction id, known once the message is outbound or has seen a slice.
    #[must_use]
    pub const fn transaction_id(&self) -> Option<TransactionId> { self.transaction_id }

    /// Destination of an outbound message, or source of an inbound one.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr { self.peer }

    /// IP address of the peer.
    #[must_use]
    pub const fn address(&self) -> IpAddr { self.peer.ip() }

    /// UDP port of the peer.
    #[must_use]
    pub const fn port(&self) -> u16 { self.peer.port() }

    /// Replace the peer address.
    pub fn set_socket_address(&mut self, address: SocketAddr) { self.peer = address; }

    /// Complete payload; `None` while an inbound message is still accumulating.
    #[must_use]
    pub fn payload(&self) -> Option<&[u8]> { self.payload.as_deref() }

    /// Replace the payload, discarding any partial accumulation.
    pub fn set_payload(&mut self, payload: impl Into<Vec<u8>>) {
        self.payload = Some(payload.into());
        self.assembly = None;
    }

    /// Consume the message, returning the payload if complete.
    #[must_use]
    pub fn into_payload(self) -> Option<Vec<u8>> { self.payload }

    /// Whether the payload is available.
    #[must_use]
    pub fn is_complete(&self) -> bool { self.payload.is_some() }

    /// Number of distinct slices stored while accumulating.
    #[must_use]
    pub fn received_slices(&self) -> usize {
        self.assembly.as_ref().map_or(0, |assembly| assembly.parts.len())
    }

    /// Slice count announced by the first multi-slice fragment.
    #[must_use]
    pub fn expected_slices(&self) -> Option<u32> {
        self.assembly.as_ref().map(|assembly| assembly.count)
    }

    /// Cut the payload into wire slices of at most
    /// [`MAX_SLICE_PAYLOAD`] bytes each.
    ///
    /// Returns no slices when the payload is absent or empty.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::TooManySlices`] if the slice count does
    /// not fit in a `u32`.
    pub fn to_slices(&self) -> Result<Vec<Slice>, FragmentationError> {
        let (Some(transaction_id), Some(payload)) = (self.transaction_id, self.payload()) else {
            return Ok(Vec::new());
        };
        let chunks = split(payload, CHUNK_SIZE);
        let count = u32::try_from(chunks.len()).map_err(|_| FragmentationError::TooManySlices {
            length: payload.len(),
        })?;

        Ok((0..count)
            .zip(chunks)
            .map(|(index, chunk)| {
                Slice::from_trusted(SliceHeader::new(transaction_id, index, count), chunk.into())
            })
            .collect())
    }

    /// Feed one received slice into the message.
    ///
    /// A slice with `count == 1` completes the message at once and replaces
    /// its id and payload, even if a multi-slice accumulation was under way.
    /// The first multi-slice fragment fixes the transaction id and expected
    /// count. Later slices for the same id are stored by index, and a
    /// repeated index overwrites the earlier copy. Slices for another id are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SliceError::CountMismatch`] when the slice disagrees with the
    /// count recorded from the first fragment. The message is left untouched.
    pub fn append(&mut self, slice: Slice) -> Result<FragmentStatus, SliceError> {
        let (header, data) = slice.into_parts();
        let id = header.transaction_id();

        if header.count() == 1 {
            self.transaction_id = Some(id);
            self.payload = Some(data.to_vec());
            self.assembly = None;
            return Ok(FragmentStatus::Complete);
        }

        let Some(assembly) = self.assembly.as_mut() else {
            let mut assembly = Assembly::new(header.count());
            assembly.parts.insert(header.index(), data);
            self.transaction_id = Some(id);
            self.assembly = Some(assembly);
            return Ok(FragmentStatus::Incomplete);
        };

        if self.transaction_id != Some(id) {
            trace!(
                transaction = %id,
                index = header.index(),
                "ignoring slice routed to another message"
            );
            return Ok(FragmentStatus::Incomplete);
        }
        if header.count() != assembly.count {
            return Err(SliceError::CountMismatch {
                expected: assembly.count,
                found: header.count(),
            });
        }

        assembly.parts.insert(header.index(), data);
        if !assembly.is_complete() {
            return Ok(FragmentStatus::Incomplete);
        }

        self.payload = Some(assembly.merge());
        self.assembly = None;
        Ok(FragmentStatus::Complete)
    }
}

#[cfg(test)]
mod tests;
