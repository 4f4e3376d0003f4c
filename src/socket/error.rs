//! Errors raised by [`FragmentingSocket`](super::FragmentingSocket) operations.

use std::{io, net::SocketAddr, time::Duration};

use thiserror::Error;

use crate::fragment::FragmentationError;

/// Errors surfaced to callers of `send` and `receive`.
///
/// Malformed inbound fragments are not represented here: the receive loop
/// drops them and keeps waiting.
#[derive(Debug, Error)]
pub enum SocketError {
    /// The destination cannot be used with this socket.
    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: &'static str },
    /// The underlying datagram socket failed.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
    /// No complete message arrived within the allotted time.
    #[error("no complete message received within {0:?}")]
    Timeout(Duration),
    /// The message has no payload to send.
    #[error("message payload is empty")]
    EmptyMessage,
    /// The payload could not be sliced.
    #[error(transparent)]
    Fragmentation(#[from] FragmentationError),
    /// The socket was closed.
    #[error("socket closed")]
    Closed,
}

impl SocketError {
    pub(crate) fn invalid_address(address: SocketAddr, reason: &'static str) -> Self {
        Self::InvalidAddress {
            address: address.to_string(),
            reason,
        }
    }

    /// Whether the error leaves the socket usable for further calls.
    ///
    /// Transport failures and closure are fatal to the instance; callers
    /// should close it and construct a new one.
    #[must_use]
    pub fn is_recoverable(&self) -> bool { !matches!(self, Self::Transport(_) | Self::Closed) }
}
