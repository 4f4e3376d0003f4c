//! Send and receive messages larger than one datagram.
//!
//! [`FragmentingSocket`] wraps a [`DatagramTransport`]. `send` cuts a
//! [`Message`] into slices and emits one datagram per slice; `receive` reads
//! datagrams, keeps partially received messages in a bounded
//! [`LruCache`] keyed by transaction id, and returns the first message whose
//! slices are all present.
//!
//! Nothing is acknowledged or retransmitted. Lost slices leave a partial
//! message in the cache until it is evicted by newer traffic, and eviction
//! drops the partial message silently.

pub mod config;
pub mod error;
pub mod transport;

use std::{
    net::SocketAddr,
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use log::warn;
use tokio::{
    net::{ToSocketAddrs, UdpSocket, lookup_host},
    sync::Mutex,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub use self::{
    config::{DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_SLICE_COUNT, SocketConfig},
    error::SocketError,
    transport::DatagramTransport,
};
use crate::{
    cache::LruCache,
    fragment::{FragmentStatus, SLICE_LEN, Slice, SliceError, TransactionId},
    message::Message,
    metrics::{self, Direction},
};

/// Room for one datagram plus a byte to detect oversize ones.
const RECEIVE_BUFFER_LEN: usize = SLICE_LEN + 1;

/// Receive-side state, owned by whichever caller is inside `receive`.
struct ReceiveState {
    cache: LruCache<TransactionId, Message>,
    buffer: Vec<u8>,
}

/// Message-oriented socket that fragments and reassembles payloads.
///
/// `send` may run concurrently with itself and with `receive`. Concurrent
/// `receive` calls are serialised: only one caller reads datagrams at a
/// time, the others wait for it to return.
///
/// # Examples
///
/// ```no_run
/// use slicegram::{message::Message, socket::FragmentingSocket};
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let socket = FragmentingSocket::bind("127.0.0.1:0").await?;
/// let peer = socket.resolve("localhost", 7000).await?;
/// socket.send(&Message::new(vec![0_u8; 4096], peer)).await?;
///
/// let reply = socket.receive().await?;
/// println!("{} bytes from {}", reply.payload().map_or(0, <[u8]>::len), reply.socket_addr());
/// # Ok(())
/// # }
/// ```
pub struct FragmentingSocket<T> {
    transport: RwLock<Option<Arc<T>>>,
    config: SocketConfig,
    receiver: Mutex<ReceiveState>,
    shutdown: CancellationToken,
}

impl FragmentingSocket<UdpSocket> {
    /// Bind a UDP socket to `address` and wrap it with the default config.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Transport`] if binding fails.
    pub async fn bind(address: impl ToSocketAddrs) -> Result<Self, SocketError> {
        let socket = UdpSocket::bind(address).await?;
        Ok(Self::new(socket))
    }
}

impl<T: DatagramTransport> FragmentingSocket<T> {
    /// Wrap `transport` using [`SocketConfig::default`].
    #[must_use]
    pub fn new(transport: T) -> Self { Self::with_config(transport, SocketConfig::default()) }

    /// Wrap `transport` with explicit settings.
    #[must_use]
    pub fn with_config(transport: T, config: SocketConfig) -> Self {
        Self {
            transport: RwLock::new(Some(Arc::new(transport))),
            config,
            receiver: Mutex::new(ReceiveState {
                cache: LruCache::new(config.cache_capacity),
                buffer: vec![0; RECEIVE_BUFFER_LEN],
            }),
            shutdown: CancellationToken::new(),
        }
    }

    /// Shared handle to the underlying transport, or `None` once closed.
    #[must_use]
    pub fn transport(&self) -> Option<Arc<T>> {
        self.transport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Return the active configuration.
    #[must_use]
    pub const fn config(&self) -> &SocketConfig { &self.config }

    /// Address the underlying transport is bound to.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Transport`] if the transport cannot report it
    /// and [`SocketError::Closed`] after [`close`](Self::close).
    pub fn local_addr(&self) -> Result<SocketAddr, SocketError> {
        Ok(self.open_transport()?.local_addr()?)
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.shutdown.is_cancelled() }

    /// Number of partially received messages held in the cache.
    ///
    /// Waits for any in-progress `receive` call to return.
    pub async fn buffered_len(&self) -> usize { self.receiver.lock().await.cache.len() }

    /// Resolve `host:port` to an address of the same family as this socket.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::InvalidAddress`] when resolution fails or yields
    /// no address of a usable family, and [`SocketError::Transport`] or
    /// [`SocketError::Closed`] when the local address is unavailable.
    pub async fn resolve(&self, host: &str, port: u16) -> Result<SocketAddr, SocketError> {
        let local = self.local_addr()?;
        let invalid = |reason| SocketError::InvalidAddress {
            address: format!("{host}:{port}"),
            reason,
        };
        let mut candidates = lookup_host((host, port))
            .await
            .map_err(|_| invalid("name resolution failed"))?;
        candidates
            .find(|candidate| candidate.is_ipv4() == local.is_ipv4())
            .ok_or_else(|| invalid("no address of the local socket's family"))
    }

    /// Send `message` to its destination, one datagram per slice.
    ///
    /// Returns the number of datagrams sent. Slices are sent in index order,
    /// but the network may deliver, drop or duplicate each independently.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::InvalidAddress`] for destinations this socket
    /// cannot reach, [`SocketError::EmptyMessage`] when there is no payload,
    /// [`SocketError::Fragmentation`] when the payload cannot be sliced,
    /// [`SocketError::Transport`] when the transport fails and
    /// [`SocketError::Closed`] after [`close`](Self::close).
    pub async fn send(&self, message: &Message) -> Result<usize, SocketError> {
        let transport = self.open_transport()?;
        let destination = message.socket_addr();
        check_destination(transport.local_addr()?, destination)?;

        let slices = message.to_slices()?;
        if slices.is_empty() {
            return Err(SocketError::EmptyMessage);
        }
        for slice in &slices {
            transport
                .send_datagram(&slice.serialize(), destination)
                .await?;
            metrics::inc_slices(Direction::Outbound);
        }

        debug!(
            transaction = ?message.transaction_id(),
            slices = slices.len(),
            peer = %destination,
            "message sent"
        );
        Ok(slices.len())
    }

    /// Wait for the next complete message.
    ///
    /// Applies [`SocketConfig::receive_timeout`] when set. Malformed datagrams
    /// are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Transport`] when the transport fails,
    /// [`SocketError::Timeout`] when the configured timeout elapses and
    /// [`SocketError::Closed`] once the socket is closed.
    pub async fn receive(&self) -> Result<Message, SocketError> {
        match self.config.receive_timeout {
            Some(limit) => self.receive_timeout(limit).await,
            None => self.receive_loop().await,
        }
    }

    /// Wait at most `limit` for the next complete message.
    ///
    /// Partially received messages stay cached when the limit elapses.
    ///
    /// # Errors
    ///
    /// As [`receive`](Self::receive), with [`SocketError::Timeout`] once
    /// `limit` elapses.
    pub async fn receive_timeout(&self, limit: Duration) -> Result<Message, SocketError> {
        tokio::time::timeout(limit, self.receive_loop())
            .await
            .map_err(|_| SocketError::Timeout(limit))?
    }

    /// Stop all I/O, release the transport and discard partially received
    /// messages.
    ///
    /// A pending `receive` returns [`SocketError::Closed`]. Once it has
    /// returned, and any `send` still writing has finished, the last handle
    /// to the transport is dropped and a UDP port is free to bind again.
    pub async fn close(&self) {
        self.shutdown.cancel();
        let released = self
            .transport
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(released);
        let mut state = self.receiver.lock().await;
        let dropped = state.cache.len();
        state.cache.clear();
        state.buffer = Vec::new();
        debug!(dropped, "socket closed");
    }

    async fn receive_loop(&self) -> Result<Message, SocketError> {
        let mut guard = self.receiver.lock().await;
        let state = &mut *guard;
        let transport = self.open_transport()?;
        loop {
            if self.is_closed() {
                return Err(SocketError::Closed);
            }
            let (len, source) = tokio::select! {
                biased;
                () = self.shutdown.cancelled() => return Err(SocketError::Closed),
                received = transport.receive_datagram(&mut state.buffer) => received?,
            };
            if let Some(message) = self.absorb(state, len, source) {
                return Ok(message);
            }
        }
    }

    /// Feed one datagram into the reassembly state, returning a message if it
    /// completed one.
    fn absorb(&self, state: &mut ReceiveState, len: usize, source: SocketAddr) -> Option<Message> {
        let datagram = state.buffer.get(..len).unwrap_or(state.buffer.as_slice());
        let slice = match Slice::parse(datagram) {
            Ok(slice) => slice,
            Err(err) => {
                discard(source, &err);
                return None;
            }
        };

        let maximum = self.config.max_slice_count.get();
        if slice.count() > maximum {
            let err = SliceError::CountTooLarge {
                count: slice.count(),
                maximum,
            };
            discard(source, &err);
            return None;
        }
        metrics::inc_slices(Direction::Inbound);

        if slice.count() == 1 {
            let mut message = Message::new_accumulating(source.ip(), source.port());
            return match message.append(slice) {
                Ok(FragmentStatus::Complete) => Some(assembled(message)),
                Ok(FragmentStatus::Incomplete) => None,
                Err(err) => {
                    discard(source, &err);
                    None
                }
            };
        }

        let id = slice.transaction_id();
        if !state.cache.contains_key(&id) {
            let fresh = Message::new_accumulating(source.ip(), source.port());
            if let Some((evicted, partial)) = state.cache.put(id, fresh) {
                debug!(
                    transaction = %evicted,
                    received = partial.received_slices(),
                    expected = ?partial.expected_slices(),
                    "evicted incomplete message"
                );
                metrics::inc_evictions();
            }
        }

        let message = state.cache.get_mut(&id)?;
        match message.append(slice) {
            Ok(FragmentStatus::Incomplete) => None,
            Ok(FragmentStatus::Complete) => state.cache.remove(&id).map(assembled),
            Err(err) => {
                discard(source, &err);
                None
            }
        }
    }

    fn open_transport(&self) -> Result<Arc<T>, SocketError> {
        if self.is_closed() {
            return Err(SocketError::Closed);
        }
        self.transport().ok_or(SocketError::Closed)
    }
}

fn check_destination(local: SocketAddr, destination: SocketAddr) -> Result<(), SocketError> {
    if destination.port() == 0 {
        return Err(SocketError::invalid_address(destination, "port 0 is not addressable"));
    }
    if destination.ip().is_unspecified() {
        return Err(SocketError::invalid_address(destination, "unspecified address"));
    }
    if local.is_ipv4() != destination.is_ipv4() {
        return Err(SocketError::invalid_address(
            destination,
            "address family differs from the local socket",
        ));
    }
    Ok(())
}

fn discard(source: SocketAddr, err: &SliceError) {
    warn!("discarding malformed datagram from {source}: {err}");
    metrics::inc_malformed();
}

fn assembled(message: Message) -> Message {
    debug!(
        transaction = ?message.transaction_id(),
        bytes = message.payload().map_or(0, <[u8]>::len),
        peer = %message.socket_addr(),
        "message assembled"
    );
    metrics::inc_assembled();
    message
}
