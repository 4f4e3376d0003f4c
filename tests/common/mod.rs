//! Shared utilities for integration tests.
//!
//! Provides a log capture fixture, loopback socket fixtures and
//! [`ScriptedTransport`], an in-memory [`DatagramTransport`] whose inbound
//! datagrams are fed by the test and whose outbound datagrams are recorded.

// Items in this shared module may not be used by all test binaries that import it.
#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use std::{
    io,
    net::{Ipv4Addr, SocketAddr},
    sync::{Mutex, MutexGuard, OnceLock},
};

use async_trait::async_trait;
use logtest::Logger;
use rstest::fixture;
use slicegram::{
    DatagramTransport,
    FragmentingSocket,
    Slice,
    SliceHeader,
    TransactionId,
};
use tokio::{net::UdpSocket, sync::mpsc};

/// Handle to the global logger with exclusive access.
///
/// Serialises access to a [`logtest::Logger`] so tests capturing logs do not
/// see each other's records.
pub struct LoggerHandle {
    guard: MutexGuard<'static, Logger>,
}

impl LoggerHandle {
    /// Acquire the global [`Logger`] instance and drop stale records.
    pub fn new() -> Self {
        static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();

        let logger = LOGGER.get_or_init(|| Mutex::new(Logger::start()));
        let mut guard = logger
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        while guard.pop().is_some() {}

        Self { guard }
    }

    /// Drain captured records, returning the `(level, message)` pairs.
    pub fn drain(&mut self) -> Vec<(log::Level, String)> {
        let mut records = Vec::new();
        while let Some(record) = self.guard.pop() {
            records.push((record.level(), record.args().to_string()));
        }
        records
    }
}

impl std::ops::Deref for LoggerHandle {
    type Target = Logger;

    fn deref(&self) -> &Self::Target { &self.guard }
}

impl std::ops::DerefMut for LoggerHandle {
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.guard }
}

#[allow(
    unused_braces,
    reason = "rustc false positive for single line rstest fixtures"
)]
#[fixture]
pub fn logger() -> LoggerHandle { LoggerHandle::new() }

/// Address used as the local end of every [`ScriptedTransport`].
pub const SCRIPTED_LOCAL: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 5000);

/// Address used as the remote peer in scripted tests.
pub const SCRIPTED_PEER: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 6000);

/// In-memory transport driven by the test.
pub struct ScriptedTransport {
    inbound: tokio::sync::Mutex<mpsc::UnboundedReceiver<(Vec<u8>, SocketAddr)>>,
    sent: Mutex<Vec<(Vec<u8>, SocketAddr)>>,
    local: SocketAddr,
}

/// Feeds datagrams into a [`ScriptedTransport`].
#[derive(Clone)]
pub struct Script {
    tx: mpsc::UnboundedSender<(Vec<u8>, SocketAddr)>,
}

impl Script {
    /// Queue `datagram` as if it arrived from `source`.
    pub fn deliver(&self, datagram: impl Into<Vec<u8>>, source: SocketAddr) {
        self.tx
            .send((datagram.into(), source))
            .expect("scripted transport dropped");
    }

    /// Queue a serialised slice from [`SCRIPTED_PEER`].
    pub fn deliver_slice(&self, slice: &Slice) { self.deliver(slice.serialize().to_vec(), SCRIPTED_PEER); }
}

impl ScriptedTransport {
    /// Create a transport bound to [`SCRIPTED_LOCAL`] and its script handle.
    pub fn new() -> (Self, Script) { Self::bound_to(SCRIPTED_LOCAL) }

    /// Create a transport reporting `local` as its address.
    pub fn bound_to(local: SocketAddr) -> (Self, Script) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Self {
            inbound: tokio::sync::Mutex::new(rx),
            sent: Mutex::new(Vec::new()),
            local,
        };
        (transport, Script { tx })
    }

    /// Datagrams sent so far, with their destinations.
    pub fn sent(&self) -> Vec<(Vec<u8>, SocketAddr)> {
        self.sent.lock().expect("sent log poisoned").clone()
    }
}

#[async_trait]
impl DatagramTransport for ScriptedTransport {
    async fn send_datagram(&self, datagram: &[u8], destination: SocketAddr) -> io::Result<()> {
        self.sent
            .lock()
            .expect("sent log poisoned")
            .push((datagram.to_vec(), destination));
        Ok(())
    }

    async fn receive_datagram(&self, buffer: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let next = self.inbound.lock().await.recv().await;
        let Some((datagram, source)) = next else {
            return std::future::pending().await;
        };
        let len = datagram.len().min(buffer.len());
        buffer[..len].copy_from_slice(&datagram[..len]);
        Ok((len, source))
    }

    fn local_addr(&self) -> io::Result<SocketAddr> { Ok(self.local) }
}

/// Build a slice carrying `payload` at `index` of `count`.
pub fn slice(id: TransactionId, index: u32, count: u32, payload: &[u8]) -> Slice {
    Slice::new(SliceHeader::new(id, index, count), payload.to_vec()).expect("valid slice")
}

/// Deterministic payload of `len` bytes.
pub fn patterned(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| u8::try_from(i % 251).expect("fits in u8"))
        .collect()
}

/// Bind a fragmenting socket to an ephemeral IPv4 loopback port.
pub async fn loopback() -> FragmentingSocket<UdpSocket> {
    FragmentingSocket::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind loopback socket")
}
