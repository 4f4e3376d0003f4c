//! Raw datagram transport abstraction.
//!
//! [`DatagramTransport`] is the only contract [`FragmentingSocket`] needs from
//! the network: send one datagram, receive one datagram, report the local
//! address. It is implemented for [`tokio::net::UdpSocket`] and can be
//! implemented by in-memory fakes for tests.
//!
//! [`FragmentingSocket`]: super::FragmentingSocket

use std::{io, net::SocketAddr};

use async_trait::async_trait;
use tokio::net::UdpSocket;

/// Unreliable, message-oriented socket carrying whole datagrams.
///
/// Datagrams may be lost, duplicated or reordered; implementations need not
/// do anything about it. `send_datagram` may be called concurrently with
/// `receive_datagram`.
#[async_trait]
pub trait DatagramTransport: Send + Sync {
    /// Send `datagram` to `destination` as a single datagram.
    async fn send_datagram(&self, datagram: &[u8], destination: SocketAddr) -> io::Result<()>;

    /// Wait for the next datagram, writing it into `buffer`.
    ///
    /// Returns the number of bytes written and the sender's address.
    /// Datagrams longer than `buffer` are truncated.
    async fn receive_datagram(&self, buffer: &mut [u8]) -> io::Result<(usize, SocketAddr)>;

    /// Address this transport is bound to.
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

#[async_trait]
impl DatagramTransport for UdpSocket {
    async fn send_datagram(&self, datagram: &[u8], destination: SocketAddr) -> io::Result<()> {
        let sent = self.send_to(datagram, destination).await?;
        if sent != datagram.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("sent {sent} of {} datagram bytes", datagram.len()),
            ));
        }
        Ok(())
    }

    async fn receive_datagram(&self, buffer: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.recv_from(buffer).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> { UdpSocket::local_addr(self) }
}
