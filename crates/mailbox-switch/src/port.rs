//! Port abstraction.
//!
//! A port moves whole Ethernet frames. The switch never looks below this
//! trait, so production (UDP encapsulation) and simulation (turmoil) share
//! the same forwarding loop.

use std::{io, net::SocketAddr};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::net::UdpSocket;

/// Largest frame a port will accept (jumbo frame plus slack).
pub const MAX_FRAME: usize = 9216;

/// One switch port.
#[async_trait]
pub trait PortTransport: Send + Sync + 'static {
    /// Wait for the next inbound frame.
    ///
    /// An error ends the receive loop for this port.
    async fn recv_frame(&self) -> io::Result<Bytes>;

    /// Transmit a frame out of this port.
    async fn send_frame(&self, frame: &[u8]) -> io::Result<()>;
}

/// Ethernet-in-UDP port: every datagram exchanged with `peer` is one frame.
///
/// Datagrams from any other source are ignored, which keeps a port behaving
/// like a point-to-point cable.
#[derive(Debug)]
pub struct UdpPort {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl UdpPort {
    /// Bind `local` and patch it to `peer`.
    pub async fn bind(local: SocketAddr, peer: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(local).await?;
        Ok(Self { socket, peer })
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

#[async_trait]
impl PortTransport for UdpPort {
    async fn recv_frame(&self) -> io::Result<Bytes> {
        let mut buf = vec![0u8; MAX_FRAME];
        loop {
            let (len, from) = self.socket.recv_from(&mut buf).await?;
            if from == self.peer {
                buf.truncate(len);
                return Ok(Bytes::from(buf));
            }
            tracing::debug!(%from, peer = %self.peer, "ignoring datagram from foreign source");
        }
    }

    async fn send_frame(&self, frame: &[u8]) -> io::Result<()> {
        self.socket.send_to(frame, self.peer).await.map(|_| ())
    }
}
