//! Turmoil-based port implementation.
//!
//! The same Ethernet-in-UDP cable as the production port, but over
//! turmoil's simulated network so runs are deterministic and support fault
//! injection (partitions, loss, latency).

use std::{
    io,
    net::{Ipv4Addr, SocketAddr},
};

use async_trait::async_trait;
use bytes::Bytes;
use mailbox_core::{PortId, SwitchConfig};
use mailbox_switch::{PortTransport, Switch, port::MAX_FRAME};
use turmoil::net::UdpSocket;

/// Simulated point-to-point cable end.
///
/// Both the switch and simulated hosts use this: a host's end of a cable is
/// just a port whose peer is the switch.
pub struct SimPort {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl SimPort {
    /// Bind `local_port` on the current simulated host, patched to `peer`.
    pub async fn bind(local_port: u16, peer: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, local_port))).await?;
        Ok(Self { socket, peer })
    }

    /// Bind `local_port`, patched to `peer_port` on simulated host `peer_host`.
    pub async fn connect(local_port: u16, peer_host: &str, peer_port: u16) -> io::Result<Self> {
        let peer = SocketAddr::new(turmoil::lookup(peer_host), peer_port);
        Self::bind(local_port, peer).await
    }
}

#[async_trait]
impl PortTransport for SimPort {
    async fn recv_frame(&self) -> io::Result<Bytes> {
        let mut buf = vec![0u8; MAX_FRAME];
        loop {
            let (len, from) = self.socket.recv_from(&mut buf).await?;
            if from == self.peer {
                buf.truncate(len);
                return Ok(Bytes::from(buf));
            }
        }
    }

    async fn send_frame(&self, frame: &[u8]) -> io::Result<()> {
        self.socket.send_to(frame, self.peer).await.map(|_| ())
    }
}

/// Switch side of one simulated cable
#[derive(Debug, Clone, Copy)]
pub struct SimCable {
    /// Switch port ID
    pub id: PortId,
    /// UDP port the switch binds for this cable
    pub local_port: u16,
    /// Simulated host at the other end
    pub peer_host: &'static str,
    /// UDP port the host binds
    pub peer_port: u16,
}

/// Run a switch on the current simulated host until its ports fail.
pub async fn run_sim_switch(
    config: SwitchConfig,
    cables: &[SimCable],
) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = config.build_pipeline()?;

    let mut ports = Vec::with_capacity(cables.len());
    for cable in cables {
        let port = SimPort::connect(cable.local_port, cable.peer_host, cable.peer_port).await?;
        ports.push((cable.id, port));
    }

    tracing::debug!(ports = ports.len(), "simulated switch starting");
    Switch::new(pipeline, ports)?.run().await?;
    Ok(())
}
