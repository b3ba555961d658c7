//! Dispatcher: decides whether a frame is an SMP request or ordinary traffic.
//!
//! A frame is SMP only if all of these hold:
//!
//! 1. IPv4 destination is the service address
//! 2. Transport is UDP on exactly the reserved source and destination ports
//! 3. The UDP payload holds at least a full 20-byte SMP header
//!
//! Anything else, including a near miss on any one rule, is ordinary traffic
//! and is forwarded by destination like every other packet.

use std::net::Ipv4Addr;

use mailbox_proto::{Ipv4Packet, ProtocolError, SmpHeader, UdpDatagram};

/// Address and port pair the mailbox service answers on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceEndpoint {
    /// Designated service IP
    pub ip: Ipv4Addr,
    /// Required UDP source port
    pub src_port: u16,
    /// Required UDP destination port
    pub dst_port: u16,
}

impl ServiceEndpoint {
    /// Reserved SMP port, used for both source and destination
    pub const RESERVED_PORT: u16 = 0xFFFF;

    /// Default service address
    pub const DEFAULT_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 254);
}

impl Default for ServiceEndpoint {
    fn default() -> Self {
        Self { ip: Self::DEFAULT_IP, src_port: Self::RESERVED_PORT, dst_port: Self::RESERVED_PORT }
    }
}

/// A frame classified as an SMP request, with every layer located.
#[derive(Clone, Copy)]
pub struct SmpRequest<'a> {
    /// Link and network layers
    pub packet: Ipv4Packet<'a>,
    /// Transport layer
    pub udp: UdpDatagram<'a>,
    /// Request header (points into the frame)
    pub header: &'a SmpHeader,
}

/// Dispatcher verdict
#[derive(Clone, Copy)]
pub enum Classification<'a> {
    /// Route by destination, unchanged
    OrdinaryForward(Ipv4Packet<'a>),
    /// Hand to the state machine
    SecretMailbox(SmpRequest<'a>),
}

/// Frame classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct Dispatcher {
    endpoint: ServiceEndpoint,
}

impl Dispatcher {
    /// Create a dispatcher for `endpoint`
    pub fn new(endpoint: ServiceEndpoint) -> Self {
        Self { endpoint }
    }

    /// Service endpoint in use
    pub fn endpoint(&self) -> ServiceEndpoint {
        self.endpoint
    }

    /// Classify a frame.
    ///
    /// # Errors
    ///
    /// Only if the frame is not a routable IPv4 frame at all; SMP-level
    /// problems downgrade to `OrdinaryForward` instead.
    pub fn classify<'a>(&self, frame: &'a [u8]) -> Result<Classification<'a>, ProtocolError> {
        let packet = Ipv4Packet::parse(frame)?;
        Ok(self
            .smp_request(packet)
            .map_or(Classification::OrdinaryForward(packet), Classification::SecretMailbox))
    }

    fn smp_request<'a>(&self, packet: Ipv4Packet<'a>) -> Option<SmpRequest<'a>> {
        if packet.ip().dst() != self.endpoint.ip {
            return None;
        }

        let udp = packet.udp().ok()?;
        if udp.header().src_port() != self.endpoint.src_port
            || udp.header().dst_port() != self.endpoint.dst_port
        {
            return None;
        }

        let header = SmpHeader::from_bytes(udp.payload()).ok()?;
        Some(SmpRequest { packet, udp, header })
    }
}
