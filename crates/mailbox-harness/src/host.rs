//! Simulated SMP host.

use std::net::Ipv4Addr;

use bytes::Bytes;
use mailbox_core::{ProofMix, ServiceEndpoint, compute_proof, password_hash};
use mailbox_proto::{FrameBuilder, Ipv4Packet, MacAddr, Opcode, ProtocolError, SmpHeader};

/// A provisioned host that can talk to the mailbox service.
#[derive(Debug, Clone)]
pub struct SimHost {
    id: u32,
    ip: Ipv4Addr,
    mac: MacAddr,
    gateway_mac: MacAddr,
    stored_hash: u32,
    mix: ProofMix,
    service: ServiceEndpoint,
}

impl SimHost {
    /// Host MAC used by the reference testbed
    pub const MAC: MacAddr = [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff];

    /// Switch-facing MAC used by the reference testbed
    pub const GATEWAY_MAC: MacAddr = [0xff, 0xee, 0xdd, 0xcc, 0xbb, 0xaa];

    /// Host `id` at `ip` holding `stored_hash`.
    pub fn new(id: u32, ip: Ipv4Addr, stored_hash: u32) -> Self {
        Self {
            id,
            ip,
            mac: Self::MAC,
            gateway_mac: Self::GATEWAY_MAC,
            stored_hash,
            mix: ProofMix::default(),
            service: ServiceEndpoint::default(),
        }
    }

    /// Same host, but deriving its proofs from `password`.
    #[must_use]
    pub fn with_password(mut self, password: &str) -> Self {
        self.stored_hash = password_hash(password.as_bytes());
        self
    }

    /// Same host, but combining salt and hash with `mix`.
    #[must_use]
    pub fn with_mix(mut self, mix: ProofMix) -> Self {
        self.mix = mix;
        self
    }

    /// Same host, but addressing a different service endpoint.
    #[must_use]
    pub fn with_service(mut self, service: ServiceEndpoint) -> Self {
        self.service = service;
        self
    }

    /// Host ID
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Host address
    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    /// Hash this host believes is its password
    pub fn stored_hash(&self) -> u32 {
        self.stored_hash
    }

    /// Authenticated request header.
    pub fn request(&self, opcode: u16, mailbox: u16, message: u32, salt: u32) -> SmpHeader {
        let mut header = SmpHeader::new(Opcode::Empty);
        header.set_host_id(self.id);
        header.set_salt(salt);
        header.set_password_proof(compute_proof(salt, self.stored_hash, self.mix));
        header.set_opcode(opcode);
        header.set_mailbox_num(mailbox);
        header.set_message(message);
        header
    }

    /// Wrap `header` in a frame addressed to the service.
    pub fn frame(&self, header: &SmpHeader) -> Bytes {
        self.builder().smp(self.service.src_port, self.service.dst_port, header)
    }

    /// Frame builder with this host's addressing towards `dst`.
    pub fn builder_to(&self, dst: Ipv4Addr) -> FrameBuilder {
        FrameBuilder::new(self.ip, dst).macs(self.mac, self.gateway_mac)
    }

    fn builder(&self) -> FrameBuilder {
        self.builder_to(self.service.ip)
    }

    /// `DropOff(mailbox, message)` frame.
    pub fn drop_off(&self, mailbox: u16, message: u32, salt: u32) -> Bytes {
        self.frame(&self.request(Opcode::DropOff.to_u16(), mailbox, message, salt))
    }

    /// `PickUp(mailbox)` frame.
    pub fn pick_up(&self, mailbox: u16, salt: u32) -> Bytes {
        self.frame(&self.request(Opcode::PickUp.to_u16(), mailbox, 0, salt))
    }
}

/// Decoded reply frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    /// Ethernet source
    pub src_mac: MacAddr,
    /// Ethernet destination
    pub dst_mac: MacAddr,
    /// IPv4 source
    pub src_ip: Ipv4Addr,
    /// IPv4 destination
    pub dst_ip: Ipv4Addr,
    /// UDP source port
    pub src_port: u16,
    /// UDP destination port
    pub dst_port: u16,
    /// SMP header
    pub header: SmpHeader,
}

impl Reply {
    /// Decode an SMP frame.
    pub fn parse(frame: &[u8]) -> Result<Self, ProtocolError> {
        let packet = Ipv4Packet::parse(frame)?;
        let udp = packet.udp()?;
        let header = *SmpHeader::from_bytes(udp.payload())?;

        Ok(Self {
            src_mac: packet.ethernet().src(),
            dst_mac: packet.ethernet().dst(),
            src_ip: packet.ip().src(),
            dst_ip: packet.ip().dst(),
            src_port: udp.header().src_port(),
            dst_port: udp.header().dst_port(),
            header,
        })
    }

    /// Response opcode
    pub fn opcode(&self) -> Option<Opcode> {
        self.header.opcode_enum()
    }

    /// Response message
    pub fn message(&self) -> u32 {
        self.header.message()
    }
}
