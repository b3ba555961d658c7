//! Frame construction for hosts and tests.
//!
//! The device itself never builds frames from scratch (responses are
//! rewritten copies of requests); this builder is what a sending host uses.

use std::net::Ipv4Addr;

use bytes::{BufMut, Bytes, BytesMut};

use crate::{EthernetHeader, Ipv4Header, MacAddr, SmpHeader, UdpHeader, checksum};

/// Builds Ethernet II / IPv4 frames between two endpoints.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    src_mac: MacAddr,
    dst_mac: MacAddr,
    src_ip: Ipv4Addr,
    dst_ip: Ipv4Addr,
    ttl: u8,
    identification: u16,
    udp_checksum: bool,
}

impl FrameBuilder {
    /// Minimal TCP header length emitted by [`FrameBuilder::tcp`]
    const TCP_HEADER_LEN: usize = 20;

    /// Frames from `src_ip` to `dst_ip` with zeroed MACs, TTL 64 and no UDP
    /// checksum.
    pub fn new(src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> Self {
        Self {
            src_mac: [0; 6],
            dst_mac: [0; 6],
            src_ip,
            dst_ip,
            ttl: 64,
            identification: 1,
            udp_checksum: false,
        }
    }

    /// Set source and destination MACs.
    #[must_use]
    pub fn macs(mut self, src: MacAddr, dst: MacAddr) -> Self {
        self.src_mac = src;
        self.dst_mac = dst;
        self
    }

    /// Set the IPv4 identification field.
    #[must_use]
    pub fn identification(mut self, identification: u16) -> Self {
        self.identification = identification;
        self
    }

    /// Compute a UDP checksum instead of sending zero.
    #[must_use]
    pub fn with_udp_checksum(mut self) -> Self {
        self.udp_checksum = true;
        self
    }

    /// UDP datagram carrying `payload`.
    pub fn udp(&self, src_port: u16, dst_port: u16, payload: &[u8]) -> Bytes {
        let mut segment = BytesMut::with_capacity(UdpHeader::SIZE + payload.len());
        segment.put_u16(src_port);
        segment.put_u16(dst_port);
        segment.put_u16((UdpHeader::SIZE + payload.len()) as u16);
        segment.put_u16(0);
        segment.put_slice(payload);

        if self.udp_checksum {
            let sum = checksum::udp(self.src_ip, self.dst_ip, &segment);
            segment[UdpHeader::CHECKSUM_RANGE].copy_from_slice(&sum.to_be_bytes());
        }

        self.ipv4(Ipv4Header::PROTOCOL_UDP, &segment)
    }

    /// UDP datagram carrying exactly one SMP header.
    pub fn smp(&self, src_port: u16, dst_port: u16, header: &SmpHeader) -> Bytes {
        self.udp(src_port, dst_port, &header.to_bytes())
    }

    /// Minimal TCP segment (SYN, no options) carrying `payload`.
    pub fn tcp(&self, src_port: u16, dst_port: u16, payload: &[u8]) -> Bytes {
        let mut segment = BytesMut::with_capacity(Self::TCP_HEADER_LEN + payload.len());
        segment.put_u16(src_port);
        segment.put_u16(dst_port);
        segment.put_u32(0); // sequence
        segment.put_u32(0); // ack
        segment.put_u8(0x50); // data offset 5
        segment.put_u8(0x02); // SYN
        segment.put_u16(8192); // window
        segment.put_u16(0); // checksum
        segment.put_u16(0); // urgent
        segment.put_slice(payload);

        let sum = checksum::pseudo_header(
            self.src_ip,
            self.dst_ip,
            Ipv4Header::PROTOCOL_TCP,
            &segment,
            16,
        );
        segment[16..18].copy_from_slice(&sum.to_be_bytes());

        self.ipv4(Ipv4Header::PROTOCOL_TCP, &segment)
    }

    fn ipv4(&self, protocol: u8, segment: &[u8]) -> Bytes {
        let total = EthernetHeader::SIZE + Ipv4Header::MIN_SIZE + segment.len();
        let mut frame = BytesMut::with_capacity(total);

        frame.put_slice(&self.dst_mac);
        frame.put_slice(&self.src_mac);
        frame.put_u16(EthernetHeader::ETHERTYPE_IPV4);

        let ip_start = frame.len();
        frame.put_u8(0x45);
        frame.put_u8(0);
        frame.put_u16((Ipv4Header::MIN_SIZE + segment.len()) as u16);
        frame.put_u16(self.identification);
        frame.put_u16(0);
        frame.put_u8(self.ttl);
        frame.put_u8(protocol);
        frame.put_u16(0);
        frame.put_slice(&self.src_ip.octets());
        frame.put_slice(&self.dst_ip.octets());

        let sum = checksum::ipv4_header(&frame[ip_start..]);
        frame[ip_start + 10..ip_start + 12].copy_from_slice(&sum.to_be_bytes());

        frame.put_slice(segment);
        frame.freeze()
    }
}
