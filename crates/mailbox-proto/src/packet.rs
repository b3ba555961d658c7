//! Zero-copy views over the Ethernet II, IPv4 and UDP layers.
//!
//! Each layer is a `#[repr(C, packed)]` struct of byte arrays cast in place
//! from the received frame. [`Ipv4Packet::parse`] walks the layers in order
//! and fails fast on the first one that does not fit.

use std::net::Ipv4Addr;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::errors::{ProtocolError, Result};

/// 48-bit link-layer address
pub type MacAddr = [u8; 6];

/// Ethernet II header (14 bytes)
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct EthernetHeader {
    dst: [u8; 6],
    src: [u8; 6],
    ether_type: [u8; 2],
}

impl EthernetHeader {
    /// Size of the header
    pub const SIZE: usize = 14;

    /// EtherType for IPv4
    pub const ETHERTYPE_IPV4: u16 = 0x0800;

    /// Byte range of the destination MAC within a frame
    pub const DST_RANGE: std::ops::Range<usize> = 0..6;

    /// Byte range of the source MAC within a frame
    pub const SRC_RANGE: std::ops::Range<usize> = 6..12;

    /// Parse from the start of a frame.
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        Self::ref_from_prefix(bytes).map(|(header, _)| header).map_err(|_| {
            ProtocolError::TooShort {
                layer: "Ethernet header",
                expected: Self::SIZE,
                actual: bytes.len(),
            }
        })
    }

    /// Destination MAC
    pub fn dst(&self) -> MacAddr {
        self.dst
    }

    /// Source MAC
    pub fn src(&self) -> MacAddr {
        self.src
    }

    /// EtherType
    pub fn ether_type(&self) -> u16 {
        u16::from_be_bytes(self.ether_type)
    }
}

/// Fixed part of an IPv4 header (20 bytes). Options, if any, follow it and
/// are skipped using the IHL field.
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct Ipv4Header {
    version_ihl: u8,
    _dscp_ecn: u8,
    total_length: [u8; 2],
    _identification: [u8; 2],
    _flags_fragment: [u8; 2],
    _ttl: u8,
    protocol: u8,
    checksum: [u8; 2],
    src: [u8; 4],
    dst: [u8; 4],
}

impl Ipv4Header {
    /// Size of the fixed header
    pub const MIN_SIZE: usize = 20;

    /// IP protocol number for TCP
    pub const PROTOCOL_TCP: u8 = 6;

    /// IP protocol number for UDP
    pub const PROTOCOL_UDP: u8 = 17;

    /// Byte range of the source address relative to the IP header
    pub const SRC_RANGE: std::ops::Range<usize> = 12..16;

    /// Byte range of the destination address relative to the IP header
    pub const DST_RANGE: std::ops::Range<usize> = 16..20;

    /// Parse from the start of the IP header.
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        Self::ref_from_prefix(bytes).map(|(header, _)| header).map_err(|_| {
            ProtocolError::TooShort {
                layer: "IPv4 header",
                expected: Self::MIN_SIZE,
                actual: bytes.len(),
            }
        })
    }

    /// IP version nibble
    pub fn version(&self) -> u8 {
        self.version_ihl >> 4
    }

    /// Header length in 32-bit words
    pub fn ihl(&self) -> u8 {
        self.version_ihl & 0x0F
    }

    /// Header length in bytes, options included
    pub fn header_len(&self) -> usize {
        usize::from(self.ihl()) * 4
    }

    /// Total length field
    pub fn total_length(&self) -> u16 {
        u16::from_be_bytes(self.total_length)
    }

    /// Transport protocol number
    pub fn protocol(&self) -> u8 {
        self.protocol
    }

    /// Header checksum as carried on the wire
    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes(self.checksum)
    }

    /// Source address
    pub fn src(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.src)
    }

    /// Destination address
    pub fn dst(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.dst)
    }
}

/// UDP header (8 bytes)
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct UdpHeader {
    src_port: [u8; 2],
    dst_port: [u8; 2],
    length: [u8; 2],
    checksum: [u8; 2],
}

impl UdpHeader {
    /// Size of the header
    pub const SIZE: usize = 8;

    /// Byte range of the checksum relative to the UDP header
    pub const CHECKSUM_RANGE: std::ops::Range<usize> = 6..8;

    /// Parse from the start of the UDP header.
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        Self::ref_from_prefix(bytes).map(|(header, _)| header).map_err(|_| {
            ProtocolError::TooShort {
                layer: "UDP header",
                expected: Self::SIZE,
                actual: bytes.len(),
            }
        })
    }

    /// Source port
    pub fn src_port(&self) -> u16 {
        u16::from_be_bytes(self.src_port)
    }

    /// Destination port
    pub fn dst_port(&self) -> u16 {
        u16::from_be_bytes(self.dst_port)
    }

    /// Length field (header plus payload)
    pub fn length(&self) -> u16 {
        u16::from_be_bytes(self.length)
    }

    /// Checksum as carried on the wire (zero means "not computed")
    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes(self.checksum)
    }
}

/// An Ethernet frame carrying IPv4, parsed down to the network layer.
#[derive(Clone, Copy)]
pub struct Ipv4Packet<'a> {
    frame: &'a [u8],
    ethernet: &'a EthernetHeader,
    ip: &'a Ipv4Header,
}

impl<'a> Ipv4Packet<'a> {
    /// Offset of the IP header within the frame
    pub const IP_OFFSET: usize = EthernetHeader::SIZE;

    /// Parse the link and network layers of a frame.
    ///
    /// # Errors
    ///
    /// - `TooShort` if the frame ends inside either header (options included)
    /// - `UnsupportedEtherType` for anything but IPv4
    /// - `UnsupportedIpVersion` / `InvalidHeaderLength` for a bad first byte
    pub fn parse(frame: &'a [u8]) -> Result<Self> {
        let ethernet = EthernetHeader::from_bytes(frame)?;
        if ethernet.ether_type() != EthernetHeader::ETHERTYPE_IPV4 {
            return Err(ProtocolError::UnsupportedEtherType(ethernet.ether_type()));
        }

        let ip = Ipv4Header::from_bytes(&frame[Self::IP_OFFSET..])?;
        if ip.version() != 4 {
            return Err(ProtocolError::UnsupportedIpVersion(ip.version()));
        }
        if ip.header_len() < Ipv4Header::MIN_SIZE {
            return Err(ProtocolError::InvalidHeaderLength(ip.ihl()));
        }

        let needed = Self::IP_OFFSET + ip.header_len();
        if frame.len() < needed {
            return Err(ProtocolError::TooShort {
                layer: "IPv4 options",
                expected: needed,
                actual: frame.len(),
            });
        }

        Ok(Self { frame, ethernet, ip })
    }

    /// The whole frame
    pub fn frame(&self) -> &'a [u8] {
        self.frame
    }

    /// Link-layer header
    pub fn ethernet(&self) -> &'a EthernetHeader {
        self.ethernet
    }

    /// Network-layer header
    pub fn ip(&self) -> &'a Ipv4Header {
        self.ip
    }

    /// Offset of the transport header within the frame
    pub fn transport_offset(&self) -> usize {
        Self::IP_OFFSET + self.ip.header_len()
    }

    /// Parse the transport layer as UDP.
    ///
    /// The payload is everything after the UDP header; the UDP length field
    /// is not used to trim it.
    pub fn udp(&self) -> Result<UdpDatagram<'a>> {
        if self.ip.protocol() != Ipv4Header::PROTOCOL_UDP {
            return Err(ProtocolError::NotUdp(self.ip.protocol()));
        }

        let offset = self.transport_offset();
        let header = UdpHeader::from_bytes(&self.frame[offset..])?;
        let payload = &self.frame[offset + UdpHeader::SIZE..];

        Ok(UdpDatagram { header, offset, payload })
    }
}

/// A UDP datagram located inside a frame.
#[derive(Clone, Copy)]
pub struct UdpDatagram<'a> {
    header: &'a UdpHeader,
    offset: usize,
    payload: &'a [u8],
}

impl<'a> UdpDatagram<'a> {
    /// UDP header
    pub fn header(&self) -> &'a UdpHeader {
        self.header
    }

    /// Offset of the UDP header within the frame
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Offset of the first payload byte within the frame
    pub fn payload_offset(&self) -> usize {
        self.offset + UdpHeader::SIZE
    }

    /// Bytes following the UDP header
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Datagram length (header included) as declared by the UDP length
    /// field, clamped to the bytes present in the frame. Link-layer padding
    /// past the declared length is excluded.
    pub fn datagram_len(&self) -> usize {
        let available = UdpHeader::SIZE + self.payload.len();
        usize::from(self.header.length()).clamp(UdpHeader::SIZE, available)
    }
}
