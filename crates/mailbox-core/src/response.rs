//! Response builder.
//!
//! A reply is a copy of the request frame with every addressing layer
//! swapped and the SMP header replaced. Everything else (IP identification,
//! TTL, UDP ports, trailing payload bytes) is carried over unchanged.
//!
//! The IPv4 header checksum needs no update: swapping the two address words
//! does not change a ones'-complement sum.

use bytes::{Bytes, BytesMut};
use mailbox_proto::{EthernetHeader, Ipv4Header, Ipv4Packet, SmpHeader, UdpHeader, checksum};
use serde::{Deserialize, Serialize};

use crate::dispatch::SmpRequest;

/// What to do with the UDP checksum after rewriting the SMP header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UdpChecksumPolicy {
    /// Copy the request's value
    #[default]
    Preserve,
    /// Compute over the pseudo-header and rewritten datagram
    Recompute,
    /// Send zero (checksum disabled)
    Clear,
}

/// Build the reply frame for `request` carrying `reply`.
pub fn build_response(
    request: &SmpRequest<'_>,
    reply: &SmpHeader,
    policy: UdpChecksumPolicy,
) -> Bytes {
    let frame = request.packet.frame();
    let mut out = BytesMut::from(frame);

    out[EthernetHeader::DST_RANGE].copy_from_slice(&frame[EthernetHeader::SRC_RANGE]);
    out[EthernetHeader::SRC_RANGE].copy_from_slice(&frame[EthernetHeader::DST_RANGE]);

    let ip = Ipv4Packet::IP_OFFSET;
    let (src, dst) = (ip + Ipv4Header::SRC_RANGE.start, ip + Ipv4Header::DST_RANGE.start);
    out[src..src + 4].copy_from_slice(&frame[dst..dst + 4]);
    out[dst..dst + 4].copy_from_slice(&frame[src..src + 4]);

    let smp = request.udp.payload_offset();
    out[smp..smp + SmpHeader::SIZE].copy_from_slice(&reply.to_bytes());

    let checksum_at = request.udp.offset() + UdpHeader::CHECKSUM_RANGE.start;
    match policy {
        UdpChecksumPolicy::Preserve => {},
        UdpChecksumPolicy::Clear => out[checksum_at..checksum_at + 2].fill(0),
        UdpChecksumPolicy::Recompute => {
            let ip_header = request.packet.ip();
            let start = request.udp.offset();
            let datagram = &out[start..start + request.udp.datagram_len()];
            let sum = checksum::udp(ip_header.dst(), ip_header.src(), datagram);
            out[checksum_at..checksum_at + 2].copy_from_slice(&sum.to_be_bytes());
        },
    }

    out.freeze()
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use hex_literal::hex;
    use mailbox_proto::{FrameBuilder, Opcode};

    use super::*;
    use crate::dispatch::{Classification, Dispatcher};

    const SRC_MAC: [u8; 6] = hex!("aabbccddeeff");
    const DST_MAC: [u8; 6] = hex!("ffeeddccbbaa");
    const HOST: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);
    const SERVICE: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 254);

    fn request_header() -> SmpHeader {
        let mut header = SmpHeader::new(Opcode::DropOff);
        header.set_host_id(1);
        header.set_salt(0x1234_5678);
        header.set_password_proof(0x2c2f_db6a);
        header.set_mailbox_num(2);
        header.set_message(0xdead_beef);
        header
    }

    fn respond(frame: &[u8], policy: UdpChecksumPolicy) -> (Bytes, SmpHeader) {
        let classified = Dispatcher::default().classify(frame);
        let Ok(Classification::SecretMailbox(request)) = classified else {
            panic!("expected SMP classification");
        };
        let mut reply = *request.header;
        reply.set_opcode(Opcode::Ack.to_u16());
        (build_response(&request, &reply, policy), reply)
    }

    #[test]
    fn addressing_is_swapped() {
        let frame = FrameBuilder::new(HOST, SERVICE)
            .macs(SRC_MAC, DST_MAC)
            .smp(0xFFFF, 0xFFFF, &request_header());
        let (out, reply) = respond(&frame, UdpChecksumPolicy::Preserve);

        let packet = Ipv4Packet::parse(&out).unwrap();
        assert_eq!(packet.ethernet().src(), DST_MAC);
        assert_eq!(packet.ethernet().dst(), SRC_MAC);
        assert_eq!(packet.ip().src(), SERVICE);
        assert_eq!(packet.ip().dst(), HOST);

        let udp = packet.udp().unwrap();
        assert_eq!(udp.header().src_port(), 0xFFFF);
        assert_eq!(udp.header().dst_port(), 0xFFFF);
        assert_eq!(SmpHeader::from_bytes(udp.payload()).unwrap(), &reply);
        assert_eq!(out[..12], hex!("aabbccddeeff ffeeddccbbaa"));
        assert_eq!(out[26..34], hex!("0a0000fe 0a000001"));
    }

    #[test]
    fn ipv4_checksum_stays_valid() {
        let frame = FrameBuilder::new(HOST, SERVICE).smp(0xFFFF, 0xFFFF, &request_header());
        let (out, _) = respond(&frame, UdpChecksumPolicy::Preserve);

        let before = Ipv4Packet::parse(&frame).unwrap().ip().checksum();
        assert_eq!(Ipv4Packet::parse(&out).unwrap().ip().checksum(), before);
        assert_eq!(checksum::finish(checksum::accumulate(0, &out[14..34])), 0);
    }

    #[test]
    fn only_smp_and_addresses_change() {
        let frame = FrameBuilder::new(HOST, SERVICE)
            .macs(SRC_MAC, DST_MAC)
            .identification(0x4242)
            .udp(0xFFFF, 0xFFFF, &[request_header().to_bytes().as_slice(), b"tail"].concat());
        let (out, _) = respond(&frame, UdpChecksumPolicy::Preserve);

        assert_eq!(out.len(), frame.len());
        assert_eq!(out[12..26], frame[12..26]);
        assert_eq!(out[34..42], frame[34..42]);
        assert_eq!(&out[62..], b"tail");
    }

    #[test]
    fn checksum_policies() {
        let frame = FrameBuilder::new(HOST, SERVICE)
            .with_udp_checksum()
            .smp(0xFFFF, 0xFFFF, &request_header());
        let original = u16::from_be_bytes([frame[40], frame[41]]);
        assert_ne!(original, 0);

        let (preserved, _) = respond(&frame, UdpChecksumPolicy::Preserve);
        assert_eq!(u16::from_be_bytes([preserved[40], preserved[41]]), original);

        let (cleared, _) = respond(&frame, UdpChecksumPolicy::Clear);
        assert_eq!(u16::from_be_bytes([cleared[40], cleared[41]]), 0);

        let (recomputed, _) = respond(&frame, UdpChecksumPolicy::Recompute);
        assert!(udp_checksum_verifies(&recomputed, 28));
    }

    #[test]
    fn recompute_ignores_link_padding() {
        let mut frame = FrameBuilder::new(HOST, SERVICE)
            .with_udp_checksum()
            .smp(0xFFFF, 0xFFFF, &request_header())
            .to_vec();
        frame.extend_from_slice(&hex!("aaaaaa"));

        let (recomputed, _) = respond(&frame, UdpChecksumPolicy::Recompute);
        assert_eq!(recomputed.len(), frame.len());
        assert_eq!(recomputed[62..], hex!("aaaaaa"));
        assert!(udp_checksum_verifies(&recomputed, 28));
    }

    fn udp_checksum_verifies(frame: &[u8], udp_len: u16) -> bool {
        let mut sum = checksum::accumulate(0, &frame[26..34]);
        sum += 17 + u32::from(udp_len);
        sum = checksum::accumulate(sum, &frame[34..34 + usize::from(udp_len)]);
        checksum::finish(sum) == 0
    }
}
