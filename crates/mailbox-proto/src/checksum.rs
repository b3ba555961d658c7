//! RFC 1071 Internet checksums.
//!
//! Used by [`crate::FrameBuilder`] to emit valid frames and by the response
//! path when a UDP checksum has to be recomputed after the SMP header is
//! rewritten.

use std::net::Ipv4Addr;

use crate::{Ipv4Header, UdpHeader};

/// Add `data` as big-endian 16-bit words to a running 32-bit sum. An odd
/// trailing byte is padded with zero.
pub fn accumulate(mut sum: u32, data: &[u8]) -> u32 {
    let mut words = data.chunks_exact(2);
    for word in &mut words {
        sum += u32::from(u16::from_be_bytes([word[0], word[1]]));
    }
    if let [last] = words.remainder() {
        sum += u32::from(u16::from_be_bytes([*last, 0]));
    }
    sum
}

/// Fold carries back into 16 bits and take the ones' complement.
pub fn finish(mut sum: u32) -> u16 {
    while sum > 0xFFFF {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

/// Checksum of an IPv4 header (options included), treating the checksum
/// field as zero.
pub fn ipv4_header(header: &[u8]) -> u16 {
    let sum = accumulate(0, &header[..10]);
    finish(accumulate(sum, &header[12..]))
}

/// Checksum of a transport segment over the IPv4 pseudo-header, treating the
/// two bytes at `checksum_at` as zero.
pub fn pseudo_header(
    src: Ipv4Addr,
    dst: Ipv4Addr,
    protocol: u8,
    segment: &[u8],
    checksum_at: usize,
) -> u16 {
    let mut sum = accumulate(0, &src.octets());
    sum = accumulate(sum, &dst.octets());
    sum += u32::from(protocol);
    sum += segment.len() as u32;
    sum = accumulate(sum, &segment[..checksum_at]);
    finish(accumulate(sum, &segment[checksum_at + 2..]))
}

/// UDP checksum of `datagram` (header and payload). A computed zero is
/// transmitted as `0xFFFF`, since zero means "no checksum".
///
/// `datagram` must end where the UDP length field says it does. Link-layer
/// padding after it is not part of the sum.
pub fn udp(src: Ipv4Addr, dst: Ipv4Addr, datagram: &[u8]) -> u16 {
    let at = UdpHeader::CHECKSUM_RANGE.start;
    match pseudo_header(src, dst, Ipv4Header::PROTOCOL_UDP, datagram, at) {
        0 => 0xFFFF,
        sum => sum,
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn ipv4_header_reference_vector() {
        let header = hex!("4500 0073 0000 4000 4011 b861 c0a8 0001 c0a8 00c7");
        assert_eq!(ipv4_header(&header), 0xb861);
    }

    #[test]
    fn valid_header_sums_to_zero() {
        let header = hex!("4500 0073 0000 4000 4011 b861 c0a8 0001 c0a8 00c7");
        assert_eq!(finish(accumulate(0, &header)), 0);
    }

    #[test]
    fn odd_length_is_zero_padded() {
        assert_eq!(accumulate(0, &[0x01]), 0x0100);
        assert_eq!(accumulate(0, &[0x01, 0x02, 0x03]), 0x0102 + 0x0300);
    }

    #[test]
    fn swapping_addresses_preserves_ipv4_checksum() {
        let header = hex!("4500 0030 0001 0000 4011 0000 0a000001 0a0000fe");
        let mut swapped = header;
        swapped[12..16].copy_from_slice(&header[16..20]);
        swapped[16..20].copy_from_slice(&header[12..16]);

        assert_eq!(ipv4_header(&header), ipv4_header(&swapped));
    }

    #[test]
    fn udp_checksum_verifies() {
        let src = Ipv4Addr::new(10, 0, 0, 1);
        let dst = Ipv4Addr::new(10, 0, 0, 254);
        let mut datagram = hex!("ffff ffff 000c 0000 deadbeef");
        let sum = udp(src, dst, &datagram);
        datagram[6..8].copy_from_slice(&sum.to_be_bytes());

        // Re-summing with the checksum in place yields all ones
        let mut total = accumulate(0, &src.octets());
        total = accumulate(total, &dst.octets());
        total += 17 + datagram.len() as u32;
        total = accumulate(total, &datagram);
        assert_eq!(finish(total), 0);
    }
}
