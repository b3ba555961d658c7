//! Fuzz SMP header decoding.
//!
//! Every 20-byte prefix is a valid header; decoding must never panic and
//! re-encoding must reproduce the input bytes exactly.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mailbox_proto::{Opcode, SmpHeader};

fuzz_target!(|data: &[u8]| {
    let Ok(header) = SmpHeader::from_bytes(data) else {
        assert!(data.len() < SmpHeader::SIZE);
        return;
    };

    assert_eq!(&header.to_bytes()[..], &data[..SmpHeader::SIZE]);

    if let Some(opcode) = header.opcode_enum() {
        assert_eq!(opcode.to_u16(), header.opcode());
        assert_eq!(Opcode::from_u16(opcode.to_u16()), Some(opcode));
    }
});
