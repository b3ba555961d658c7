//! Wire formats for the Secret Mailbox Protocol (SMP).
//!
//! SMP requests ride as UDP payloads inside ordinary Ethernet II / IPv4
//! frames. The data path never copies a frame to inspect it: every layer is a
//! fixed-layout, big-endian struct cast directly from the received bytes with
//! `zerocopy`, so classification touches at most the first 62 bytes of a
//! frame.
//!
//! ```text
//! ┌──────────────┬──────────────┬────────────┬──────────────────┐
//! │ Ethernet (14)│ IPv4 (20+)   │ UDP (8)    │ SMP header (20)  │
//! └──────────────┴──────────────┴────────────┴──────────────────┘
//! ```
//!
//! # Security
//!
//! All parsing uses compile-time verified layouts. Every layout accepts all
//! bit patterns, so casting attacker-controlled bytes cannot fail except on
//! length, and length is always checked before a field is read.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod checksum;
pub mod errors;
pub mod header;
pub mod opcodes;
pub mod packet;

pub use builder::FrameBuilder;
pub use errors::{ProtocolError, Result};
pub use header::SmpHeader;
pub use opcodes::Opcode;
pub use packet::{EthernetHeader, Ipv4Header, Ipv4Packet, MacAddr, UdpDatagram, UdpHeader};
