//! Reasons a frame is dropped without a response.
//!
//! Authentication failures are deliberately absent: they are answered with an
//! `AuthFail` response (see [`crate::AuthOutcome`]). Every variant here is
//! indistinguishable from packet loss to the sender.

use std::net::Ipv4Addr;

use mailbox_proto::ProtocolError;
use thiserror::Error;

use crate::store::StoreError;

/// Why the pipeline discarded a frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Frame is not an Ethernet II / IPv4 frame the device can route
    #[error("malformed packet: {0}")]
    MalformedPacket(#[from] ProtocolError),

    /// No forwarding entry for the destination
    #[error("no forwarding entry for {0}")]
    UnroutableDestination(Ipv4Addr),

    /// Mailbox number beyond the provisioned slot count
    #[error("mailbox {mailbox} out of range (capacity {capacity})")]
    OutOfRange {
        /// Requested slot
        mailbox: u16,
        /// Provisioned slot count
        capacity: usize,
    },

    /// SMP opcode that is not a request
    #[error("unsupported opcode {0:#06x}")]
    UnsupportedOpcode(u16),
}

impl From<StoreError> for DropReason {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::OutOfRange { mailbox, capacity } => Self::OutOfRange { mailbox, capacity },
        }
    }
}
