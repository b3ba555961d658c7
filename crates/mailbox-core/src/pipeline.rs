//! Per-frame processing pipeline.
//!
//! # Architecture: Action-Based
//!
//! [`Pipeline::process`] performs no I/O. It returns a [`PipelineAction`]
//! describing what the runtime should do with the frame:
//!
//! - `Emit`: transmit these bytes on this port
//! - `Drop`: discard, with the reason for logging
//!
//! The only side effect is a DropOff's write to the shared store, which
//! happens before the reply is routed: an unroutable reply still leaves the
//! message stored.

use std::sync::Arc;

use bytes::Bytes;

use crate::{
    dispatch::{Classification, Dispatcher},
    error::DropReason,
    forwarding::{Forwarding, ForwardingTable, PortId},
    machine::MailboxService,
    response::{UdpChecksumPolicy, build_response},
    store::MailboxStore,
};

/// What the runtime should do with a processed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineAction {
    /// Transmit `frame` on `port`
    Emit {
        /// Egress port
        port: PortId,
        /// Frame to transmit (the original for ordinary traffic, a reply for
        /// SMP)
        frame: Bytes,
    },

    /// Discard silently
    Drop {
        /// Why
        reason: DropReason,
    },
}

/// Dispatcher, state machine and forwarding lookup wired together.
///
/// `process` takes `&self`; share the pipeline across threads or tasks with
/// an `Arc`.
#[derive(Debug)]
pub struct Pipeline<F = ForwardingTable> {
    dispatcher: Dispatcher,
    service: MailboxService,
    forwarding: F,
    checksum_policy: UdpChecksumPolicy,
}

impl<F: Forwarding> Pipeline<F> {
    /// Assemble a pipeline from provisioned parts
    pub fn new(
        dispatcher: Dispatcher,
        service: MailboxService,
        forwarding: F,
        checksum_policy: UdpChecksumPolicy,
    ) -> Self {
        Self { dispatcher, service, forwarding, checksum_policy }
    }

    /// Shared store handle (for the admin channel)
    pub fn store(&self) -> &Arc<MailboxStore> {
        self.service.store()
    }

    /// Process one received frame.
    pub fn process(&self, frame: Bytes) -> PipelineAction {
        match self.route(&frame) {
            Ok((port, None)) => PipelineAction::Emit { port, frame },
            Ok((port, Some(reply))) => PipelineAction::Emit { port, frame: reply },
            Err(reason) => {
                tracing::debug!(%reason, len = frame.len(), "dropping frame");
                PipelineAction::Drop { reason }
            },
        }
    }

    /// Egress port and, for SMP, the reply to send instead of the frame.
    fn route(&self, frame: &[u8]) -> Result<(PortId, Option<Bytes>), DropReason> {
        match self.dispatcher.classify(frame)? {
            Classification::OrdinaryForward(packet) => {
                let port = self.lookup(packet.ip().dst())?;
                Ok((port, None))
            },
            Classification::SecretMailbox(request) => {
                let reply = self.service.handle(request.header)?;
                let port = self.lookup(request.packet.ip().src())?;
                Ok((port, Some(build_response(&request, &reply, self.checksum_policy))))
            },
        }
    }

    fn lookup(&self, dst: std::net::Ipv4Addr) -> Result<PortId, DropReason> {
        self.forwarding.forward(dst).ok_or(DropReason::UnroutableDestination(dst))
    }
}
