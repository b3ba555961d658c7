//! Protocol state machine.
//!
//! SMP has no sessions: every request is resolved in one pass. The decision
//! itself is the pure [`transition`] table; [`MailboxService`] wires it to the
//! authenticator and the store.
//!
//! | Request | Auth  | Slot     | Response opcode | Response message | Effect         |
//! |---------|-------|----------|-----------------|------------------|----------------|
//! | DropOff | ok    | any      | `Ack`           | echo             | write slot     |
//! | PickUp  | ok    | occupied | `Ack`           | stored           | none           |
//! | PickUp  | ok    | empty    | `Empty`         | 0                | none           |
//! | any     | fail  | any      | `AuthFail`      | echo             | none           |
//!
//! Unknown opcodes and out-of-range mailboxes never reach the table; the
//! request is dropped before authentication.

use std::sync::Arc;

use mailbox_proto::{Opcode, SmpHeader};

use crate::{
    auth::{AuthOutcome, Authenticator},
    error::DropReason,
    store::{MailboxStore, SlotState},
};

/// The two operations a host can request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Write a slot
    DropOff,
    /// Read a slot
    PickUp,
}

impl RequestKind {
    /// Classify a raw opcode; `None` for anything but DropOff/PickUp.
    pub fn from_opcode(opcode: u16) -> Option<Self> {
        match Opcode::from_u16(opcode)? {
            Opcode::DropOff => Some(Self::DropOff),
            Opcode::PickUp => Some(Self::PickUp),
            Opcode::Empty | Opcode::AuthFail | Opcode::Ack => None,
        }
    }
}

/// Response descriptor produced by the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Response opcode
    pub opcode: Opcode,
    /// Response message field
    pub message: u32,
    /// Slot write to perform, if any
    pub write: Option<u32>,
}

/// Resolve a request. Pure: the caller applies `write`.
pub fn transition(
    kind: RequestKind,
    auth: AuthOutcome,
    slot: SlotState,
    message: u32,
) -> Transition {
    match (kind, auth.is_authenticated(), slot.occupied) {
        (_, false, _) => Transition { opcode: Opcode::AuthFail, message, write: None },
        (RequestKind::DropOff, true, _) => {
            Transition { opcode: Opcode::Ack, message, write: Some(message) }
        },
        (RequestKind::PickUp, true, true) => {
            Transition { opcode: Opcode::Ack, message: slot.message, write: None }
        },
        (RequestKind::PickUp, true, false) => {
            Transition { opcode: Opcode::Empty, message: 0, write: None }
        },
    }
}

/// Authenticates requests and applies them to the shared store.
#[derive(Debug)]
pub struct MailboxService {
    auth: Authenticator,
    store: Arc<MailboxStore>,
}

impl MailboxService {
    /// Create a service over a provisioned authenticator and store
    pub fn new(auth: Authenticator, store: Arc<MailboxStore>) -> Self {
        Self { auth, store }
    }

    /// Shared store handle (for the admin channel)
    pub fn store(&self) -> &Arc<MailboxStore> {
        &self.store
    }

    /// Handle one request header and produce the response header.
    ///
    /// `host_id`, `salt`, `password_proof` and `mailbox_num` are copied from
    /// the request unchanged; only `opcode` and `message` are rewritten.
    ///
    /// # Errors
    ///
    /// - `UnsupportedOpcode` if the opcode is not DropOff/PickUp
    /// - `OutOfRange` if the mailbox does not exist
    pub fn handle(&self, request: &SmpHeader) -> Result<SmpHeader, DropReason> {
        let kind = RequestKind::from_opcode(request.opcode())
            .ok_or(DropReason::UnsupportedOpcode(request.opcode()))?;
        let mailbox = request.mailbox_num();

        // Doubles as the range check, and is the linearization point for PickUp
        let slot = self.store.read(mailbox)?;
        let auth = self.auth.verify(request.host_id(), request.salt(), request.password_proof());
        let step = transition(kind, auth, slot, request.message());

        if let Some(message) = step.write {
            self.store.write(mailbox, message)?;
        }

        if auth.is_authenticated() {
            tracing::debug!(
                host_id = request.host_id(),
                ?kind,
                mailbox,
                response = ?step.opcode,
                "mailbox request served"
            );
        } else {
            tracing::warn!(
                host_id = request.host_id(),
                ?kind,
                mailbox,
                outcome = ?auth,
                "authentication failed"
            );
        }

        let mut reply = *request;
        reply.set_opcode(step.opcode.to_u16());
        reply.set_message(step.message);
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::auth::{HostRecord, ProofMix, compute_proof};

    const HASH: u32 = 2_195_217_097;

    fn service() -> MailboxService {
        let mut auth = Authenticator::new(ProofMix::Xor);
        auth.insert(1, HostRecord { ip: Ipv4Addr::new(10, 0, 0, 1), port: 1, password_hash: HASH });
        MailboxService::new(auth, Arc::new(MailboxStore::new(8)))
    }

    fn request(opcode: u16, mailbox: u16, message: u32, proof_hash: u32) -> SmpHeader {
        let salt = 0x6530_a3c0;
        let mut header = SmpHeader::new(Opcode::DropOff);
        header.set_opcode(opcode);
        header.set_host_id(1);
        header.set_salt(salt);
        header.set_password_proof(compute_proof(salt, proof_hash, ProofMix::Xor));
        header.set_mailbox_num(mailbox);
        header.set_message(message);
        header
    }

    #[test]
    fn table_rows() {
        use AuthOutcome::{Authenticated, Unauthenticated, UnknownHost};
        use RequestKind::{DropOff, PickUp};

        let full = SlotState::occupied(9);
        let empty = SlotState::EMPTY;

        assert_eq!(
            transition(DropOff, Authenticated, empty, 5),
            Transition { opcode: Opcode::Ack, message: 5, write: Some(5) }
        );
        assert_eq!(
            transition(DropOff, Authenticated, full, 5),
            Transition { opcode: Opcode::Ack, message: 5, write: Some(5) }
        );
        assert_eq!(
            transition(PickUp, Authenticated, full, 5),
            Transition { opcode: Opcode::Ack, message: 9, write: None }
        );
        assert_eq!(
            transition(PickUp, Authenticated, empty, 5),
            Transition { opcode: Opcode::Empty, message: 0, write: None }
        );

        for kind in [DropOff, PickUp] {
            for auth in [Unauthenticated, UnknownHost] {
                for slot in [full, empty] {
                    assert_eq!(
                        transition(kind, auth, slot, 5),
                        Transition { opcode: Opcode::AuthFail, message: 5, write: None }
                    );
                }
            }
        }
    }

    #[test]
    fn response_opcodes_are_not_requests() {
        for opcode in [0x0000, 0x2333, 0xFFFF, 0x0003] {
            assert_eq!(RequestKind::from_opcode(opcode), None);
        }
    }

    #[test]
    fn dropoff_then_pickup() {
        let service = service();

        let reply = service.handle(&request(0x1, 2, 0xdead_beef, HASH)).unwrap();
        assert_eq!(reply.opcode_enum(), Some(Opcode::Ack));
        assert_eq!(reply.message(), 0xdead_beef);

        let reply = service.handle(&request(0x2, 2, 0, HASH)).unwrap();
        assert_eq!(reply.opcode_enum(), Some(Opcode::Ack));
        assert_eq!(reply.message(), 0xdead_beef);
    }

    #[test]
    fn reply_copies_identity_fields() {
        let service = service();
        let req = request(0x2, 3, 0x1234, HASH);
        let reply = service.handle(&req).unwrap();

        assert_eq!(reply.host_id(), req.host_id());
        assert_eq!(reply.salt(), req.salt());
        assert_eq!(reply.password_proof(), req.password_proof());
        assert_eq!(reply.mailbox_num(), req.mailbox_num());
        assert_eq!(reply.opcode_enum(), Some(Opcode::Empty));
        assert_eq!(reply.message(), 0);
    }

    #[test]
    fn failed_auth_leaves_store_untouched() {
        let service = service();
        service.store().write(4, 77).unwrap();

        let reply = service.handle(&request(0x1, 4, 0xdead_beef, 0xBAD)).unwrap();
        assert_eq!(reply.opcode_enum(), Some(Opcode::AuthFail));
        assert_eq!(reply.message(), 0xdead_beef);
        assert_eq!(service.store().read(4), Ok(SlotState::occupied(77)));
    }

    #[test]
    fn unknown_opcode_and_range_are_dropped() {
        let service = service();

        assert_eq!(
            service.handle(&request(0x3, 0, 0, HASH)),
            Err(DropReason::UnsupportedOpcode(0x3))
        );
        assert_eq!(
            service.handle(&request(0x1, 8, 0, HASH)),
            Err(DropReason::OutOfRange { mailbox: 8, capacity: 8 })
        );
        // Range is checked before authentication
        assert_eq!(
            service.handle(&request(0x1, 100, 0, 0xBAD)),
            Err(DropReason::OutOfRange { mailbox: 100, capacity: 8 })
        );
    }
}
