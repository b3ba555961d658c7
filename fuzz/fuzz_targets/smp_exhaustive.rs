//! Exhaustive opcode × edge-value sweep through the state machine.
//!
//! The fuzz input only picks a salt and message; every opcode, mailbox edge
//! and credential variant is driven for each input, and the reply must match
//! the transition table.

#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use mailbox_core::{
    Authenticator, DropReason, HostRecord, MailboxService, MailboxStore, ProofMix, compute_proof,
};
use mailbox_proto::{Opcode, SmpHeader};

const SLOTS: usize = 4;
const HASH: u32 = 2_195_217_097;

const OPCODES: &[u16] = &[0x0000, 0x0001, 0x0002, 0x0003, 0x2333, 0xFFFE, 0xFFFF];
const MAILBOXES: &[u16] = &[0, 1, SLOTS as u16 - 1, SLOTS as u16, u16::MAX];

fuzz_target!(|input: (u32, u32)| {
    let (salt, message) = input;

    let mut auth = Authenticator::new(ProofMix::Xor);
    auth.insert(1, HostRecord { ip: [10, 0, 0, 1].into(), port: 1, password_hash: HASH });
    let service = MailboxService::new(auth, Arc::new(MailboxStore::new(SLOTS)));

    let good = compute_proof(salt, HASH, ProofMix::Xor);
    for &opcode in OPCODES {
        for &mailbox in MAILBOXES {
            for (host_id, proof) in [(1, good), (1, !good), (2, good)] {
                let mut request = SmpHeader::new(Opcode::Empty);
                request.set_host_id(host_id);
                request.set_salt(salt);
                request.set_password_proof(proof);
                request.set_opcode(opcode);
                request.set_mailbox_num(mailbox);
                request.set_message(message);

                match service.handle(&request) {
                    Ok(reply) => {
                        assert!(matches!(opcode, 1 | 2));
                        assert!(usize::from(mailbox) < SLOTS);
                        assert_eq!(reply.host_id(), host_id);
                        assert_eq!(reply.salt(), salt);
                        assert_eq!(reply.password_proof(), proof);
                        assert_eq!(reply.mailbox_num(), mailbox);
                        if host_id != 1 || proof != good {
                            assert_eq!(reply.opcode(), Opcode::AuthFail.to_u16());
                            assert_eq!(reply.message(), message);
                        }
                    },
                    Err(DropReason::UnsupportedOpcode(op)) => assert_eq!(op, opcode),
                    Err(DropReason::OutOfRange { mailbox: m, .. }) => assert_eq!(m, mailbox),
                    Err(other) => panic!("unexpected drop {other}"),
                }
            }
        }
    }
});
