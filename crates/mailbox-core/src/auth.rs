//! Authentication engine.
//!
//! Each host proves knowledge of its password without sending it. The device
//! stores `H = CRC32(password)` per host (derived offline, never on the
//! wire). A request carries a fresh `salt` and
//! `proof = CRC32(bytes4(salt) ⊕ bytes4(H))`, where `bytes4` is the 4-byte
//! big-endian encoding and `⊕` is applied byte by byte.
//!
//! # Security
//!
//! The salt is chosen by the sender and is itself unauthenticated, and CRC-32
//! is linear. A captured `(salt, proof)` pair can be replayed verbatim, and an
//! observer can solve for `H`. This is a faithful model of the protocol, not
//! a sound authentication scheme.

use std::{collections::HashMap, net::Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::forwarding::PortId;

/// Derive the stored hash for a password (provisioning side).
pub fn password_hash(password: &[u8]) -> u32 {
    crc32fast::hash(password)
}

/// Byte-wise combine step applied to the salt and stored hash encodings.
///
/// `Xor` is the protocol's definition. `And` matches host tooling that
/// masks instead of mixing; provision it only to interoperate with such
/// hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofMix {
    /// `salt[i] ^ hash[i]`
    #[default]
    Xor,
    /// `salt[i] & hash[i]`
    And,
}

impl ProofMix {
    fn combine(self, salt: u8, hash: u8) -> u8 {
        match self {
            Self::Xor => salt ^ hash,
            Self::And => salt & hash,
        }
    }
}

/// Compute the password proof for `salt` against a stored hash.
///
/// Both operands are encoded big-endian before combining, so the CRC input
/// is exactly the four bytes a host would put on the wire.
pub fn compute_proof(salt: u32, stored_hash: u32, mix: ProofMix) -> u32 {
    let salt = salt.to_be_bytes();
    let hash = stored_hash.to_be_bytes();
    let mixed: [u8; 4] = std::array::from_fn(|i| mix.combine(salt[i], hash[i]));
    crc32fast::hash(&mixed)
}

/// Provisioned state for one host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostRecord {
    /// Host address
    pub ip: Ipv4Addr,
    /// Port the host is attached to
    pub port: PortId,
    /// `CRC32(password)`
    pub password_hash: u32,
}

/// Result of verifying a request's proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Proof matches the host's stored hash
    Authenticated,
    /// Host is known but the proof does not match
    Unauthenticated,
    /// No stored hash for this host ID
    UnknownHost,
}

impl AuthOutcome {
    /// Only `Authenticated` grants access; `UnknownHost` is treated exactly
    /// like a wrong password.
    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

/// Per-host stored hashes. Read-only while traffic flows.
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    hosts: HashMap<u32, HostRecord>,
    mix: ProofMix,
}

impl Authenticator {
    /// Create an empty authenticator
    pub fn new(mix: ProofMix) -> Self {
        Self { hosts: HashMap::new(), mix }
    }

    /// Install a host, returning the record it replaced.
    pub fn insert(&mut self, host_id: u32, record: HostRecord) -> Option<HostRecord> {
        self.hosts.insert(host_id, record)
    }

    /// Look up a host
    pub fn host(&self, host_id: u32) -> Option<&HostRecord> {
        self.hosts.get(&host_id)
    }

    /// Number of provisioned hosts
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// True if no hosts are provisioned
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Verify a request's proof. No side effects.
    pub fn verify(&self, host_id: u32, salt: u32, proof: u32) -> AuthOutcome {
        let Some(record) = self.hosts.get(&host_id) else {
            return AuthOutcome::UnknownHost;
        };

        if compute_proof(salt, record.password_hash, self.mix) == proof {
            AuthOutcome::Authenticated
        } else {
            AuthOutcome::Unauthenticated
        }
    }
}
