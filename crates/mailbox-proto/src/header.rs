//! SMP header implementation with zero-copy parsing.
//!
//! The `SmpHeader` is a fixed 20-byte structure serialized as raw binary
//! (Big Endian). It is the entire protocol: there is no payload beyond the
//! 32-bit `message` field.

use std::fmt;

use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout};

use crate::{
    Opcode,
    errors::{ProtocolError, Result},
};

/// Fixed 20-byte SMP header (Big Endian network byte order)
///
/// Fields are stored as raw byte arrays to avoid alignment issues with
/// `#[repr(C, packed)]`. Every 20-byte pattern is a valid header; semantic
/// checks (opcode, mailbox range) belong to the state machine.
///
/// ```text
///  0               4               8              12      14      16              20
/// ┌───────────────┬───────────────┬───────────────┬───────┬───────┬───────────────┐
/// │    host_id    │     salt      │ password_proof│opcode │mailbox│    message    │
/// └───────────────┴───────────────┴───────────────┴───────┴───────┴───────────────┘
/// ```
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct SmpHeader {
    host_id: [u8; 4],        // u32 sender identity
    salt: [u8; 4],           // u32 sender-chosen nonce
    password_proof: [u8; 4], // u32 CRC32 over salt and stored hash
    opcode: [u8; 2],         // u16 operation / response code
    mailbox_num: [u8; 2],    // u16 slot index
    message: [u8; 4],        // u32 payload
}

impl SmpHeader {
    /// Size of the serialized header (20 bytes)
    pub const SIZE: usize = 20;

    /// Create a zeroed header carrying the given opcode.
    #[must_use]
    pub fn new(opcode: Opcode) -> Self {
        let mut header = Self::new_zeroed();
        header.set_opcode(opcode.to_u16());
        header
    }

    /// Parse header from the start of a UDP payload (zero-copy, safe)
    ///
    /// Trailing bytes after the first 20 are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::TooShort` if fewer than 20 bytes are available.
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        Self::ref_from_prefix(bytes).map(|(header, _)| header).map_err(|_| {
            ProtocolError::TooShort {
                layer: "SMP header",
                expected: Self::SIZE,
                actual: bytes.len(),
            }
        })
    }

    /// Serialize header to bytes (zero-copy)
    #[must_use]
    #[allow(clippy::wrong_self_convention)]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(IntoBytes::as_bytes(self));
        arr
    }

    /// Get the host ID
    pub fn host_id(&self) -> u32 {
        u32::from_be_bytes(self.host_id)
    }

    /// Get the salt
    pub fn salt(&self) -> u32 {
        u32::from_be_bytes(self.salt)
    }

    /// Get the password proof
    pub fn password_proof(&self) -> u32 {
        u32::from_be_bytes(self.password_proof)
    }

    /// Get the raw opcode
    pub fn opcode(&self) -> u16 {
        u16::from_be_bytes(self.opcode)
    }

    /// Get the opcode as an enum (if valid)
    pub fn opcode_enum(&self) -> Option<Opcode> {
        Opcode::from_u16(self.opcode())
    }

    /// Get the mailbox number
    pub fn mailbox_num(&self) -> u16 {
        u16::from_be_bytes(self.mailbox_num)
    }

    /// Get the message
    pub fn message(&self) -> u32 {
        u32::from_be_bytes(self.message)
    }

    /// Set the host ID
    pub fn set_host_id(&mut self, host_id: u32) {
        self.host_id = host_id.to_be_bytes();
    }

    /// Set the salt
    pub fn set_salt(&mut self, salt: u32) {
        self.salt = salt.to_be_bytes();
    }

    /// Set the password proof
    pub fn set_password_proof(&mut self, proof: u32) {
        self.password_proof = proof.to_be_bytes();
    }

    /// Set the raw opcode
    pub fn set_opcode(&mut self, opcode: u16) {
        self.opcode = opcode.to_be_bytes();
    }

    /// Set the mailbox number
    pub fn set_mailbox_num(&mut self, mailbox_num: u16) {
        self.mailbox_num = mailbox_num.to_be_bytes();
    }

    /// Set the message
    pub fn set_message(&mut self, message: u32) {
        self.message = message.to_be_bytes();
    }
}

impl PartialEq for SmpHeader {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for SmpHeader {}

impl fmt::Debug for SmpHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmpHeader")
            .field("host_id", &self.host_id())
            .field("salt", &format_args!("{:#010x}", self.salt()))
            .field("password_proof", &format_args!("{:#010x}", self.password_proof()))
            .field("opcode", &format_args!("{:#06x}", self.opcode()))
            .field("mailbox_num", &self.mailbox_num())
            .field("message", &format_args!("{:#010x}", self.message()))
            .finish()
    }
}
