//! SMP operation codes.
//!
//! Requests carry [`Opcode::DropOff`] or [`Opcode::PickUp`]. The device
//! answers with one of the three response codes. Response codes are never
//! valid requests: a frame arriving with `0xFFFF` in the opcode field is
//! discarded like any other unknown opcode.

/// SMP opcodes, carried as a big-endian `u16` in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Opcode {
    /// PickUp found an empty slot
    Empty = 0x0000,
    /// Store a message in a slot
    DropOff = 0x0001,
    /// Read a message from a slot
    PickUp = 0x0002,
    /// Password proof did not verify
    AuthFail = 0x2333,
    /// Request succeeded
    Ack = 0xFFFF,
}

impl Opcode {
    /// Convert from u16 (returns None for unknown opcodes)
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0000 => Some(Self::Empty),
            0x0001 => Some(Self::DropOff),
            0x0002 => Some(Self::PickUp),
            0x2333 => Some(Self::AuthFail),
            0xFFFF => Some(Self::Ack),
            _ => None,
        }
    }

    /// Convert to u16
    pub fn to_u16(self) -> u16 {
        self as u16
    }
}
