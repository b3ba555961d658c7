//! Out-of-band administrative mutations.
//!
//! An operator can clear or overwrite slots at any time, concurrently with
//! the data path. Commands go straight to the shared store; each one is a
//! single atomic slot operation, so packet processing observes either the
//! state before or after it, never a mix.
//!
//! Text form, one command per line:
//!
//! ```text
//! clear <mailbox>
//! write <mailbox> <message>
//! clear-all
//! ```
//!
//! Numbers are decimal or `0x`-prefixed hex.

use std::str::FromStr;

use thiserror::Error;

use crate::store::{MailboxStore, StoreError};

/// A slot mutation from the administrative channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    /// Reset one slot to empty
    Clear {
        /// Slot to clear
        mailbox: u16,
    },
    /// Overwrite one slot
    Write {
        /// Slot to overwrite
        mailbox: u16,
        /// New contents
        message: u32,
    },
    /// Reset every slot
    ClearAll,
}

/// Admin command errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    /// Blank line
    #[error("empty command")]
    Empty,

    /// First word is not a known command
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Wrong number of arguments
    #[error("{command} takes {expected} argument(s)")]
    Arity {
        /// Command name
        command: &'static str,
        /// Required argument count
        expected: usize,
    },

    /// Argument is not a number in range
    #[error("invalid number: {0}")]
    InvalidNumber(String),

    /// Slot does not exist
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AdminCommand {
    /// Apply to the store.
    pub fn apply(self, store: &MailboxStore) -> Result<(), AdminError> {
        match self {
            Self::Clear { mailbox } => {
                let previous = store.clear(mailbox)?;
                tracing::info!(mailbox, ?previous, "admin cleared slot");
            },
            Self::Write { mailbox, message } => {
                let previous = store.write(mailbox, message)?;
                tracing::info!(mailbox, message, ?previous, "admin overwrote slot");
            },
            Self::ClearAll => {
                store.clear_all();
                tracing::info!(slots = store.capacity(), "admin cleared all slots");
            },
        }
        Ok(())
    }
}

impl FromStr for AdminCommand {
    type Err = AdminError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().ok_or(AdminError::Empty)?;
        let args: Vec<&str> = words.collect();

        match (command, args.as_slice()) {
            ("clear", [mailbox]) => Ok(Self::Clear { mailbox: parse_number(mailbox)? }),
            ("clear", _) => Err(AdminError::Arity { command: "clear", expected: 1 }),
            ("write", [mailbox, message]) => {
                Ok(Self::Write { mailbox: parse_number(mailbox)?, message: parse_number(message)? })
            },
            ("write", _) => Err(AdminError::Arity { command: "write", expected: 2 }),
            ("clear-all", []) => Ok(Self::ClearAll),
            ("clear-all", _) => Err(AdminError::Arity { command: "clear-all", expected: 0 }),
            (other, _) => Err(AdminError::UnknownCommand(other.to_string())),
        }
    }
}

fn parse_number<T: TryFrom<u64>>(word: &str) -> Result<T, AdminError> {
    let value = match word.strip_prefix("0x").or_else(|| word.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => word.parse::<u64>(),
    };

    value
        .ok()
        .and_then(|v| T::try_from(v).ok())
        .ok_or_else(|| AdminError::InvalidNumber(word.to_string()))
}
