//! Mailbox store: a fixed array of independently atomic slots.
//!
//! Each slot is one `AtomicU64` holding `(occupied, message)`:
//!
//! ```text
//!  63            33  32  31                         0
//! ┌────────────────┬───┬────────────────────────────┐
//! │   (unused, 0)  │ O │          message           │
//! └────────────────┴───┴────────────────────────────┘
//! ```
//!
//! Every operation is a single atomic load, store or swap on one slot, so
//! operations on the same slot are linearizable (including admin mutations
//! from another thread) and operations on different slots never contend.
//! There is no store-wide lock.

use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

const OCCUPIED: u64 = 1 << 32;

/// Store access errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Mailbox number beyond the provisioned slot count
    #[error("mailbox {mailbox} out of range (capacity {capacity})")]
    OutOfRange {
        /// Requested slot
        mailbox: u16,
        /// Provisioned slot count
        capacity: usize,
    },
}

/// Contents of one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotState {
    /// Set by DropOff, cleared only by admin mutation
    pub occupied: bool,
    /// Last message dropped off (0 when empty)
    pub message: u32,
}

impl SlotState {
    /// Initial slot contents
    pub const EMPTY: Self = Self { occupied: false, message: 0 };

    /// An occupied slot holding `message`
    pub fn occupied(message: u32) -> Self {
        Self { occupied: true, message }
    }

    fn pack(self) -> u64 {
        let flag = if self.occupied { OCCUPIED } else { 0 };
        flag | u64::from(self.message)
    }

    fn unpack(word: u64) -> Self {
        Self { occupied: word & OCCUPIED != 0, message: word as u32 }
    }
}

/// Slot array shared by every in-flight packet and the admin channel.
///
/// Wrap in an `Arc` to share; all methods take `&self`.
#[derive(Debug)]
pub struct MailboxStore {
    slots: Box<[AtomicU64]>,
}

impl MailboxStore {
    /// Create a store with `capacity` empty slots.
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity).map(|_| AtomicU64::new(SlotState::EMPTY.pack())).collect();
        Self { slots }
    }

    /// Number of provisioned slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, mailbox: u16) -> Result<&AtomicU64, StoreError> {
        self.slots
            .get(usize::from(mailbox))
            .ok_or(StoreError::OutOfRange { mailbox, capacity: self.slots.len() })
    }

    /// Mark a slot occupied with `message`, returning what it held before.
    pub fn write(&self, mailbox: u16, message: u32) -> Result<SlotState, StoreError> {
        self.replace(mailbox, SlotState::occupied(message))
    }

    /// Current contents of a slot. Never mutates.
    pub fn read(&self, mailbox: u16) -> Result<SlotState, StoreError> {
        // SeqCst: one total order per slot that matches real-time order
        Ok(SlotState::unpack(self.slot(mailbox)?.load(Ordering::SeqCst)))
    }

    /// Reset a slot to empty, returning what it held before.
    pub fn clear(&self, mailbox: u16) -> Result<SlotState, StoreError> {
        self.replace(mailbox, SlotState::EMPTY)
    }

    /// Overwrite a slot with arbitrary contents, returning what it held
    /// before.
    pub fn replace(&self, mailbox: u16, state: SlotState) -> Result<SlotState, StoreError> {
        let previous = self.slot(mailbox)?.swap(state.pack(), Ordering::SeqCst);
        Ok(SlotState::unpack(previous))
    }

    /// Reset every slot. Each slot is cleared atomically, the sweep as a whole
    /// is not.
    pub fn clear_all(&self) {
        for slot in &*self.slots {
            slot.store(SlotState::EMPTY.pack(), Ordering::SeqCst);
        }
    }

    /// Per-slot consistent copy of all slots, for diagnostics.
    pub fn snapshot(&self) -> Vec<SlotState> {
        self.slots.iter().map(|slot| SlotState::unpack(slot.load(Ordering::SeqCst))).collect()
    }
}
