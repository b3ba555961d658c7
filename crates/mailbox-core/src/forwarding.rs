//! Destination lookup.
//!
//! Route population is a provisioning concern; the data path only consumes
//! `forward(dst) -> port`. A miss means the frame is dropped, for ordinary
//! traffic and SMP responses alike.

use std::{collections::HashMap, net::Ipv4Addr};

/// Egress port identifier
pub type PortId = u16;

/// Lookup consumed by the pipeline.
///
/// Implementations are read concurrently by every in-flight frame and must
/// not block.
pub trait Forwarding: Send + Sync {
    /// Egress port for `dst`, or `None` on a miss.
    fn forward(&self, dst: Ipv4Addr) -> Option<PortId>;
}

/// Exact-match IPv4 forwarding table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardingTable {
    entries: HashMap<Ipv4Addr, PortId>,
}

impl ForwardingTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace an entry, returning the previous port.
    pub fn insert(&mut self, dst: Ipv4Addr, port: PortId) -> Option<PortId> {
        self.entries.insert(dst, port)
    }

    /// Remove an entry.
    pub fn remove(&mut self, dst: Ipv4Addr) -> Option<PortId> {
        self.entries.remove(&dst)
    }

    /// Number of installed entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no entries are installed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Forwarding for ForwardingTable {
    fn forward(&self, dst: Ipv4Addr) -> Option<PortId> {
        self.entries.get(&dst).copied()
    }
}

impl FromIterator<(Ipv4Addr, PortId)> for ForwardingTable {
    fn from_iter<I: IntoIterator<Item = (Ipv4Addr, PortId)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}
