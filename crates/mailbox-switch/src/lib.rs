//! Secret Mailbox switch runtime.
//!
//! Wires the sans-IO [`mailbox_core::Pipeline`] to real ports. Each port is a
//! [`PortTransport`]; production ports carry one Ethernet frame per UDP
//! datagram ([`UdpPort`]), so a handful of switch processes and hosts can be
//! patched together on one machine.
//!
//! # Architecture
//!
//! ```text
//!  port 1 ──recv──┐                         ┌──send──> port 1
//!  port 2 ──recv──┼──> spawn(process) ──────┼──send──> port 2
//!  port N ──recv──┘        │                └──send──> port N
//!                          │
//!                   Arc<Pipeline>  <── admin listener (TCP, line commands)
//! ```
//!
//! Frames are processed on independent tasks. The only shared mutable state
//! is the mailbox store inside the pipeline.

pub mod admin;
pub mod config;
pub mod error;
pub mod port;
pub mod switch;

pub use admin::AdminServer;
pub use config::{PortConfig, RuntimeConfig};
pub use error::SwitchError;
pub use port::{PortTransport, UdpPort};
pub use switch::Switch;
