//! Simulation harness for the Secret Mailbox switch.
//!
//! - [`SimHost`]: builds authenticated SMP frames the way a provisioned host
//!   would, and decodes replies
//! - [`fixtures`]: the three-host reference testbed
//! - [`SimPort`]: turmoil-backed [`mailbox_switch::PortTransport`] for
//!   deterministic end-to-end runs

pub mod fixtures;
pub mod host;
pub mod sim_port;

pub use host::{Reply, SimHost};
pub use sim_port::{SimCable, SimPort, run_sim_switch};
