//! Secret Mailbox data path
//!
//! Pure, synchronous packet processing for a network element that forwards
//! ordinary IPv4 traffic and answers Secret Mailbox Protocol (SMP) requests
//! addressed to its service IP. No I/O happens here: a runtime hands each
//! received frame to [`Pipeline::process`] and executes the returned
//! [`PipelineAction`].
//!
//! # Architecture
//!
//! ```text
//!  frame ──> Dispatcher ──┬── OrdinaryForward ──────────────────────> Forwarding ──> Emit / Drop
//!                         │
//!                         └── SecretMailbox ──> MailboxService ──> Response ──> Forwarding ──> Emit / Drop
//!                                                 │        │
//!                                          Authenticator  MailboxStore <── AdminCommand
//! ```
//!
//! Every frame is an independent unit of work. `Pipeline::process` takes
//! `&self`, so any number of frames can be processed concurrently; the only
//! shared mutable state is the [`MailboxStore`], whose slots are individually
//! atomic.
//!
//! # Components
//!
//! - [`auth`]: Salted password proofs and per-host stored hashes
//! - [`store`]: Lock-free slot array shared by all packets
//! - [`machine`]: Opcode × auth outcome × slot state transition table
//! - [`response`]: In-place rewrite of a request frame into its reply
//! - [`dispatch`]: SMP vs. ordinary traffic classification
//! - [`forwarding`]: Destination lookup consumed by both paths
//! - [`admin`]: Out-of-band slot mutations
//! - [`config`]: Provisioning file
//! - [`error`]: Drop reasons

pub mod admin;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod forwarding;
pub mod machine;
pub mod pipeline;
pub mod response;
pub mod store;

pub use admin::{AdminCommand, AdminError};
pub use auth::{AuthOutcome, Authenticator, HostRecord, ProofMix, compute_proof, password_hash};
pub use config::{ConfigError, HostConfig, RouteConfig, SwitchConfig};
pub use dispatch::{Classification, Dispatcher, ServiceEndpoint, SmpRequest};
pub use error::DropReason;
pub use forwarding::{Forwarding, ForwardingTable, PortId};
pub use machine::{MailboxService, RequestKind, Transition, transition};
pub use pipeline::{Pipeline, PipelineAction};
pub use response::{UdpChecksumPolicy, build_response};
pub use store::{MailboxStore, SlotState, StoreError};
