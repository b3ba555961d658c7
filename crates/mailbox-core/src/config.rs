//! Provisioning configuration.
//!
//! Host credentials and forwarding entries are installed once, before
//! traffic flows, from a TOML file:
//!
//! ```toml
//! service_ip = "10.0.0.254"
//! mailbox_slots = 32
//! proof_mix = "xor"          # or "and"
//! udp_checksum = "preserve"  # or "recompute", "clear"
//!
//! [[hosts]]
//! id = 1
//! ip = "10.0.0.1"
//! port = 1
//! password_hash = 2195217097  # or: password = "00015229"
//!
//! [[routes]]
//! dst = "10.0.0.3"
//! port = 3
//! ```
//!
//! Every host also installs a forwarding entry for its own address, so
//! replies can reach it.

use std::{
    collections::HashSet,
    net::Ipv4Addr,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    auth::{self, Authenticator, HostRecord, ProofMix},
    dispatch::{Dispatcher, ServiceEndpoint},
    forwarding::{ForwardingTable, PortId},
    machine::MailboxService,
    pipeline::Pipeline,
    response::UdpChecksumPolicy,
    store::MailboxStore,
};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Path that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Two hosts share an ID
    #[error("duplicate host id {0}")]
    DuplicateHost(u32),

    /// Host has neither or both of `password` / `password_hash`
    #[error("host {0} needs exactly one of `password` or `password_hash`")]
    Credential(u32),

    /// Two entries route one address to different ports
    #[error("route for {dst} points at both port {first} and port {second}")]
    ConflictingRoute {
        /// Destination address
        dst: Ipv4Addr,
        /// Port installed first
        first: PortId,
        /// Conflicting port
        second: PortId,
    },

    /// Slot count outside 1..=65536
    #[error("mailbox_slots must be between 1 and {max}, got {got}")]
    InvalidSlotCount {
        /// Configured value
        got: usize,
        /// Upper bound
        max: usize,
    },
}

/// One provisioned host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// SMP host ID
    pub id: u32,
    /// Host address
    pub ip: Ipv4Addr,
    /// Port the host is attached to
    pub port: PortId,
    /// Pre-derived `CRC32(password)`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<u32>,
    /// Plaintext password, hashed at load time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl HostConfig {
    /// Stored hash for this host.
    pub fn stored_hash(&self) -> Result<u32, ConfigError> {
        match (self.password_hash, &self.password) {
            (Some(hash), None) => Ok(hash),
            (None, Some(password)) => Ok(auth::password_hash(password.as_bytes())),
            _ => Err(ConfigError::Credential(self.id)),
        }
    }
}

/// Extra forwarding entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Destination address
    pub dst: Ipv4Addr,
    /// Egress port
    pub port: PortId,
}

/// Device provisioning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchConfig {
    /// Designated mailbox-service address
    #[serde(default = "default_service_ip")]
    pub service_ip: Ipv4Addr,
    /// Required UDP source port for SMP
    #[serde(default = "default_service_port")]
    pub service_src_port: u16,
    /// Required UDP destination port for SMP
    #[serde(default = "default_service_port")]
    pub service_dst_port: u16,
    /// Number of mailbox slots
    #[serde(default = "default_mailbox_slots")]
    pub mailbox_slots: usize,
    /// Proof combine step
    #[serde(default)]
    pub proof_mix: ProofMix,
    /// Reply UDP checksum handling
    #[serde(default)]
    pub udp_checksum: UdpChecksumPolicy,
    /// Provisioned hosts
    #[serde(default)]
    pub hosts: Vec<HostConfig>,
    /// Additional forwarding entries
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

fn default_service_ip() -> Ipv4Addr {
    ServiceEndpoint::DEFAULT_IP
}

fn default_service_port() -> u16 {
    ServiceEndpoint::RESERVED_PORT
}

fn default_mailbox_slots() -> usize {
    SwitchConfig::DEFAULT_SLOTS
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            service_ip: default_service_ip(),
            service_src_port: default_service_port(),
            service_dst_port: default_service_port(),
            mailbox_slots: default_mailbox_slots(),
            proof_mix: ProofMix::default(),
            udp_checksum: UdpChecksumPolicy::default(),
            hosts: Vec::new(),
            routes: Vec::new(),
        }
    }
}

impl SwitchConfig {
    /// Default slot count
    pub const DEFAULT_SLOTS: usize = 32;

    /// Largest slot count addressable by a 16-bit mailbox number
    pub const MAX_SLOTS: usize = 1 << 16;

    /// Parse and validate TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&text)
    }

    /// Check cross-field invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=Self::MAX_SLOTS).contains(&self.mailbox_slots) {
            return Err(ConfigError::InvalidSlotCount {
                got: self.mailbox_slots,
                max: Self::MAX_SLOTS,
            });
        }

        let mut seen = HashSet::new();
        for host in &self.hosts {
            if !seen.insert(host.id) {
                return Err(ConfigError::DuplicateHost(host.id));
            }
            host.stored_hash()?;
        }

        self.forwarding_table().map(|_| ())
    }

    /// Service address and ports
    pub fn endpoint(&self) -> ServiceEndpoint {
        ServiceEndpoint {
            ip: self.service_ip,
            src_port: self.service_src_port,
            dst_port: self.service_dst_port,
        }
    }

    /// Stored hashes for every host.
    pub fn authenticator(&self) -> Result<Authenticator, ConfigError> {
        let mut auth = Authenticator::new(self.proof_mix);
        for host in &self.hosts {
            let record =
                HostRecord { ip: host.ip, port: host.port, password_hash: host.stored_hash()? };
            if auth.insert(host.id, record).is_some() {
                return Err(ConfigError::DuplicateHost(host.id));
            }
        }
        Ok(auth)
    }

    /// Host entries followed by explicit routes.
    pub fn forwarding_table(&self) -> Result<ForwardingTable, ConfigError> {
        let entries = self
            .hosts
            .iter()
            .map(|host| (host.ip, host.port))
            .chain(self.routes.iter().map(|route| (route.dst, route.port)));

        let mut table = ForwardingTable::new();
        for (dst, port) in entries {
            if let Some(first) = table.insert(dst, port)
                && first != port
            {
                return Err(ConfigError::ConflictingRoute { dst, first, second: port });
            }
        }
        Ok(table)
    }

    /// Provision a ready-to-run pipeline with a fresh store.
    pub fn build_pipeline(&self) -> Result<Pipeline, ConfigError> {
        self.validate()?;

        let store = Arc::new(MailboxStore::new(self.mailbox_slots));
        let service = MailboxService::new(self.authenticator()?, store);
        let forwarding = self.forwarding_table()?;

        tracing::info!(
            service_ip = %self.service_ip,
            hosts = self.hosts.len(),
            routes = forwarding.len(),
            slots = self.mailbox_slots,
            proof_mix = ?self.proof_mix,
            "provisioned mailbox pipeline"
        );

        Ok(Pipeline::new(Dispatcher::new(self.endpoint()), service, forwarding, self.udp_checksum))
    }
}
