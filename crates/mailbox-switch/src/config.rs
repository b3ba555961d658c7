//! Runtime configuration: provisioning plus port wiring.
//!
//! ```toml
//! admin_listen = "127.0.0.1:7000"
//!
//! [[hosts]]
//! id = 1
//! ip = "10.0.0.1"
//! port = 1
//! password = "00015229"
//!
//! [[ports]]
//! id = 1
//! bind = "127.0.0.1:9001"
//! peer = "127.0.0.1:8001"
//! ```

use std::{collections::HashSet, net::SocketAddr, path::Path};

use mailbox_core::{ConfigError, PortId, SwitchConfig};
use serde::{Deserialize, Serialize};

use crate::error::SwitchError;

/// One UDP-encapsulated port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfig {
    /// Port number used by forwarding entries
    pub id: PortId,
    /// Local UDP address
    pub bind: SocketAddr,
    /// Far end of the cable
    pub peer: SocketAddr,
}

/// Full switch runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Data path provisioning
    #[serde(flatten)]
    pub switch: SwitchConfig,
    /// Attached ports
    #[serde(default)]
    pub ports: Vec<PortConfig>,
    /// Admin channel address (disabled when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_listen: Option<SocketAddr>,
}

impl RuntimeConfig {
    /// Parse and validate TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, SwitchError> {
        let config: Self = toml::from_str(text).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, SwitchError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&text)
    }

    /// Check provisioning and port wiring.
    pub fn validate(&self) -> Result<(), SwitchError> {
        self.switch.validate()?;

        if self.ports.is_empty() {
            return Err(SwitchError::NoPorts);
        }

        let mut seen = HashSet::new();
        for port in &self.ports {
            if !seen.insert(port.id) {
                return Err(SwitchError::DuplicatePort(port.id));
            }
        }

        for host in &self.switch.hosts {
            if !seen.contains(&host.port) {
                tracing::warn!(host_id = host.id, port = host.port, "host on unattached port");
            }
        }
        for route in &self.switch.routes {
            if !seen.contains(&route.port) {
                tracing::warn!(dst = %route.dst, port = route.port, "route to unattached port");
            }
        }
        Ok(())
    }
}
