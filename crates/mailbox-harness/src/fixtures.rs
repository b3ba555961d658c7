//! Reference testbed: three hosts behind one switch.
//!
//! ```text
//!   h1 10.0.0.1 ── port 1 ─┐
//!   h2 10.0.0.2 ── port 2 ─┼── switch (service 10.0.0.254, ports 0xFFFF/0xFFFF)
//!   h3 10.0.0.3 ── port 3 ─┘
//! ```
//!
//! Host `n` has password `000n5229`.

use std::net::Ipv4Addr;

use bytes::Bytes;
use mailbox_core::{ConfigError, HostConfig, Pipeline, PipelineAction, PortId, SwitchConfig};

use crate::host::SimHost;

/// Testbed host passwords
pub const PASSWORDS: [&str; 3] = ["00015229", "00025229", "00035229"];

/// `CRC32` of each testbed password
pub const STORED_HASHES: [u32; 3] = [2_195_217_097, 3_312_984_089, 4_162_324_905];

/// A password no testbed host uses
pub const WRONG_PASSWORD: &str = "omgwhat?";

/// Address of testbed host `n` (1-based)
pub fn host_ip(n: u8) -> Ipv4Addr {
    Ipv4Addr::new(10, 0, 0, n)
}

/// Provisioning for the testbed: host `n` on port `n`.
pub fn testbed_config() -> SwitchConfig {
    let hosts = (1u8..=3)
        .zip(STORED_HASHES)
        .map(|(n, hash)| HostConfig {
            id: u32::from(n),
            ip: host_ip(n),
            port: PortId::from(n),
            password_hash: Some(hash),
            password: None,
        })
        .collect();

    SwitchConfig { hosts, ..SwitchConfig::default() }
}

/// Testbed pipeline with a fresh store.
pub fn testbed_pipeline() -> Result<Pipeline, ConfigError> {
    testbed_config().build_pipeline()
}

/// The three testbed hosts
pub fn testbed_hosts() -> [SimHost; 3] {
    [1u8, 2, 3].map(|n| SimHost::new(u32::from(n), host_ip(n), STORED_HASHES[usize::from(n) - 1]))
}

/// `(port, frame)` if the action transmits.
pub fn emitted(action: PipelineAction) -> Option<(PortId, Bytes)> {
    match action {
        PipelineAction::Emit { port, frame } => Some((port, frame)),
        PipelineAction::Drop { .. } => None,
    }
}
