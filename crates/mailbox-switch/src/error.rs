//! Runtime errors.

use std::{io, net::SocketAddr};

use mailbox_core::{ConfigError, PortId};
use thiserror::Error;

/// Errors that stop the switch (or keep it from starting)
#[derive(Error, Debug)]
pub enum SwitchError {
    /// Provisioning was rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Two `[[ports]]` entries share an ID
    #[error("duplicate port id {0}")]
    DuplicatePort(PortId),

    /// No ports were configured
    #[error("no ports configured")]
    NoPorts,

    /// A socket could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Local address
        addr: SocketAddr,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Runtime I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
