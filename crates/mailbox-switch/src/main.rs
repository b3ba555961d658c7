//! Secret Mailbox switch.
//!
//! # Usage
//!
//! ```bash
//! mailbox-switch --config switch.toml
//! RUST_LOG=mailbox_core=debug mailbox-switch --config switch.toml
//! ```

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use mailbox_switch::{AdminServer, RuntimeConfig, Switch, SwitchError, UdpPort};
use tracing_subscriber::EnvFilter;

/// Secret Mailbox switch
#[derive(Parser, Debug)]
#[command(name = "mailbox-switch")]
#[command(about = "Forward IPv4 traffic and serve Secret Mailbox requests")]
struct Args {
    /// Runtime configuration file (TOML)
    #[arg(short, long)]
    config: PathBuf,

    /// Log level used when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "switch failed");
            ExitCode::FAILURE
        },
    }
}

async fn run(args: Args) -> Result<(), SwitchError> {
    let config = RuntimeConfig::load(&args.config)?;
    let pipeline = config.switch.build_pipeline()?;
    let store = std::sync::Arc::clone(pipeline.store());

    let mut ports = Vec::with_capacity(config.ports.len());
    for port in &config.ports {
        let transport = UdpPort::bind(port.bind, port.peer)
            .await
            .map_err(|source| SwitchError::Bind { addr: port.bind, source })?;
        tracing::info!(id = port.id, bind = %port.bind, peer = %port.peer, "port attached");
        ports.push((port.id, transport));
    }

    let switch = Switch::new(pipeline, ports)?;

    if let Some(addr) = config.admin_listen {
        let admin = AdminServer::bind(addr, store).await?;
        tokio::spawn(async move {
            if let Err(e) = admin.run().await {
                tracing::error!(error = %e, "admin channel stopped");
            }
        });
    }

    tokio::select! {
        result = switch.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown requested");
            Ok(())
        }
    }
}
