//! Line-oriented admin listener.
//!
//! Each line is one [`AdminCommand`] in text form (`write 4 0xdeadbeef`,
//! `clear 4`, `clear-all`). Each command gets exactly one reply line: `ok`
//! or `error: <reason>`. Nothing sent here can reach the data path except
//! through the store's own atomic operations.

use std::{net::SocketAddr, sync::Arc};

use mailbox_core::{AdminCommand, AdminError, MailboxStore};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    net::TcpListener,
};

use crate::error::SwitchError;

/// Admin channel bound to a TCP address
#[derive(Debug)]
pub struct AdminServer {
    listener: TcpListener,
    store: Arc<MailboxStore>,
}

impl AdminServer {
    /// Bind the admin listener.
    pub async fn bind(addr: SocketAddr, store: Arc<MailboxStore>) -> Result<Self, SwitchError> {
        let listener =
            TcpListener::bind(addr).await.map_err(|source| SwitchError::Bind { addr, source })?;
        Ok(Self { listener, store })
    }

    /// Bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept admin sessions until the listener fails.
    pub async fn run(self) -> Result<(), SwitchError> {
        tracing::info!(addr = ?self.listener.local_addr().ok(), "admin channel listening");

        loop {
            let (stream, peer) = self.listener.accept().await?;
            let store = Arc::clone(&self.store);
            tokio::spawn(async move {
                tracing::debug!(%peer, "admin session opened");
                if let Err(e) = serve_session(stream, &store).await {
                    tracing::debug!(%peer, error = %e, "admin session ended with error");
                }
            });
        }
    }
}

/// Run one admin session over any byte stream.
pub async fn serve_session<S>(stream: S, store: &MailboxStore) -> std::io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let reply = match execute(&line, store) {
            Ok(()) => "ok\n".to_owned(),
            Err(e) => format!("error: {e}\n"),
        };
        writer.write_all(reply.as_bytes()).await?;
    }

    Ok(())
}

fn execute(line: &str, store: &MailboxStore) -> Result<(), AdminError> {
    line.parse::<AdminCommand>()?.apply(store)
}
