//! Port fan-in / fan-out around the pipeline.

use std::{collections::HashMap, sync::Arc};

use bytes::Bytes;
use mailbox_core::{Forwarding, ForwardingTable, Pipeline, PipelineAction, PortId};
use tokio::task::JoinSet;

use crate::{error::SwitchError, port::PortTransport};

/// A running switch: pipeline plus attached ports.
///
/// Cloning is cheap; clones share the pipeline, the store and the ports.
pub struct Switch<P, F = ForwardingTable> {
    pipeline: Arc<Pipeline<F>>,
    ports: Arc<HashMap<PortId, Arc<P>>>,
}

impl<P, F> Clone for Switch<P, F> {
    fn clone(&self) -> Self {
        Self { pipeline: Arc::clone(&self.pipeline), ports: Arc::clone(&self.ports) }
    }
}

impl<P, F> Switch<P, F>
where
    P: PortTransport,
    F: Forwarding + 'static,
{
    /// Attach `ports` to `pipeline`.
    pub fn new(
        pipeline: Pipeline<F>,
        ports: impl IntoIterator<Item = (PortId, P)>,
    ) -> Result<Self, SwitchError> {
        let mut map = HashMap::new();
        for (id, port) in ports {
            if map.insert(id, Arc::new(port)).is_some() {
                return Err(SwitchError::DuplicatePort(id));
            }
        }
        if map.is_empty() {
            return Err(SwitchError::NoPorts);
        }

        Ok(Self { pipeline: Arc::new(pipeline), ports: Arc::new(map) })
    }

    /// Shared pipeline
    pub fn pipeline(&self) -> &Arc<Pipeline<F>> {
        &self.pipeline
    }

    /// Attached port IDs
    pub fn port_ids(&self) -> impl Iterator<Item = PortId> + '_ {
        self.ports.keys().copied()
    }

    /// Run one receive loop per port until every loop has ended.
    ///
    /// A receive error ends only the failing port's loop. Returns the first
    /// such error once all ports are down.
    pub async fn run(self) -> Result<(), SwitchError> {
        let mut loops = JoinSet::new();
        for (&id, port) in self.ports.iter() {
            let switch = self.clone();
            let port = Arc::clone(port);
            loops.spawn(async move { switch.ingress(id, port).await });
        }

        tracing::info!(ports = self.ports.len(), "switch running");

        let mut first_error = None;
        while let Some(joined) = loops.join_next().await {
            let result = joined.map_err(std::io::Error::other).and_then(|r| r);
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), |e| Err(SwitchError::Io(e)))
    }

    async fn ingress(&self, id: PortId, port: Arc<P>) -> std::io::Result<()> {
        loop {
            let frame = match port.recv_frame().await {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(port = id, error = %e, "port receive failed, stopping port");
                    return Err(e);
                },
            };

            let switch = self.clone();
            tokio::spawn(async move { switch.handle_frame(id, frame).await });
        }
    }

    /// Process one frame received on `ingress` and transmit the result.
    pub async fn handle_frame(&self, ingress: PortId, frame: Bytes) {
        let PipelineAction::Emit { port, frame } = self.pipeline.process(frame) else {
            return;
        };

        let Some(egress) = self.ports.get(&port) else {
            tracing::debug!(ingress, egress = port, "egress port not attached, dropping frame");
            return;
        };

        if let Err(e) = egress.send_frame(&frame).await {
            tracing::warn!(ingress, egress = port, error = %e, "failed to transmit frame");
        }
    }
}
