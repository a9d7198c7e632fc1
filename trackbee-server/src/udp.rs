//! UDP listener.

use std::sync::Arc;

use tokio::{
    net::UdpSocket,
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;

use trackbee_avl::{
    UdpDecoder,
    resolver::ParameterResolver,
};
use trackbee_types::Record;

use crate::Error;

const MAX_DATAGRAM_SIZE: usize = 65_535;

/// Decodes AVL datagrams from a single shared socket.
///
/// Datagrams are handled strictly one at a time: the sender address is
/// captured with its datagram and the acknowledgement goes out before the
/// next datagram is read, so two datagrams can never interleave on the
/// channel.
pub struct AvlUdpServer {
    socket: UdpSocket,
    records: mpsc::Sender<Record>,
    resolver: Arc<dyn ParameterResolver + Send + Sync>,
    shutdown: CancellationToken,
}

impl AvlUdpServer {
    pub fn new(
        socket: UdpSocket,
        records: mpsc::Sender<Record>,
        resolver: Arc<dyn ParameterResolver + Send + Sync>,
    ) -> Self {
        Self {
            socket,
            records,
            resolver,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Serve incoming datagrams until shutdown.
    pub async fn serve(self) -> Result<(), Error> {
        tracing::debug!("waiting for datagrams");

        let mut decoder = UdpDecoder::new();
        let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                result = self.socket.recv_from(&mut buffer) => {
                    let (length, address) = result?;

                    match decoder.decode(&buffer[..length], self.resolver.as_ref()) {
                        Err(error) => {
                            tracing::warn!(%address, %error, "dropping datagram");
                        }
                        Ok(decoded) => {
                            if let Some(ack) = &decoded.ack {
                                if let Err(error) = self.socket.send_to(ack, address).await {
                                    tracing::warn!(%address, %error, "failed to send ack");
                                }
                            }
                            for record in decoded.records {
                                if self.records.send(record).await.is_err() {
                                    return Ok(());
                                }
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
