//! TCP listener.

use std::sync::Arc;

use bytes::BytesMut;
use tokio::{
    io::{
        AsyncReadExt,
        AsyncWriteExt,
    },
    net::{
        TcpListener,
        TcpStream,
    },
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use trackbee_avl::{
    DecodeError,
    TcpDecoder,
    resolver::ParameterResolver,
};
use trackbee_types::Record;

use crate::Error;

const RECEIVE_BUFFER_SIZE: usize = 2048;

/// Accepts tracker connections and decodes their AVL streams.
///
/// Each connection runs in its own task with its own [`TcpDecoder`], so the
/// identification state of one device can never leak into another
/// connection. A decode error drops only the offending connection.
pub struct AvlTcpServer {
    listener: TcpListener,
    records: mpsc::Sender<Record>,
    resolver: Arc<dyn ParameterResolver + Send + Sync>,
    shutdown: CancellationToken,
}

impl AvlTcpServer {
    pub fn new(
        listener: TcpListener,
        records: mpsc::Sender<Record>,
        resolver: Arc<dyn ParameterResolver + Send + Sync>,
    ) -> Self {
        Self {
            listener,
            records,
            resolver,
            shutdown: CancellationToken::new(),
        }
    }

    /// Provide a [`CancellationToken`] with which the server (and all
    /// connections) can be shut down.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Serve incoming connections until shutdown.
    pub async fn serve(self) -> Result<(), Error> {
        tracing::debug!("waiting for tracker connections");

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                result = self.listener.accept() => {
                    let (connection, address) = result?;
                    let span = tracing::info_span!("connection", %address);
                    let shutdown = self.shutdown.clone();
                    let records = self.records.clone();
                    let resolver = Arc::clone(&self.resolver);

                    tokio::spawn(
                        async move {
                            tracing::debug!("tracker connected");
                            if let Err(error) =
                                handle_connection(connection, shutdown, records, resolver).await
                            {
                                tracing::warn!(%error, "dropping connection");
                            }
                            tracing::debug!("closing connection");
                        }
                        .instrument(span),
                    );
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
enum ConnectionError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

async fn handle_connection(
    mut connection: TcpStream,
    shutdown: CancellationToken,
    records: mpsc::Sender<Record>,
    resolver: Arc<dyn ParameterResolver + Send + Sync>,
) -> Result<(), ConnectionError> {
    let mut decoder = TcpDecoder::new();
    let mut buffer = BytesMut::with_capacity(RECEIVE_BUFFER_SIZE);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            result = connection.read_buf(&mut buffer) => {
                if result? == 0 {
                    // connection closed by the device
                    break;
                }

                while let Some(decoded) = decoder.decode(&mut buffer, resolver.as_ref())? {
                    if let Some(ack) = &decoded.ack {
                        connection.write_all(ack).await?;
                    }
                    for record in decoded.records {
                        if records.send(record).await.is_err() {
                            // record sink is gone, nothing left to do
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
