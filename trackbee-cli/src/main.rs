use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Error;
use tokio::{
    net::{
        TcpListener,
        UdpSocket,
    },
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;

use trackbee_avl::resolver::RawValueResolver;
use trackbee_server::{
    AvlTcpServer,
    AvlUdpServer,
};

#[derive(Debug, Parser)]
struct Args {
    /// Address for the TCP listener
    #[clap(long, env = "TRACKBEE_TCP_ADDRESS", default_value = "0.0.0.0:5027")]
    tcp_address: String,

    /// Address for the UDP socket
    #[clap(long, env = "TRACKBEE_UDP_ADDRESS", default_value = "0.0.0.0:5027")]
    udp_address: String,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let _ = dotenvy::dotenv();
    color_eyre::install()?;
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let (records, mut record_stream) = mpsc::channel(256);
    let shutdown = CancellationToken::new();
    let resolver = Arc::new(RawValueResolver);

    let tcp_listener = TcpListener::bind(&args.tcp_address).await?;
    tracing::info!(address = %args.tcp_address, "tcp listener bound");
    let tcp_server = AvlTcpServer::new(tcp_listener, records.clone(), resolver.clone())
        .with_shutdown(shutdown.clone());

    let udp_socket = UdpSocket::bind(&args.udp_address).await?;
    tracing::info!(address = %args.udp_address, "udp socket bound");
    let udp_server =
        AvlUdpServer::new(udp_socket, records, resolver).with_shutdown(shutdown.clone());

    let tcp_task = tokio::spawn(tcp_server.serve());
    let udp_task = tokio::spawn(udp_server.serve());

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutting down");
                shutdown.cancel();
            }
        }
    });

    while let Some(record) = record_stream.recv().await {
        match serde_json::to_string(&record) {
            Ok(line) => println!("{line}"),
            Err(error) => tracing::error!(%error, "failed to serialize record"),
        }
    }

    tcp_task.await??;
    udp_task.await??;

    Ok(())
}
