//! End-to-end decode over real loopback sockets.

use std::{
    sync::Arc,
    time::Duration,
};

use tokio::{
    io::{
        AsyncReadExt,
        AsyncWriteExt,
    },
    net::{
        TcpListener,
        TcpStream,
        UdpSocket,
    },
    sync::mpsc,
    time::timeout,
};
use tokio_util::sync::CancellationToken;

use trackbee_avl::{
    checksum::crc16,
    resolver::RawValueResolver,
};
use trackbee_server::{
    AvlTcpServer,
    AvlUdpServer,
};
use trackbee_types::Transport;

const IMEI: &str = "356307042441013";

fn minimal_codec8_payload() -> Vec<u8> {
    let mut payload = vec![0x08, 0x01];
    payload.extend_from_slice(&1_700_000_000_000i64.to_be_bytes());
    payload.push(0x01);
    payload.extend_from_slice(&252_528_768i32.to_be_bytes());
    payload.extend_from_slice(&546_712_672i32.to_be_bytes());
    payload.extend_from_slice(&100i16.to_be_bytes());
    payload.extend_from_slice(&180u16.to_be_bytes());
    payload.push(0x07);
    payload.extend_from_slice(&60u16.to_be_bytes());
    payload.push(0x05);
    payload.push(0x00);
    payload.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
    payload.push(0x01);
    payload
}

fn tcp_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![0u8; 4];
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    frame.extend_from_slice(&u32::from(crc16(payload)).to_be_bytes());
    frame
}

#[tokio::test]
async fn tcp_identification_then_data_frame() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    let (sender, mut receiver) = mpsc::channel(16);
    let shutdown = CancellationToken::new();
    let server = AvlTcpServer::new(listener, sender, Arc::new(RawValueResolver))
        .with_shutdown(shutdown.clone());
    let server = tokio::spawn(server.serve());

    let mut client = TcpStream::connect(address).await.unwrap();

    let mut identification = vec![0x00, IMEI.len() as u8];
    identification.extend_from_slice(IMEI.as_bytes());
    client.write_all(&identification).await.unwrap();

    let mut accept = [0u8; 1];
    timeout(Duration::from_secs(5), client.read_exact(&mut accept))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(accept, [0x01]);

    client.write_all(&tcp_frame(&minimal_codec8_payload())).await.unwrap();

    let mut ack = [0u8; 4];
    timeout(Duration::from_secs(5), client.read_exact(&mut ack))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(u32::from_be_bytes(ack), 1);

    let record = timeout(Duration::from_secs(5), receiver.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.imei.as_deref(), Some(IMEI));
    assert_eq!(record.transport, Transport::Tcp);
    assert!(record.location.is_some());

    shutdown.cancel();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn udp_datagram_is_acknowledged() {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let address = socket.local_addr().unwrap();

    let (sender, mut receiver) = mpsc::channel(16);
    let shutdown = CancellationToken::new();
    let server = AvlUdpServer::new(socket, sender, Arc::new(RawValueResolver))
        .with_shutdown(shutdown.clone());
    let server = tokio::spawn(server.serve());

    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    let payload = minimal_codec8_payload();
    let mut inner = Vec::new();
    inner.extend_from_slice(&0x1234u16.to_be_bytes());
    inner.push(0x01);
    inner.push(0x07);
    inner.extend_from_slice(&(IMEI.len() as u16).to_be_bytes());
    inner.extend_from_slice(IMEI.as_bytes());
    inner.extend_from_slice(&payload);
    let mut datagram = Vec::new();
    datagram.extend_from_slice(&(inner.len() as u16).to_be_bytes());
    datagram.extend_from_slice(&inner);

    client.send_to(&datagram, address).await.unwrap();

    let mut ack = [0u8; 32];
    let (length, _) = timeout(Duration::from_secs(5), client.recv_from(&mut ack))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&ack[..length], &[0x00, 0x05, 0x12, 0x34, 0x01, 0x07, 0x01]);

    let record = timeout(Duration::from_secs(5), receiver.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.imei.as_deref(), Some(IMEI));
    assert_eq!(record.transport, Transport::Udp);

    shutdown.cancel();
    server.await.unwrap().unwrap();
}
