//! Network listeners binding the AVL decoder to real sockets.
//!
//! [`AvlTcpServer`] accepts tracker connections and drives one
//! [`TcpDecoder`][trackbee_avl::TcpDecoder] per connection over a
//! cumulative receive buffer; [`AvlUdpServer`] feeds one
//! [`UdpDecoder`][trackbee_avl::UdpDecoder] datagram by datagram. Both
//! write protocol acknowledgements back on the same connection and forward
//! decoded records into an [`mpsc`][tokio::sync::mpsc] channel; the
//! receiving side owns persistence and publication.

pub mod tcp;
pub mod udp;

pub use crate::{
    tcp::AvlTcpServer,
    udp::AvlUdpServer,
};

/// Server errors. Decode failures are not in here: they are scoped to a
/// single connection or datagram and handled (logged) where they occur.
#[derive(Debug, thiserror::Error)]
#[error("avl server error")]
pub enum Error {
    Io(#[from] std::io::Error),
}
