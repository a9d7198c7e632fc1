//! Teltonika AVL wire protocol decoder.
//!
//! Teltonika GPS trackers push binary "AVL" frames over TCP or UDP. A TCP
//! connection starts with an IMEI identification handshake and then carries
//! length-prefixed, CRC-guarded data frames; a UDP datagram is one
//! self-contained frame with the IMEI inline. Each data frame holds a batch
//! of records encoded with one of several codecs (see [`codec::Codec`]),
//! which share the record model but differ in field layout.
//!
//! The decoders here are sans-IO: they operate on bytes already buffered by
//! the transport layer and never block. The TCP entry point consumes from a
//! cumulative buffer and signals "need more data" by returning `Ok(None)`;
//! the UDP entry point decodes exactly one datagram. Replies (identification
//! accept, record-count acknowledgements) are returned as raw bytes for the
//! transport to write back on the same connection.
//!
//! - [Teltonika protocol documentation][1]
//!
//! [1]: https://wiki.teltonika-gps.com/view/Codec

pub mod checksum;
pub mod codec;
pub mod frame;
pub mod reader;
pub mod resolver;

pub use crate::frame::{
    Decoded,
    TcpDecoder,
    UdpDecoder,
};

/// Protocol identifier stamped on records decoded from a TCP stream.
pub const PROTOCOL_TCP_AVL: &str = "teltonika:tcp:avl";

/// Protocol identifier stamped on records decoded from a UDP datagram.
pub const PROTOCOL_UDP_AVL: &str = "teltonika:udp:avl";

/// Decode errors. All of these are fatal for the frame being decoded:
/// records accumulated so far are discarded and the transport layer decides
/// whether to drop the connection. Malformed input is rejected outright,
/// never coerced.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid preamble: {preamble:#010x}")]
    InvalidPreamble { preamble: u32 },

    #[error("unsupported codec: {value:#04x}")]
    UnsupportedCodec { value: u8 },

    #[error("declared data length {declared} exceeds the {available} buffered bytes")]
    IncompleteFrame { declared: usize, available: usize },

    #[error("record count mismatch: header says {expected}, trailer says {actual}")]
    RecordCountMismatch { expected: u8, actual: u8 },

    #[error("parsers consumed {consumed} bytes but the frame declared {declared}")]
    PayloadOverRead { declared: usize, consumed: usize },

    #[error("crc mismatch: received {received:#010x}, computed {computed:#06x}")]
    CrcMismatch { received: u32, computed: u16 },

    #[error("datagram declares {declared} bytes but {actual} remain")]
    UdpLengthMismatch { declared: usize, actual: usize },

    #[error("expected {expected} more bytes, but only {remaining} remain")]
    Truncated { expected: usize, remaining: usize },

    #[error("invalid length field: {length}")]
    InvalidLength { length: i64 },

    #[error("timestamp out of range: {millis} ms")]
    InvalidTimestamp { millis: i64 },
}
