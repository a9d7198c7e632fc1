//! UDP datagram decoder.

use bytes::Bytes;
use trackbee_types::Transport;

use crate::{
    DecodeError,
    PROTOCOL_UDP_AVL,
    codec::Codec,
    frame::{
        Decoded,
        parse_records,
    },
    reader::Reader,
    resolver::ParameterResolver,
};

/// Shortest possible datagram: length, packet id, packet type, AVL packet
/// id, IMEI length.
const MIN_DATAGRAM_LENGTH: usize = 10;

/// Decoder for one UDP channel.
///
/// UDP framing is connectionless: every datagram is one complete frame and
/// carries the IMEI inline, so there is no handshake, preamble or CRC. The
/// last seen IMEI is kept as channel state, mirroring the TCP decoder.
#[derive(Clone, Debug, Default)]
pub struct UdpDecoder {
    imei: Option<String>,
}

impl UdpDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The IMEI of the most recently decoded datagram.
    pub fn imei(&self) -> Option<&str> {
        self.imei.as_deref()
    }

    /// Decodes one complete datagram.
    pub fn decode(
        &mut self,
        datagram: &[u8],
        resolver: &dyn ParameterResolver,
    ) -> Result<Decoded, DecodeError> {
        if datagram.len() < MIN_DATAGRAM_LENGTH {
            return Err(DecodeError::Truncated {
                expected: MIN_DATAGRAM_LENGTH,
                remaining: datagram.len(),
            });
        }

        let mut reader = Reader::new(datagram);

        let declared = usize::from(reader.read_u16()?);
        if reader.remaining() != declared {
            return Err(DecodeError::UdpLengthMismatch {
                declared,
                actual: reader.remaining(),
            });
        }

        let packet_id = reader.read_u16()?;
        let _packet_type = reader.read_u8()?;
        let avl_packet_id = reader.read_u8()?;

        let imei_length = usize::from(reader.read_u16()?);
        let imei = String::from_utf8_lossy(reader.read_slice(imei_length)?).into_owned();
        self.imei = Some(imei.clone());

        let codec_byte = reader.read_u8()?;
        let codec =
            Codec::from_byte(codec_byte).ok_or(DecodeError::UnsupportedCodec { value: codec_byte })?;
        let count = reader.read_u8()?;
        tracing::debug!(codec = codec.name(), count, %imei, "datagram");

        let records = parse_records(
            &mut reader,
            codec,
            count,
            Some(&imei),
            PROTOCOL_UDP_AVL,
            Transport::Udp,
            resolver,
        )?;

        Ok(Decoded {
            records,
            ack: Some(ack(packet_id, avl_packet_id, count)),
        })
    }
}

/// The 7-byte datagram acknowledgement.
fn ack(packet_id: u16, avl_packet_id: u8, count: u8) -> Bytes {
    let mut reply = Vec::with_capacity(7);
    reply.extend_from_slice(&5u16.to_be_bytes());
    reply.extend_from_slice(&packet_id.to_be_bytes());
    reply.push(0x01);
    reply.push(avl_packet_id);
    reply.push(count);
    Bytes::from(reply)
}
