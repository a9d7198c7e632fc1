//! TCP stream decoder.

use bytes::{
    Buf,
    Bytes,
    BytesMut,
};
use trackbee_types::Transport;

use crate::{
    DecodeError,
    PROTOCOL_TCP_AVL,
    checksum::crc16,
    codec::Codec,
    frame::{
        Decoded,
        parse_records,
    },
    reader::Reader,
    resolver::ParameterResolver,
};

/// Keep-alive byte sent by idle devices.
const PING: u8 = 0xFF;

/// Identification reply accepting the device.
const ACCEPT: &[u8] = &[0x01];

/// An identification frame announces its length in a u16 probe; anything
/// shorter than this is an IMEI, anything else is a data-frame preamble.
const MAX_IMEI_LENGTH: usize = 20;

/// Preamble (4) plus data length (4).
const DATA_HEADER_LENGTH: usize = 8;

/// Decoder for one TCP connection.
///
/// The connection learns its device identity once, from the identification
/// handshake; the IMEI is then implicit on every subsequent data frame.
/// State is per-connection by construction: create one decoder per accepted
/// socket and drop it with the connection.
#[derive(Clone, Debug, Default)]
pub struct TcpDecoder {
    imei: Option<String>,
}

impl TcpDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The IMEI from the identification handshake, if it happened yet.
    pub fn imei(&self) -> Option<&str> {
        self.imei.as_deref()
    }

    /// Decodes one frame from the front of `buffer`.
    ///
    /// Returns `Ok(None)` when the buffer does not yet hold enough bytes to
    /// make progress; nothing is consumed and the call must be repeated
    /// once more data arrived. On `Ok(Some(_))` exactly one frame has been
    /// consumed, so the caller should loop while frames keep coming out.
    /// Errors are fatal for the connection and consume nothing.
    pub fn decode(
        &mut self,
        buffer: &mut BytesMut,
        resolver: &dyn ParameterResolver,
    ) -> Result<Option<Decoded>, DecodeError> {
        if buffer.len() == 1 && buffer[0] == PING {
            buffer.advance(1);
            tracing::trace!("keep-alive ping");
            return Ok(Some(Decoded::default()));
        }
        if buffer.len() < 2 {
            return Ok(None);
        }

        let probe = usize::from(u16::from_be_bytes([buffer[0], buffer[1]]));
        if probe > 0 && probe < MAX_IMEI_LENGTH {
            return self.decode_identification(buffer, probe);
        }

        self.decode_data(buffer, resolver)
    }

    fn decode_identification(
        &mut self,
        buffer: &mut BytesMut,
        length: usize,
    ) -> Result<Option<Decoded>, DecodeError> {
        if buffer.len() < 2 + length {
            return Ok(None);
        }

        let imei = String::from_utf8_lossy(&buffer[2..2 + length]).into_owned();
        tracing::info!(%imei, "device identified");
        self.imei = Some(imei);
        buffer.advance(2 + length);

        Ok(Some(Decoded {
            records: Vec::new(),
            ack: Some(Bytes::from_static(ACCEPT)),
        }))
    }

    fn decode_data(
        &mut self,
        buffer: &mut BytesMut,
        resolver: &dyn ParameterResolver,
    ) -> Result<Option<Decoded>, DecodeError> {
        if buffer.len() < DATA_HEADER_LENGTH {
            return Ok(None);
        }

        let preamble = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]);
        if preamble != 0 {
            return Err(DecodeError::InvalidPreamble { preamble });
        }

        let mut reader = Reader::new(&buffer[4..]);
        let data_length = reader.read_u32()? as usize;
        let start = reader.position();

        // Unlike the probes above, a short payload here is treated as a
        // corrupt frame rather than a partial one.
        if (reader.remaining() as u64) < data_length as u64 + 4 {
            return Err(DecodeError::IncompleteFrame {
                declared: data_length,
                available: reader.remaining(),
            });
        }

        let codec_byte = reader.read_u8()?;
        let codec =
            Codec::from_byte(codec_byte).ok_or(DecodeError::UnsupportedCodec { value: codec_byte })?;
        let count = reader.read_u8()?;
        tracing::debug!(codec = codec.name(), count, "data frame");

        let records = parse_records(
            &mut reader,
            codec,
            count,
            self.imei.as_deref(),
            PROTOCOL_TCP_AVL,
            Transport::Tcp,
            resolver,
        )?;

        let consumed = reader.position() - start;
        if consumed > data_length {
            return Err(DecodeError::PayloadOverRead {
                declared: data_length,
                consumed,
            });
        }
        let padding = data_length - consumed;
        if padding > 0 {
            tracing::debug!(padding, "skipping unparsed frame tail");
            reader.skip(padding)?;
        }

        let received = reader.read_u32()?;
        let computed = crc16(&buffer[DATA_HEADER_LENGTH..DATA_HEADER_LENGTH + data_length]);
        if received != u32::from(computed) {
            return Err(DecodeError::CrcMismatch { received, computed });
        }

        let ack = codec
            .wants_data_ack()
            .then(|| Bytes::copy_from_slice(&u32::from(count).to_be_bytes()));

        let frame_length = 4 + reader.position();
        buffer.advance(frame_length);

        Ok(Some(Decoded { records, ack }))
    }
}
