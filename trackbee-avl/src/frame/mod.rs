//! Frame-level decoding.
//!
//! [`TcpDecoder`] handles the per-connection stream framing (identification
//! handshake, keep-alive pings, length/CRC-delimited data frames);
//! [`UdpDecoder`] handles self-contained datagrams. Both dispatch the
//! record batch to the codec parsers and produce the acknowledgement bytes
//! the device expects on the same connection.

mod tcp;
mod udp;

pub use self::{
    tcp::TcpDecoder,
    udp::UdpDecoder,
};

use bytes::Bytes;
use trackbee_types::{
    Record,
    Transport,
};

use crate::{
    DecodeError,
    codec::{
        self,
        Codec,
    },
    reader::Reader,
    resolver::ParameterResolver,
};

/// Outcome of one successful frame parse: zero or more records, and the
/// reply to write back on the connection, if any.
#[derive(Clone, Debug, Default)]
pub struct Decoded {
    pub records: Vec<Record>,
    pub ack: Option<Bytes>,
}

/// Parses `count` record bodies plus the trailing record-count byte.
fn parse_records(
    reader: &mut Reader<'_>,
    codec: Codec,
    count: u8,
    imei: Option<&str>,
    protocol_id: &'static str,
    transport: Transport,
    resolver: &dyn ParameterResolver,
) -> Result<Vec<Record>, DecodeError> {
    let mut records = Vec::with_capacity(count.into());

    for index in 0..count {
        tracing::trace!(index, "parsing record");
        let mut record = Record::new(codec.name(), protocol_id, transport);
        record.imei = imei.map(str::to_owned);
        codec::parse_record(reader, codec, &mut record, resolver)?;
        records.push(record);
    }

    let trailing = reader.read_u8()?;
    if trailing != count {
        return Err(DecodeError::RecordCountMismatch {
            expected: count,
            actual: trailing,
        });
    }

    Ok(records)
}
