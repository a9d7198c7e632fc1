//! Codecs 14 and 15: opaque command payloads.
//!
//! Both wrap a free-form payload. Codec 15 embeds a timestamp in the first
//! payload word and carries its text after a 12-byte header; codec 14 has
//! neither, so the record takes the wall clock and the text is recovered by
//! scanning the payload for its longest printable run.

use chrono::{
    DateTime,
    Utc,
};
use trackbee_types::{
    Attribute,
    AttributeValue,
    Record,
};

use crate::{
    DecodeError,
    codec::{
        Codec,
        names,
    },
    reader::Reader,
};

/// Payload offset at which codec 15 text begins.
const TEXT_OFFSET: usize = 12;

pub fn parse(reader: &mut Reader<'_>, codec: Codec, record: &mut Record) -> Result<(), DecodeError> {
    let kind = reader.read_u8()?;
    let declared = reader.read_i32()?;
    let length = usize::try_from(declared).map_err(|_| {
        DecodeError::InvalidLength {
            length: declared.into(),
        }
    })?;
    let payload = reader.read_slice(length)?;

    record.timestamp = if codec == Codec::Codec15 && length >= TEXT_OFFSET {
        let seconds = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
        let millis = i64::from(seconds) * 1000;
        DateTime::from_timestamp_millis(millis).ok_or(DecodeError::InvalidTimestamp { millis })?
    }
    else {
        Utc::now()
    };

    let text = if codec == Codec::Codec15 && length > TEXT_OFFSET {
        String::from_utf8_lossy(&payload[TEXT_OFFSET..]).trim().to_owned()
    }
    else {
        extract_printable_ascii(payload)
    };

    record.attributes.insert(
        names::TEXT_COMMAND,
        Attribute {
            value: AttributeValue::Text(text),
            timestamp: record.timestamp,
        },
    );
    record.attributes.insert(
        names::CODEC_MESSAGE_TYPE,
        Attribute {
            value: AttributeValue::Integer(kind.into()),
            timestamp: record.timestamp,
        },
    );

    Ok(())
}

/// Returns the longest contiguous run of printable ASCII in `payload`,
/// trimmed; if there is no printable byte at all, the whole payload as an
/// uppercase hex dump.
pub fn extract_printable_ascii(payload: &[u8]) -> String {
    let mut best = 0..0;
    let mut run_start = None;

    for (index, byte) in payload.iter().enumerate() {
        if (0x20..=0x7E).contains(byte) {
            if run_start.is_none() {
                run_start = Some(index);
            }
        }
        else if let Some(start) = run_start.take() {
            if index - start > best.len() {
                best = start..index;
            }
        }
    }
    if let Some(start) = run_start {
        if payload.len() - start > best.len() {
            best = start..payload.len();
        }
    }

    if best.is_empty() {
        hex::encode_upper(payload)
    }
    else {
        String::from_utf8_lossy(&payload[best]).trim().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::extract_printable_ascii;

    #[test]
    fn picks_the_printable_run() {
        assert_eq!(
            extract_printable_ascii(&[0x00, 0x01, b'H', b'E', b'L', b'L', b'O', 0x02]),
            "HELLO"
        );
    }

    #[test]
    fn falls_back_to_hex_dump() {
        assert_eq!(extract_printable_ascii(&[0x00, 0x01, 0x02]), "000102");
        assert_eq!(extract_printable_ascii(&[0xAB, 0xCD]), "ABCD");
    }

    #[test]
    fn longest_run_wins() {
        assert_eq!(
            extract_printable_ascii(&[b'H', b'I', 0x00, b'W', b'O', b'R', b'L', b'D']),
            "WORLD"
        );
    }

    #[test]
    fn empty_payload_dumps_to_empty_string() {
        assert_eq!(extract_printable_ascii(&[]), "");
    }
}
