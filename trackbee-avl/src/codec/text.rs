//! Codec 13: text commands.

use chrono::DateTime;
use trackbee_types::{
    Attribute,
    AttributeValue,
    Record,
};

use crate::{
    DecodeError,
    codec::names,
    reader::Reader,
};

pub fn parse(reader: &mut Reader<'_>, record: &mut Record) -> Result<(), DecodeError> {
    let _kind = reader.read_u8()?;

    // the declared length includes the 4-byte timestamp that follows
    let declared = reader.read_i32()?;
    let length = declared
        .checked_sub(4)
        .and_then(|length| usize::try_from(length).ok())
        .ok_or(DecodeError::InvalidLength {
            length: declared.into(),
        })?;

    let seconds = reader.read_u32()?;
    let millis = i64::from(seconds) * 1000;
    record.timestamp =
        DateTime::from_timestamp_millis(millis).ok_or(DecodeError::InvalidTimestamp { millis })?;

    let data = reader.read_slice(length)?;
    record.attributes.insert(
        names::TEXT_COMMAND,
        Attribute {
            value: AttributeValue::Text(String::from_utf8_lossy(data).trim().to_owned()),
            timestamp: record.timestamp,
        },
    );

    Ok(())
}
