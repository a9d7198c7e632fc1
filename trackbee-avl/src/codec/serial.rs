//! Codec 12: serial passthrough and camera data.
//!
//! Carries no timestamp of its own; records are stamped with the wall
//! clock at decode time.

use chrono::Utc;
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

const TYPE_CAMERA: u8 = 0x0D;

pub fn parse(reader: &mut Reader<'_>, record: &mut Record) -> Result<(), DecodeError> {
    record.timestamp = Utc::now();

    let kind = reader.read_u8()?;
    let declared = reader.read_i32()?;
    let length = usize::try_from(declared).map_err(|_| {
        DecodeError::InvalidLength {
            length: declared.into(),
        }
    })?;
    let data = reader.read_slice(length)?;

    if kind == TYPE_CAMERA {
        record.attributes.insert(
            names::CAMERA_DATA,
            Attribute {
                value: AttributeValue::Text(hex::encode(data)),
                timestamp: record.timestamp,
            },
        );
    }
    else {
        record.attributes.insert(
            names::SERIAL_DATA,
            Attribute {
                value: AttributeValue::Text(String::from_utf8_lossy(data).into_owned()),
                timestamp: record.timestamp,
            },
        );
    }

    Ok(())
}
