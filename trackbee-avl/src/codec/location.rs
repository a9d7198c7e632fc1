//! Standard location block, shared by codecs 8, 8E and 16.

use chrono::{
    DateTime,
    Utc,
};
use trackbee_types::{
    Attribute,
    AttributeValue,
    Position,
    Record,
};

use crate::{
    DecodeError,
    codec::{
        Codec,
        names,
        read_ext,
    },
    reader::Reader,
};

pub(super) fn put_integer(
    record: &mut Record,
    name: &'static str,
    value: i64,
    timestamp: DateTime<Utc>,
) {
    record.attributes.insert(
        name,
        Attribute {
            value: AttributeValue::Integer(value),
            timestamp,
        },
    );
}

pub fn parse(reader: &mut Reader<'_>, codec: Codec, record: &mut Record) -> Result<(), DecodeError> {
    let millis = reader.read_i64()?;
    let timestamp =
        DateTime::from_timestamp_millis(millis).ok_or(DecodeError::InvalidTimestamp { millis })?;
    record.timestamp = timestamp;

    let priority = reader.read_u8()?;
    put_integer(record, names::PRIORITY, priority.into(), timestamp);

    let longitude = f64::from(reader.read_i32()?) / 10_000_000.0;
    let latitude = f64::from(reader.read_i32()?) / 10_000_000.0;
    record.location = Some(Position {
        longitude,
        latitude,
    });

    let altitude = reader.read_i16()?;
    put_integer(record, names::ALTITUDE, altitude.into(), timestamp);

    let direction = reader.read_u16()?;
    put_integer(record, names::DIRECTION, direction.into(), timestamp);

    let satellites = reader.read_u8()?;
    put_integer(record, names::SATELLITES, satellites.into(), timestamp);
    record.valid = satellites > 0;

    let speed = reader.read_u16()?;
    put_integer(record, names::SPEED, speed.into(), timestamp);

    let event_id = read_ext(reader, codec, &[Codec::Codec8Ext, Codec::Codec16])?;
    put_integer(record, names::EVENT_TRIGGERED, event_id.into(), timestamp);

    if codec == Codec::Codec16 {
        let generation = reader.read_u8()?;
        tracing::trace!(generation, "codec 16 generation type");
    }

    let total_io_count = read_ext(reader, codec, &[Codec::Codec8Ext])?;
    tracing::trace!(total_io_count, "io elements declared");

    Ok(())
}
