//! GH3000 location block.
//!
//! The GH3000 personal tracker encodes its timestamp as seconds since
//! 2007-01-01 in the low 30 bits of the first word, and gates every other
//! location sub-field behind bitmasks: a global mask (also selecting which
//! IO size groups follow) and, when bit 0 is set, a location mask.

use chrono::DateTime;
use trackbee_types::{
    Position,
    Record,
};

use crate::{
    DecodeError,
    codec::{
        location::put_integer,
        names,
    },
    reader::Reader,
};

/// 2007-01-01T00:00:00Z.
const EPOCH_OFFSET_SECONDS: i64 = 1_167_609_600;

const HAS_LOCATION: u8 = 0x01;
const LOCATION_COORDINATES: u8 = 0x01;
const LOCATION_ALTITUDE: u8 = 0x02;
const LOCATION_DIRECTION: u8 = 0x04;
const LOCATION_SPEED_SATELLITE: u8 = 0x08;
const LOCATION_SATELLITES: u8 = 0x10;

pub fn parse(reader: &mut Reader<'_>, record: &mut Record) -> Result<(), DecodeError> {
    let word = reader.read_u32()?;
    let millis = (i64::from(word & 0x3FFF_FFFF) + EPOCH_OFFSET_SECONDS) * 1000;
    let timestamp =
        DateTime::from_timestamp_millis(millis).ok_or(DecodeError::InvalidTimestamp { millis })?;
    record.timestamp = timestamp;

    let global_mask = reader.read_u8()?;
    record.global_mask = global_mask;

    if global_mask & HAS_LOCATION != 0 {
        let location_mask = reader.read_u8()?;

        if location_mask & LOCATION_COORDINATES != 0 {
            // wire order as documented by the vendor: latitude first
            let latitude = f64::from(reader.read_f32()?);
            let longitude = f64::from(reader.read_f32()?);
            record.location = Some(Position {
                longitude,
                latitude,
            });
        }

        if location_mask & LOCATION_ALTITUDE != 0 {
            let altitude = reader.read_u16()?;
            put_integer(record, names::ALTITUDE, altitude.into(), timestamp);
        }

        if location_mask & LOCATION_DIRECTION != 0 {
            let direction = u32::from(reader.read_u8()?) * 360 / 256;
            put_integer(record, names::DIRECTION, direction.into(), timestamp);
        }

        if location_mask & LOCATION_SPEED_SATELLITE != 0 {
            let speed = reader.read_u8()?;
            put_integer(record, names::SPEED_SATELLITE, speed.into(), timestamp);
        }

        if location_mask & LOCATION_SATELLITES != 0 {
            let satellites = reader.read_u8()?;
            put_integer(record, names::SATELLITES, satellites.into(), timestamp);
        }
    }

    Ok(())
}
