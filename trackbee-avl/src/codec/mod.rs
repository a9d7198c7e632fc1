//! The AVL codec family.
//!
//! A single byte in every data frame selects which of several incompatible
//! binary layouts encodes the records that follow. The codecs share the
//! record model but differ structurally: the standard location codecs
//! (8, 8E, 16) carry a fixed position block plus IO elements, GH3000 uses
//! per-field presence bitmasks, and codecs 12 to 15 carry serial, text or
//! opaque payloads with no IO elements at all.

mod gh3000;
mod io;
mod location;
mod opaque;
mod serial;
mod text;

pub use self::opaque::extract_printable_ascii;

use crate::{
    DecodeError,
    reader::Reader,
    resolver::ParameterResolver,
};
use trackbee_types::Record;

/// Codec identifier byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Codec {
    /// Compact location format with explicit per-field bitmasks.
    Gh3000,
    /// The standard AVL format, 1-byte ids and counts.
    Codec8,
    /// Standard format with 2-byte ids/counts and a variable-width IO group.
    Codec8Ext,
    /// Serial/camera payload.
    Codec12,
    /// Text command.
    Codec13,
    /// Opaque payload, no embedded timestamp.
    Codec14,
    /// Opaque payload with an embedded timestamp.
    Codec15,
    /// Standard format plus a generation byte, 2-byte event/element ids.
    Codec16,
}

impl Codec {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x07 => Some(Self::Gh3000),
            0x08 => Some(Self::Codec8),
            0x8E => Some(Self::Codec8Ext),
            0x0C => Some(Self::Codec12),
            0x0D => Some(Self::Codec13),
            0x0E => Some(Self::Codec14),
            0x0F => Some(Self::Codec15),
            0x10 => Some(Self::Codec16),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Codec::Gh3000 => "codec_gh3000",
            Codec::Codec8 => "codec_8",
            Codec::Codec8Ext => "codec_8e",
            Codec::Codec12 => "codec_12",
            Codec::Codec13 => "codec_13",
            Codec::Codec14 => "codec_14",
            Codec::Codec15 => "codec_15",
            Codec::Codec16 => "codec_16",
        }
    }

    /// Data frames for these codecs are acknowledged with the 4-byte
    /// record-count reply on TCP; the message-style codecs are not.
    pub fn wants_data_ack(&self) -> bool {
        !matches!(
            self,
            Codec::Codec12 | Codec::Codec13 | Codec::Codec14 | Codec::Codec15
        )
    }
}

/// Attribute names used by the codec parsers themselves. IO element names
/// come from the parameter resolver instead.
pub mod names {
    pub const PRIORITY: &str = "priority";
    pub const ALTITUDE: &str = "altitude";
    pub const DIRECTION: &str = "direction";
    pub const SATELLITES: &str = "satellites";
    pub const SPEED: &str = "speed";
    pub const SPEED_SATELLITE: &str = "speedSatellite";
    pub const EVENT_TRIGGERED: &str = "eventTriggered";
    pub const CAMERA_DATA: &str = "cameraData";
    pub const SERIAL_DATA: &str = "serialData";
    pub const TEXT_COMMAND: &str = "textCommand";
    pub const CODEC_MESSAGE_TYPE: &str = "codecMessageType";
}

/// Reads a count/length/id field that widens from 1 to 2 bytes for certain
/// codec variants (always the extended 8E codec, sometimes also codec 16).
pub fn read_ext(
    reader: &mut Reader<'_>,
    codec: Codec,
    widen_for: &[Codec],
) -> Result<u16, DecodeError> {
    if widen_for.contains(&codec) {
        reader.read_u16()
    }
    else {
        reader.read_u8().map(u16::from)
    }
}

/// Parses one record body at the cursor into `record`.
///
/// The caller has already stamped provenance (imei, codec name, protocol
/// id, transport). Attribute timestamps are aligned to the record timestamp
/// once parsing completes.
pub fn parse_record(
    reader: &mut Reader<'_>,
    codec: Codec,
    record: &mut Record,
    resolver: &dyn ParameterResolver,
) -> Result<(), DecodeError> {
    match codec {
        Codec::Codec12 => serial::parse(reader, record)?,
        Codec::Codec13 => text::parse(reader, record)?,
        Codec::Codec14 | Codec::Codec15 => opaque::parse(reader, codec, record)?,
        Codec::Gh3000 => {
            gh3000::parse(reader, record)?;
            let global_mask = record.global_mask;
            io::read_io_elements(reader, codec, global_mask, record, resolver)?;
        }
        Codec::Codec8 | Codec::Codec8Ext | Codec::Codec16 => {
            location::parse(reader, codec, record)?;
            io::read_io_elements(reader, codec, io::ALL_FIXED_GROUPS, record, resolver)?;
        }
    }

    record.align_attribute_timestamps();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Codec;

    #[test]
    fn codec_bytes_round_trip() {
        for (byte, codec) in [
            (0x07, Codec::Gh3000),
            (0x08, Codec::Codec8),
            (0x8E, Codec::Codec8Ext),
            (0x0C, Codec::Codec12),
            (0x0D, Codec::Codec13),
            (0x0E, Codec::Codec14),
            (0x0F, Codec::Codec15),
            (0x10, Codec::Codec16),
        ] {
            assert_eq!(Codec::from_byte(byte), Some(codec));
        }
        assert_eq!(Codec::from_byte(0x99), None);
        assert_eq!(Codec::from_byte(0x00), None);
    }

    #[test]
    fn message_codecs_skip_the_data_ack() {
        assert!(Codec::Codec8.wants_data_ack());
        assert!(Codec::Codec8Ext.wants_data_ack());
        assert!(Codec::Codec16.wants_data_ack());
        assert!(Codec::Gh3000.wants_data_ack());
        assert!(!Codec::Codec12.wants_data_ack());
        assert!(!Codec::Codec13.wants_data_ack());
        assert!(!Codec::Codec14.wants_data_ack());
        assert!(!Codec::Codec15.wants_data_ack());
    }
}
