//! IO element groups.
//!
//! After the location block, a record carries its device parameters
//! ("IO elements") in groups keyed by value width: 1, 2 and 4 byte groups
//! gated by the global mask, an 8-byte group for the standard codecs, and
//! for codec 8E one final group of variable-width values. Each element is a
//! parameter id plus that many raw bytes, handed to the resolver; the raw
//! slice is only borrowed for the duration of the resolver call.

use trackbee_types::{
    Attribute,
    Record,
};

use crate::{
    DecodeError,
    codec::{
        Codec,
        read_ext,
    },
    reader::Reader,
    resolver::ParameterResolver,
};

/// Global mask selecting all of the 1/2/4-byte groups plus the GH3000
/// location bit; the standard codecs always parse with this.
pub(super) const ALL_FIXED_GROUPS: u8 = 0x0F;

const GROUPS: [(u8, usize); 3] = [(0x02, 1), (0x04, 2), (0x08, 4)];

pub(super) fn read_io_elements(
    reader: &mut Reader<'_>,
    codec: Codec,
    global_mask: u8,
    record: &mut Record,
    resolver: &dyn ParameterResolver,
) -> Result<(), DecodeError> {
    for (bit, width) in GROUPS {
        if global_mask & bit != 0 {
            read_fixed_group(reader, codec, width, record, resolver)?;
        }
    }

    // the 8-byte group is unconditional for the standard codecs and absent
    // for GH3000
    if matches!(codec, Codec::Codec8 | Codec::Codec8Ext | Codec::Codec16) {
        read_fixed_group(reader, codec, 8, record, resolver)?;
    }

    if codec == Codec::Codec8Ext {
        let count = reader.read_u16()?;
        for _ in 0..count {
            let id = reader.read_u16()?;
            let length = reader.read_u16()?;
            let raw = reader.read_slice(length.into())?;
            resolve_into(record, resolver, id.into(), raw);
        }
    }

    Ok(())
}

fn read_fixed_group(
    reader: &mut Reader<'_>,
    codec: Codec,
    width: usize,
    record: &mut Record,
    resolver: &dyn ParameterResolver,
) -> Result<(), DecodeError> {
    let count = read_ext(reader, codec, &[Codec::Codec8Ext])?;
    for _ in 0..count {
        let id = read_ext(reader, codec, &[Codec::Codec8Ext, Codec::Codec16])?;
        let raw = reader.read_slice(width)?;
        resolve_into(record, resolver, id.into(), raw);
    }
    Ok(())
}

fn resolve_into(record: &mut Record, resolver: &dyn ParameterResolver, id: u32, raw: &[u8]) {
    match resolver.resolve(id, raw) {
        Some(resolved) => {
            record.attributes.insert(
                resolved.name,
                Attribute {
                    value: resolved.value,
                    timestamp: record.timestamp,
                },
            );
        }
        None => {
            tracing::debug!(id, length = raw.len(), "io element not resolved, dropped");
        }
    }
}
