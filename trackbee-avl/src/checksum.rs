//! Frame checksum.
//!
//! Data frames carry a CRC-16/ARC (reflected, polynomial 0xA001, initial
//! value 0) over the payload between the length field and the checksum
//! itself. The received value is authoritative for frame acceptance, so the
//! computation must match the device bit-for-bit.

use crc::{
    CRC_16_ARC,
    Crc,
};

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_ARC);

pub fn crc16(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}
