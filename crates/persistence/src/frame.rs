//! Record framing.
//!
//! Each journal record is preceded by a fixed 20-byte header:
//! sequence number, payload length, and a CRC64 over header fields and
//! payload. The checksum catches both bit rot and a crash mid-append.

use crate::error::{JournalError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc64fast::Digest;
use std::io::{Read, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub seq: u64,
    pub payload_len: u32,
    pub checksum: u64,
}

impl FrameHeader {
    pub const SIZE: usize = 8 + 4 + 8; // 20 bytes

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let seq = reader.read_u64::<LittleEndian>()?;
        let payload_len = reader.read_u32::<LittleEndian>()?;
        let checksum = reader.read_u64::<LittleEndian>()?;
        Ok(Self {
            seq,
            payload_len,
            checksum,
        })
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_u64::<LittleEndian>(self.seq)?;
        writer.write_u32::<LittleEndian>(self.payload_len)?;
        writer.write_u64::<LittleEndian>(self.checksum)?;
        Ok(())
    }
}

pub fn checksum(seq: u64, payload: &[u8]) -> u64 {
    let mut digest = Digest::new();
    digest.write(&seq.to_le_bytes());
    digest.write(&(payload.len() as u32).to_le_bytes());
    digest.write(payload);
    digest.sum64()
}

/// Builds the frame for a payload at the given sequence position.
pub fn frame(seq: u64, payload: &[u8]) -> FrameHeader {
    FrameHeader {
        seq,
        payload_len: payload.len() as u32,
        checksum: checksum(seq, payload),
    }
}

/// Verifies a header against its payload.
pub fn verify(header: &FrameHeader, payload: &[u8]) -> Result<()> {
    let found = checksum(header.seq, payload);
    if found != header.checksum {
        return Err(JournalError::ChecksumMismatch {
            expected: header.checksum,
            found,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let payload = b"hello ledger";
        let header = frame(7, payload);

        let mut bytes = Vec::new();
        header.write_to(&mut bytes).unwrap();
        assert_eq!(bytes.len(), FrameHeader::SIZE);

        let decoded = FrameHeader::read_from(&bytes[..]).unwrap();
        assert_eq!(header, decoded);
        verify(&decoded, payload).unwrap();
    }

    #[test]
    fn flipped_payload_bit_fails_verification() {
        let payload = b"hello ledger".to_vec();
        let header = frame(7, &payload);

        let mut corrupted = payload.clone();
        corrupted[0] ^= 0x01;
        assert!(matches!(
            verify(&header, &corrupted),
            Err(JournalError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn checksum_binds_the_sequence_number() {
        let payload = b"hello ledger";
        let header = frame(7, payload);
        let moved = FrameHeader { seq: 8, ..header };
        assert!(verify(&moved, payload).is_err());
    }
}
