//! Append-only journal file.
//!
//! # File format
//! ```text
//! [Header: 16 bytes][Frame][Frame][Frame]...
//! ```
//!
//! Header:
//! - magic: `TRCL`
//! - version: u32 (1)
//! - reserved: u64 (0)
//!
//! # Safety guarantees
//! - `append` returns only after write + fsync
//! - No truncation or rewriting of committed records
//! - Reopening scans the tail; a torn final record (crash mid-append)
//!   is cut off before new appends, committed records are untouched

use crate::error::{JournalError, Result};
use crate::frame::{self, FrameHeader};
use crate::record::LedgerRecord;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const MAGIC: [u8; 4] = *b"TRCL";
const FORMAT_VERSION: u32 = 1;
const HEADER_SIZE: u64 = 16;

fn header_bytes() -> [u8; HEADER_SIZE as usize] {
    let mut bytes = [0u8; HEADER_SIZE as usize];
    bytes[0..4].copy_from_slice(&MAGIC);
    bytes[4..8].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes
}

fn validate_header(bytes: &[u8; HEADER_SIZE as usize]) -> Result<()> {
    if bytes[0..4] != MAGIC {
        return Err(JournalError::InvalidMagic);
    }
    let version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
    if version != FORMAT_VERSION {
        return Err(JournalError::UnsupportedVersion(version));
    }
    Ok(())
}

struct ScanOutcome {
    records: u64,
    /// Byte offset of the end of the last intact record.
    valid_len: u64,
    /// True when bytes past `valid_len` had to be dropped.
    torn_tail: bool,
}

/// Walks frames without decoding payloads, verifying checksums, and
/// finds where the intact prefix ends.
fn scan(file: &mut File) -> Result<ScanOutcome> {
    file.seek(SeekFrom::Start(HEADER_SIZE))?;
    let file_len = file.metadata()?.len();
    let mut reader = BufReader::new(file);

    let mut records = 0u64;
    let mut valid_len = HEADER_SIZE;

    loop {
        let remaining = file_len - valid_len;
        if remaining == 0 {
            return Ok(ScanOutcome {
                records,
                valid_len,
                torn_tail: false,
            });
        }
        if remaining < FrameHeader::SIZE as u64 {
            break;
        }
        let header = FrameHeader::read_from(&mut reader)?;
        if header.seq != records {
            break;
        }
        if remaining < FrameHeader::SIZE as u64 + header.payload_len as u64 {
            break;
        }
        let mut payload = vec![0u8; header.payload_len as usize];
        reader.read_exact(&mut payload)?;
        if frame::verify(&header, &payload).is_err() {
            break;
        }
        records += 1;
        valid_len += FrameHeader::SIZE as u64 + header.payload_len as u64;
    }

    Ok(ScanOutcome {
        records,
        valid_len,
        torn_tail: true,
    })
}

/// Append-only journal writer.
///
/// Only returns from `append` after the record is durable.
pub struct JournalWriter {
    path: PathBuf,
    file: File,
    record_count: u64,
    recovered_torn_tail: bool,
}

impl JournalWriter {
    /// Opens or creates a journal. An existing file has its header
    /// validated and its tail scanned; a torn final record is cut off.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file_exists = path.exists();

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)?;

        let mut record_count = 0;
        let mut recovered_torn_tail = false;

        if file_exists && file.metadata()?.len() > 0 {
            let mut header = [0u8; HEADER_SIZE as usize];
            file.read_exact(&mut header)?;
            validate_header(&header)?;

            let outcome = scan(&mut file)?;
            record_count = outcome.records;
            recovered_torn_tail = outcome.torn_tail;
            if outcome.torn_tail {
                file.set_len(outcome.valid_len)?;
                file.sync_all()?;
            }
        } else {
            file.write_all(&header_bytes())?;
            file.sync_all()?;
        }

        file.seek(SeekFrom::End(0))?;

        Ok(Self {
            path,
            file,
            record_count,
            recovered_torn_tail,
        })
    }

    /// Appends one record. Durable (fsync'd) before returning; the
    /// caller may only make the mutation visible after this succeeds.
    pub fn append(&mut self, record: &LedgerRecord) -> Result<u64> {
        let payload = record.encode()?;
        let header = frame::frame(self.record_count, &payload);

        let mut buf = Vec::with_capacity(FrameHeader::SIZE + payload.len());
        header.write_to(&mut buf)?;
        buf.extend_from_slice(&payload);

        self.file.write_all(&buf)?;
        self.file.sync_data()?;

        let seq = self.record_count;
        self.record_count += 1;
        Ok(seq)
    }

    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// True when opening had to drop a torn trailing record.
    pub fn recovered_torn_tail(&self) -> bool {
        self.recovered_torn_tail
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Sequential journal reader. Verifies checksums and sequence order.
pub struct JournalReader {
    reader: BufReader<File>,
    next_seq: u64,
}

impl JournalReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header)?;
        validate_header(&header)?;
        Ok(Self {
            reader: BufReader::new(file),
            next_seq: 0,
        })
    }
}

impl Iterator for JournalReader {
    type Item = Result<LedgerRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let header = match FrameHeader::read_from(&mut self.reader) {
            Ok(h) => h,
            Err(JournalError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return None
            }
            Err(e) => return Some(Err(e)),
        };

        if header.seq != self.next_seq {
            return Some(Err(JournalError::OutOfSequence {
                expected: self.next_seq,
                found: header.seq,
            }));
        }

        let mut payload = vec![0u8; header.payload_len as usize];
        if let Err(e) = self.reader.read_exact(&mut payload) {
            return Some(Err(JournalError::Io(e)));
        }
        if let Err(e) = frame::verify(&header, &payload) {
            return Some(Err(e));
        }

        self.next_seq += 1;
        Some(LedgerRecord::decode(&payload))
    }
}
