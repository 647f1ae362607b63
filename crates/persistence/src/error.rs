use thiserror::Error;
use std::io;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Invalid magic bytes in header")]
    InvalidMagic,
    #[error("Unsupported journal format version {0}")]
    UnsupportedVersion(u32),
    #[error("Checksum mismatch: expected {expected}, found {found}")]
    ChecksumMismatch {
        expected: u64,
        found: u64,
    },
    #[error("Record out of sequence: expected {expected}, found {found}")]
    OutOfSequence {
        expected: u64,
        found: u64,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid record payload: {0}")]
    Codec(String),
}

pub type Result<T> = std::result::Result<T, JournalError>;
