//! Durable append-only journal for the revision ledger.
//!
//! Every ledger mutation is framed, checksummed, and fsync'd to disk
//! before it becomes visible in memory. Replaying the journal from the
//! start reproduces the exact ledger state, ids and timestamps
//! included. The file is never rewritten; the only repair ever applied
//! is dropping a torn trailing record left by a crash mid-append.

pub mod error;
pub mod frame;
pub mod journal;
pub mod record;

pub use error::{JournalError, Result};
pub use journal::{JournalReader, JournalWriter};
pub use record::LedgerRecord;
