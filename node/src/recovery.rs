// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Crash recovery.
//!
//! The journal is the canonical truth. Recovery replays every
//! committed record into a fresh store and registry through the core
//! restore entry points, reproducing ids, tags, timestamps, and
//! override state exactly. Deterministic: same journal, same state.

use std::path::Path;
use std::time::Instant;

use traceline_core::registry::ViolationRegistry;
use traceline_core::store::MemoryStore;
use traceline_core::types::version::VersionStatus;
use traceline_persistence::{JournalReader, LedgerRecord};

use crate::errors::EngineError;

/// Replays the journal at `path`. Returns the number of records
/// applied. The caller is expected to have opened the writer first so
/// a torn tail is already cut off; any read error here is real
/// corruption and fails recovery rather than silently dropping
/// history.
pub fn replay_journal(
    path: &Path,
    store: &MemoryStore,
    registry: &ViolationRegistry,
) -> Result<u64, EngineError> {
    let start = Instant::now();
    let reader = JournalReader::open(path)?;

    let mut applied = 0u64;
    for result in reader {
        match result? {
            LedgerRecord::VersionAppended { version } => {
                store.restore_version(version)?;
            }
            LedgerRecord::VersionApproved { version_id, .. } => {
                store.restore_status(&version_id, VersionStatus::Approved)?;
            }
            LedgerRecord::ViolationsRecorded { job_id, violations } => {
                registry.restore_run(&job_id, violations);
            }
            LedgerRecord::ViolationOverridden {
                job_id,
                violation_id,
                record,
            } => {
                registry.restore_override(&job_id, &violation_id, record)?;
            }
        }
        applied += 1;
    }

    metrics::histogram!(
        "traceline_replay_duration_seconds",
        start.elapsed().as_secs_f64()
    );
    tracing::info!("Replayed {} journal records from {:?}", applied, path);
    Ok(applied)
}
