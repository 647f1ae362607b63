// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Durable ledger.
//!
//! Wraps the in-memory store and registry with the journal. Commit
//! barrier: every mutation is journaled (write + fsync) inside the
//! owning critical section, before it becomes visible to readers. A
//! failed journal append surfaces as `Storage` and the mutation never
//! happened.
//!
//! Lock order is fixed: project or job mutex first, journal mutex
//! second. The journal is the innermost lock everywhere, so the
//! serialization of mixed operations can never deadlock.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use traceline_core::clock;
use traceline_core::error::{CoreError, CoreResult};
use traceline_core::registry::{OverrideRequest, ViolationRegistry};
use traceline_core::store::{MemoryStore, NewVersion, VersionPage, VersionStore};
use traceline_core::types::{
    JobId, ProjectId, Version, VersionId, Violation, ViolationId, ViolationInput,
};
use traceline_persistence::{JournalWriter, LedgerRecord};

use crate::errors::EngineError;
use crate::recovery;

pub struct DurableLedger {
    store: MemoryStore,
    registry: Arc<ViolationRegistry>,
    journal: Mutex<JournalWriter>,
}

impl DurableLedger {
    /// Opens the journal (dropping a torn trailing record if a crash
    /// left one) and replays it into a fresh store and registry.
    /// Returns the ledger and the number of records replayed.
    pub fn open(path: &Path) -> Result<(Arc<Self>, u64), EngineError> {
        let writer = JournalWriter::open(path)?;
        if writer.recovered_torn_tail() {
            tracing::warn!(
                "Dropped a torn trailing record from {:?}; committed records are intact",
                path
            );
        }

        let store = MemoryStore::new();
        let registry = Arc::new(ViolationRegistry::new());
        let replayed = recovery::replay_journal(path, &store, &registry)?;

        Ok((
            Arc::new(Self {
                store,
                registry,
                journal: Mutex::new(writer),
            }),
            replayed,
        ))
    }

    pub fn registry(&self) -> &Arc<ViolationRegistry> {
        &self.registry
    }

    fn journal_record(&self, record: &LedgerRecord) -> CoreResult<()> {
        let start = Instant::now();
        let mut guard = self.journal.lock().unwrap();
        match guard.append(record) {
            Ok(_) => {
                metrics::histogram!(
                    "traceline_journal_append_duration_seconds",
                    start.elapsed().as_secs_f64()
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!("Journal append failed: {e}");
                Err(CoreError::Storage(e.to_string()))
            }
        }
    }

    /// Registry write path: journal first, then apply.
    pub fn record_violations(
        &self,
        job_id: &JobId,
        inputs: Vec<ViolationInput>,
    ) -> CoreResult<Vec<Violation>> {
        self.registry.record_with(job_id, inputs, |violations| {
            self.journal_record(&LedgerRecord::ViolationsRecorded {
                job_id: job_id.clone(),
                violations: violations.to_vec(),
            })
        })
    }

    pub fn override_violation(
        &self,
        job_id: &JobId,
        violation_id: &ViolationId,
        req: OverrideRequest,
    ) -> CoreResult<Violation> {
        self.registry
            .override_with(job_id, violation_id, req, |updated| {
                let record = updated
                    .override_record
                    .clone()
                    .ok_or_else(|| CoreError::Storage("override record missing".to_string()))?;
                self.journal_record(&LedgerRecord::ViolationOverridden {
                    job_id: job_id.clone(),
                    violation_id: violation_id.clone(),
                    record,
                })
            })
    }
}

impl VersionStore for DurableLedger {
    fn append(&self, project_id: &ProjectId, req: NewVersion) -> CoreResult<Version> {
        self.store.append_with(project_id, req, |version| {
            self.journal_record(&LedgerRecord::VersionAppended {
                version: version.clone(),
            })
        })
    }

    fn get(&self, version_id: &VersionId) -> CoreResult<Version> {
        self.store.get(version_id)
    }

    fn list(
        &self,
        project_id: &ProjectId,
        cursor: Option<u64>,
        limit: usize,
    ) -> CoreResult<VersionPage> {
        self.store.list(project_id, cursor, limit)
    }

    fn latest(&self, project_id: &ProjectId) -> CoreResult<Option<Version>> {
        self.store.latest(project_id)
    }

    fn approve(&self, version_id: &VersionId, approved_by: &str) -> CoreResult<Version> {
        self.store.approve_with(version_id, approved_by, |updated| {
            self.journal_record(&LedgerRecord::VersionApproved {
                version_id: updated.version_id.clone(),
                approved_by: approved_by.to_string(),
                at: clock::now_millis(),
            })
        })
    }
}
