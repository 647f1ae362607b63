// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! In-memory version store.
//!
//! Commit-barrier semantics: every mutating method takes a pre-commit
//! hook that runs inside the owning critical section, after the
//! candidate record is fully built but before it becomes visible. A
//! durable wrapper persists there; if the hook fails, the mutation is
//! discarded and no state change is observable.
//!
//! Locking:
//! - one mutex per project ledger (single writer per project, so tags
//!   are unique and gap-free)
//! - a read-write map from version id to owning project
//! - projects never share a lock, so cross-project operations are
//!   fully independent

use crate::clock;
use crate::error::{CoreError, CoreResult};
use crate::store::{NewVersion, VersionPage, VersionStore};
use crate::types::id::{ProjectId, VersionId};
use crate::types::version::{Version, VersionStatus};
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, RwLock};

pub const MAX_PAGE_SIZE: usize = 500;
pub const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Default)]
struct ProjectLedger {
    /// Ascending by tag; tag of versions[i] is i + 1.
    versions: Vec<Version>,
}

#[derive(Default)]
pub struct MemoryStore {
    projects: RwLock<FxHashMap<ProjectId, Arc<Mutex<ProjectLedger>>>>,
    index: RwLock<FxHashMap<VersionId, ProjectId>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ledger(&self, project_id: &ProjectId) -> Arc<Mutex<ProjectLedger>> {
        if let Some(ledger) = self.projects.read().unwrap().get(project_id) {
            return ledger.clone();
        }
        let mut guard = self.projects.write().unwrap();
        guard
            .entry(project_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(ProjectLedger::default())))
            .clone()
    }

    fn existing_ledger(&self, project_id: &ProjectId) -> Option<Arc<Mutex<ProjectLedger>>> {
        self.projects.read().unwrap().get(project_id).cloned()
    }

    /// Append with a durable-write hook. The hook sees the finished
    /// candidate (id, tag, timestamp assigned) and its failure aborts
    /// the append with no visible state change.
    pub fn append_with<F>(
        &self,
        project_id: &ProjectId,
        req: NewVersion,
        pre_commit: F,
    ) -> CoreResult<Version>
    where
        F: FnOnce(&Version) -> CoreResult<()>,
    {
        let ledger = self.ledger(project_id);
        let mut guard = ledger.lock().unwrap();

        let tag = guard.versions.last().map(|v| v.tag).unwrap_or(0) + 1;
        let version = Version {
            version_id: VersionId::generate(),
            project_id: project_id.clone(),
            tag,
            status: req.status,
            created_at: clock::now_millis(),
            created_by: req.created_by,
            description: req.description,
            lineage_of: req.lineage_of,
            snapshot: req.snapshot,
        };

        pre_commit(&version)?;

        self.index
            .write()
            .unwrap()
            .insert(version.version_id.clone(), project_id.clone());
        guard.versions.push(version.clone());
        Ok(version)
    }

    /// Approve with a durable-write hook. Idempotent for approved
    /// versions (the hook is not invoked again).
    pub fn approve_with<F>(
        &self,
        version_id: &VersionId,
        _approved_by: &str,
        pre_commit: F,
    ) -> CoreResult<Version>
    where
        F: FnOnce(&Version) -> CoreResult<()>,
    {
        let project_id = self.owning_project(version_id)?;
        let ledger = self.ledger(&project_id);
        let mut guard = ledger.lock().unwrap();

        let slot = guard
            .versions
            .iter_mut()
            .find(|v| v.version_id == *version_id)
            .ok_or_else(|| CoreError::not_found("version", version_id.to_string()))?;

        match slot.status {
            VersionStatus::Approved => Ok(slot.clone()),
            VersionStatus::Rollback => Err(CoreError::Conflict(format!(
                "version {} has status rollback; only drafts can be approved",
                version_id
            ))),
            VersionStatus::Draft => {
                let mut updated = slot.clone();
                updated.status = VersionStatus::Approved;
                pre_commit(&updated)?;
                *slot = updated.clone();
                Ok(updated)
            }
        }
    }

    fn owning_project(&self, version_id: &VersionId) -> CoreResult<ProjectId> {
        self.index
            .read()
            .unwrap()
            .get(version_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("version", version_id.to_string()))
    }

    /// Recovery entry point: re-insert a version exactly as journaled.
    /// Tags must arrive in ledger order; a gap means the journal is
    /// inconsistent with the store invariants.
    pub fn restore_version(&self, version: Version) -> CoreResult<()> {
        let ledger = self.ledger(&version.project_id);
        let mut guard = ledger.lock().unwrap();

        let expected = guard.versions.last().map(|v| v.tag).unwrap_or(0) + 1;
        if version.tag != expected {
            return Err(CoreError::Storage(format!(
                "journal replay out of order for project {}: got tag {}, expected {}",
                version.project_id, version.tag, expected
            )));
        }

        self.index
            .write()
            .unwrap()
            .insert(version.version_id.clone(), version.project_id.clone());
        guard.versions.push(version);
        Ok(())
    }

    /// Recovery entry point for a journaled status change.
    pub fn restore_status(&self, version_id: &VersionId, status: VersionStatus) -> CoreResult<()> {
        let project_id = self.owning_project(version_id)?;
        let ledger = self.ledger(&project_id);
        let mut guard = ledger.lock().unwrap();
        let slot = guard
            .versions
            .iter_mut()
            .find(|v| v.version_id == *version_id)
            .ok_or_else(|| CoreError::not_found("version", version_id.to_string()))?;
        slot.status = status;
        Ok(())
    }
}

impl VersionStore for MemoryStore {
    fn append(&self, project_id: &ProjectId, req: NewVersion) -> CoreResult<Version> {
        self.append_with(project_id, req, |_| Ok(()))
    }

    fn get(&self, version_id: &VersionId) -> CoreResult<Version> {
        let project_id = self.owning_project(version_id)?;
        let ledger = self.ledger(&project_id);
        let guard = ledger.lock().unwrap();
        guard
            .versions
            .iter()
            .find(|v| v.version_id == *version_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("version", version_id.to_string()))
    }

    fn list(
        &self,
        project_id: &ProjectId,
        cursor: Option<u64>,
        limit: usize,
    ) -> CoreResult<VersionPage> {
        let limit = match limit {
            0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        };
        let Some(ledger) = self.existing_ledger(project_id) else {
            // A project with no versions yet has an empty, valid history.
            return Ok(VersionPage {
                versions: Vec::new(),
                next_cursor: None,
            });
        };
        let guard = ledger.lock().unwrap();

        let start = cursor.map(|c| c as usize).unwrap_or(0);
        let page: Vec<Version> = guard
            .versions
            .iter()
            .skip(start)
            .take(limit)
            .cloned()
            .collect();
        let next_cursor = match page.last() {
            Some(last) if (last.tag as usize) < guard.versions.len() => Some(last.tag),
            _ => None,
        };

        Ok(VersionPage {
            versions: page,
            next_cursor,
        })
    }

    fn latest(&self, project_id: &ProjectId) -> CoreResult<Option<Version>> {
        let Some(ledger) = self.existing_ledger(project_id) else {
            return Ok(None);
        };
        let guard = ledger.lock().unwrap();
        Ok(guard.versions.last().cloned())
    }

    fn approve(&self, version_id: &VersionId, approved_by: &str) -> CoreResult<Version> {
        self.approve_with(version_id, approved_by, |_| Ok(()))
    }
}
