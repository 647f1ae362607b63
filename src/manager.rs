// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Version manager.
//!
//! Orchestrates the ledger: create, list, get, compare, approve,
//! rollback. Status transitions and lineage rules live here and in the
//! store; the manager never mutates a snapshot. A tag conflict from an
//! optimistic store is retried exactly once with a fresh tag; every
//! other error propagates untouched.

use crate::diff::{flatten, Comparison, DiffEngine};
use crate::error::{CoreError, CoreResult};
use crate::store::{NewVersion, VersionPage, VersionStore};
use crate::types::id::{ProjectId, VersionId};
use crate::types::snapshot::DesignSnapshot;
use crate::types::version::{Version, VersionStatus, VersionSummary};
use std::sync::Arc;

pub struct VersionManager<S: VersionStore> {
    store: Arc<S>,
    diff: DiffEngine,
}

impl<S: VersionStore> VersionManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            diff: DiffEngine,
        }
    }

    /// Saves a new draft version at calculation-run completion or on
    /// explicit save.
    pub fn create_version(
        &self,
        project_id: &ProjectId,
        snapshot: DesignSnapshot,
        created_by: &str,
        description: &str,
    ) -> CoreResult<Version> {
        self.append_with_retry(project_id, NewVersion::draft(snapshot, created_by, description))
    }

    /// `draft -> approved`; idempotent for approved versions.
    pub fn approve_version(&self, version_id: &VersionId, approved_by: &str) -> CoreResult<Version> {
        self.store.approve(version_id, approved_by)
    }

    /// Creates a brand-new version carrying a deep copy of the
    /// target's snapshot, `status = rollback`, lineage pointing at the
    /// target. The target itself is never touched.
    pub fn rollback_version(
        &self,
        project_id: &ProjectId,
        version_id: &VersionId,
        requested_by: &str,
    ) -> CoreResult<Version> {
        let target = self.store.get(version_id)?;
        if target.project_id != *project_id {
            return Err(CoreError::CrossProjectMismatch {
                version: version_id.to_string(),
                expected: project_id.to_string(),
                actual: target.project_id.to_string(),
            });
        }

        let req = NewVersion {
            snapshot: target.snapshot.clone(),
            created_by: requested_by.to_string(),
            description: format!("Rollback of v{}", target.tag),
            status: VersionStatus::Rollback,
            lineage_of: Some(target.version_id.clone()),
        };
        self.append_with_retry(project_id, req)
    }

    /// Structured diff of the two versions' flattened parameter maps.
    pub fn compare_versions(&self, from_id: &VersionId, to_id: &VersionId) -> CoreResult<Comparison> {
        let from = self.store.get(from_id)?;
        let to = self.store.get(to_id)?;
        Ok(self.diff.diff(
            &flatten(&from.snapshot.input_parameters),
            &flatten(&to.snapshot.input_parameters),
        ))
    }

    pub fn get_version(&self, version_id: &VersionId) -> CoreResult<Version> {
        self.store.get(version_id)
    }

    pub fn list_versions(
        &self,
        project_id: &ProjectId,
        cursor: Option<u64>,
        limit: usize,
    ) -> CoreResult<VersionPage> {
        self.store.list(project_id, cursor, limit)
    }

    pub fn latest_version(&self, project_id: &ProjectId) -> CoreResult<Option<Version>> {
        self.store.latest(project_id)
    }

    /// Full history as summary rows, walking every page.
    pub fn history(&self, project_id: &ProjectId) -> CoreResult<Vec<VersionSummary>> {
        let mut out = Vec::new();
        let mut cursor = None;
        loop {
            let page = self.store.list(project_id, cursor, 0)?;
            out.extend(page.versions.iter().map(Version::summary));
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => return Ok(out),
            }
        }
    }

    fn append_with_retry(&self, project_id: &ProjectId, req: NewVersion) -> CoreResult<Version> {
        match self.store.append(project_id, req.clone()) {
            // Lost a tag race against a concurrent writer: one retry
            // picks up the next free tag.
            Err(CoreError::Conflict(_)) => self.store.append(project_id, req),
            other => other,
        }
    }
}
