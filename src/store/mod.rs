// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Version storage.
//!
//! The ledger is append-only: a version is written once and only its
//! `status` field may change afterwards (draft to approved). Tag
//! allocation is atomic per project. Any durable backend qualifies as
//! long as those invariants hold; [`MemoryStore`] is the canonical
//! in-process implementation and the substrate the node crate journals
//! on top of.

pub mod memory;

pub use memory::MemoryStore;

use crate::error::CoreResult;
use crate::types::id::{ProjectId, VersionId};
use crate::types::snapshot::DesignSnapshot;
use crate::types::version::{Version, VersionStatus};

/// Creation request. `status` is `Draft` for ordinary saves and
/// `Rollback` (with `lineage_of` set) when fabricated by a rollback.
#[derive(Clone, Debug)]
pub struct NewVersion {
    pub snapshot: DesignSnapshot,
    pub created_by: String,
    pub description: String,
    pub status: VersionStatus,
    pub lineage_of: Option<VersionId>,
}

impl NewVersion {
    pub fn draft(snapshot: DesignSnapshot, created_by: &str, description: &str) -> Self {
        Self {
            snapshot,
            created_by: created_by.to_string(),
            description: description.to_string(),
            status: VersionStatus::Draft,
            lineage_of: None,
        }
    }
}

/// One page of a project's history, ascending by tag.
#[derive(Clone, Debug)]
pub struct VersionPage {
    pub versions: Vec<Version>,
    /// Tag to pass as the next cursor; absent on the last page.
    pub next_cursor: Option<u64>,
}

pub trait VersionStore: Send + Sync {
    /// Allocates the next tag atomically and persists the new version
    /// with `status` as requested. All-or-nothing: a failure leaves no
    /// trace.
    fn append(&self, project_id: &ProjectId, req: NewVersion) -> CoreResult<Version>;

    /// Fails `NotFound` if absent.
    fn get(&self, version_id: &VersionId) -> CoreResult<Version>;

    /// Versions with `tag > cursor`, ascending, at most `limit` rows.
    fn list(
        &self,
        project_id: &ProjectId,
        cursor: Option<u64>,
        limit: usize,
    ) -> CoreResult<VersionPage>;

    /// Highest-tag version of the project, if any.
    fn latest(&self, project_id: &ProjectId) -> CoreResult<Option<Version>>;

    /// `draft -> approved` transition. Idempotent for already-approved
    /// versions; `Conflict` for rollback-status versions.
    fn approve(&self, version_id: &VersionId, approved_by: &str) -> CoreResult<Version>;
}
