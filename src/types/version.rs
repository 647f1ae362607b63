// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Version records.

use crate::types::id::{ProjectId, VersionId};
use crate::types::snapshot::DesignSnapshot;
use serde::{Deserialize, Serialize};

/// Lifecycle status. `draft --approve--> approved` is the only
/// transition; `rollback` is an initial status fabricated by
/// `rollback_version` and never reached by transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    Draft,
    Approved,
    Rollback,
}

/// One immutable revision of a project's design. Only `status` may
/// change after creation; the snapshot never does.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub version_id: VersionId,
    pub project_id: ProjectId,
    /// Monotonic per-project revision number, gap-free, starting at 1.
    pub tag: u64,
    pub status: VersionStatus,
    /// Epoch milliseconds, server-assigned.
    pub created_at: u64,
    pub created_by: String,
    pub description: String,
    /// Parent version for rollback-created versions, absent otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineage_of: Option<VersionId>,
    pub snapshot: DesignSnapshot,
}

/// History row: everything an auditor scans, without the snapshot body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VersionSummary {
    pub version_id: VersionId,
    pub tag: u64,
    pub status: VersionStatus,
    pub created_at: u64,
    pub created_by: String,
    pub description: String,
    pub content_hash: String,
}

impl Version {
    pub fn summary(&self) -> VersionSummary {
        VersionSummary {
            version_id: self.version_id.clone(),
            tag: self.tag,
            status: self.status,
            created_at: self.created_at,
            created_by: self.created_by.clone(),
            description: self.description.clone(),
            content_hash: self.snapshot.content_hash.clone(),
        }
    }
}
