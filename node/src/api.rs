// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Request and response bodies for the HTTP surface.
//!
//! Domain types (Version, Violation, Comparison) serialize directly in
//! responses; the DTOs here exist where the wire shape differs from
//! the domain shape, mainly because snapshots arrive without a content
//! hash and timestamps are always server-assigned.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use traceline_core::types::{
    CalculationEntry, DesignSnapshot, OutputFileRef, Version, VersionId, ViolationInput,
};

/// Snapshot as supplied by the calculation engine. The content hash is
/// computed server-side on ingestion.
#[derive(Clone, Debug, Deserialize)]
pub struct SnapshotPayload {
    pub input_parameters: BTreeMap<String, Value>,
    #[serde(default)]
    pub calculation_log: Vec<CalculationEntry>,
    #[serde(default)]
    pub output_files: Vec<OutputFileRef>,
}

impl SnapshotPayload {
    pub fn into_snapshot(self) -> DesignSnapshot {
        DesignSnapshot::new(self.input_parameters, self.calculation_log, self.output_files)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateVersionRequest {
    pub project_id: String,
    pub snapshot: SnapshotPayload,
    pub created_by: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ListVersionsQuery {
    #[serde(default)]
    pub cursor: Option<u64>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ListVersionsResponse {
    pub versions: Vec<Version>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct CompareVersionsRequest {
    pub from: VersionId,
    pub to: VersionId,
}

#[derive(Debug, Deserialize)]
pub struct ApproveVersionRequest {
    pub approved_by: String,
}

#[derive(Debug, Deserialize)]
pub struct RollbackRequest {
    pub version_id: VersionId,
    #[serde(default = "default_requested_by")]
    pub requested_by: String,
}

fn default_requested_by() -> String {
    "system".to_string()
}

#[derive(Debug, Deserialize)]
pub struct RecordViolationsRequest {
    pub violations: Vec<ViolationInput>,
}

#[derive(Debug, Deserialize)]
pub struct OverrideViolationRequest {
    pub job_id: String,
    pub engineer_id: String,
    pub engineer_name: String,
    pub reason: String,
    #[serde(default)]
    pub reference_doc: Option<String>,
}
