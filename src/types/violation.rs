// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Standards violations and override records.

use crate::types::id::{JobId, ViolationId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks export until overridden.
    Critical,
    Warning,
    Info,
}

/// Violation as supplied by the calculation engine for one run. The
/// registry assigns the id and owns the override state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViolationInput {
    /// Rule code, e.g. `VL-001` or `surface_loading_max`.
    pub code: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub parameter: Option<String>,
    #[serde(default)]
    pub actual_value: Option<Value>,
    #[serde(default)]
    pub limit_value: Option<Value>,
    /// Standard + clause, e.g. `TCVN 7957:2008 7.2`.
    #[serde(default)]
    pub reference: Option<String>,
}

/// Audit record of the one authoritative override of a violation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverrideRecord {
    pub engineer_id: String,
    pub engineer_name: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_doc: Option<String>,
    /// Epoch milliseconds, server-assigned.
    pub overridden_at: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub id: ViolationId,
    pub job_id: JobId,
    pub code: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub parameter: Option<String>,
    #[serde(default)]
    pub actual_value: Option<Value>,
    #[serde(default)]
    pub limit_value: Option<Value>,
    #[serde(default)]
    pub reference: Option<String>,
    /// Monotonic: false at creation, flips to true exactly once.
    pub overridden: bool,
    #[serde(
        default,
        rename = "override",
        skip_serializing_if = "Option::is_none"
    )]
    pub override_record: Option<OverrideRecord>,
}

impl Violation {
    pub fn from_input(job_id: JobId, input: ViolationInput) -> Self {
        Self {
            id: ViolationId::generate(),
            job_id,
            code: input.code,
            severity: input.severity,
            message: input.message,
            parameter: input.parameter,
            actual_value: input.actual_value,
            limit_value: input.limit_value,
            reference: input.reference,
            overridden: false,
            override_record: None,
        }
    }

    /// Open means export-blocking: critical and not yet overridden.
    pub fn is_open(&self) -> bool {
        self.severity == Severity::Critical && !self.overridden
    }
}
