// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Design snapshots.
//!
//! A snapshot is the captured state of one calculation run: the input
//! parameters, the ordered calculation trail, and references to the
//! generated output files. Snapshots are immutable once bound to a
//! version; rollback copies a snapshot into a new version rather than
//! touching the original.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One step of the calculation trail. Opaque to the ledger: stored,
/// diffed at the run level by step result only, never reinterpreted
/// numerically.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalculationEntry {
    pub step_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Formula in plain text, e.g. `V = Q * t / 24`.
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub inputs: BTreeMap<String, Value>,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub unit: String,
    /// Standard reference, e.g. `TCVN 7957:2008 7.2`.
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub timestamp: u64,
}

/// Opaque reference to a generated file (DXF, IFC, PDF report).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputFileRef {
    pub kind: String,
    pub reference: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DesignSnapshot {
    pub input_parameters: BTreeMap<String, Value>,
    pub calculation_log: Vec<CalculationEntry>,
    pub output_files: Vec<OutputFileRef>,
    /// blake3 over the canonical JSON of parameters + log, fixed at
    /// creation time. Lets an auditor detect any out-of-band edit of a
    /// stored record.
    pub content_hash: String,
}

impl DesignSnapshot {
    pub fn new(
        input_parameters: BTreeMap<String, Value>,
        calculation_log: Vec<CalculationEntry>,
        output_files: Vec<OutputFileRef>,
    ) -> Self {
        let content_hash = content_hash(&input_parameters, &calculation_log);
        Self {
            input_parameters,
            calculation_log,
            output_files,
            content_hash,
        }
    }
}

/// Canonical hash of the audit-relevant snapshot content. BTreeMap key
/// order plus the fixed log order make the byte stream reproducible.
fn content_hash(params: &BTreeMap<String, Value>, log: &[CalculationEntry]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&serde_json::to_vec(params).unwrap_or_default());
    hasher.update(&serde_json::to_vec(log).unwrap_or_default());
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(depth: f64) -> BTreeMap<String, Value> {
        let mut m = BTreeMap::new();
        m.insert("depth".to_string(), json!(depth));
        m.insert("flow_rate".to_string(), json!(1200.0));
        m
    }

    #[test]
    fn content_hash_is_stable_for_equal_content() {
        let a = DesignSnapshot::new(params(3.0), Vec::new(), Vec::new());
        let b = DesignSnapshot::new(params(3.0), Vec::new(), Vec::new());
        assert_eq!(a.content_hash, b.content_hash);
    }

    #[test]
    fn content_hash_tracks_parameter_changes() {
        let a = DesignSnapshot::new(params(3.0), Vec::new(), Vec::new());
        let b = DesignSnapshot::new(params(3.5), Vec::new(), Vec::new());
        assert_ne!(a.content_hash, b.content_hash);
    }

    #[test]
    fn output_files_do_not_affect_the_hash() {
        let refs = vec![OutputFileRef {
            kind: "dxf".to_string(),
            reference: "exports/tank_plan.dxf".to_string(),
        }];
        let a = DesignSnapshot::new(params(3.0), Vec::new(), refs);
        let b = DesignSnapshot::new(params(3.0), Vec::new(), Vec::new());
        assert_eq!(a.content_hash, b.content_hash);
    }
}
