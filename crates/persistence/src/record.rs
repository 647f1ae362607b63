//! Ledger records.
//!
//! The journal's record language: every durable state transition of the
//! ledger is expressed as exactly one of these variants. Replaying the
//! committed records in order reproduces the full state; there is no
//! other write path.
//!
//! Records embed opaque `serde_json::Value` parameter payloads, so the
//! encoding is JSON (self-describing) rather than a fixed binary
//! layout. The frame layer supplies length, ordering, and integrity.

use serde::{Deserialize, Serialize};
use traceline_core::types::{
    JobId, OverrideRecord, Version, VersionId, Violation, ViolationId,
};

use crate::error::{JournalError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerRecord {
    /// A version was appended to a project ledger.
    VersionAppended { version: Version },

    /// A draft version was approved. `approved_by` is journal-only
    /// audit metadata; the version record itself carries no approver.
    VersionApproved {
        version_id: VersionId,
        approved_by: String,
        at: u64,
    },

    /// The violations detected for one calculation run, replacing any
    /// previous set for the job.
    ViolationsRecorded {
        job_id: JobId,
        violations: Vec<Violation>,
    },

    /// The one authoritative override of a violation.
    ViolationOverridden {
        job_id: JobId,
        violation_id: ViolationId,
        record: OverrideRecord,
    },
}

impl LedgerRecord {
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| JournalError::Codec(e.to_string()))
    }

    pub fn decode(payload: &[u8]) -> Result<Self> {
        serde_json::from_slice(payload).map_err(|e| JournalError::Codec(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use traceline_core::types::{DesignSnapshot, ProjectId, Severity, ViolationInput, VersionStatus};

    #[test]
    fn version_record_round_trips() {
        let mut params = BTreeMap::new();
        params.insert("depth".to_string(), serde_json::json!(3.0));
        let version = Version {
            version_id: VersionId::from("VER-AAAABBBBCCCC"),
            project_id: ProjectId::from("XLNT-2024-001"),
            tag: 1,
            status: VersionStatus::Draft,
            created_at: 1_722_000_000_000,
            created_by: "jmora".to_string(),
            description: "initial sizing".to_string(),
            lineage_of: None,
            snapshot: DesignSnapshot::new(params, Vec::new(), Vec::new()),
        };

        let record = LedgerRecord::VersionAppended { version };
        let decoded = LedgerRecord::decode(&record.encode().unwrap()).unwrap();
        assert_eq!(record, decoded);
    }

    #[test]
    fn override_record_round_trips() {
        let job_id = JobId::from("run-1");
        let violation = Violation::from_input(
            job_id.clone(),
            ViolationInput {
                code: "VL-001".to_string(),
                severity: Severity::Critical,
                message: "limit exceeded".to_string(),
                parameter: None,
                actual_value: Some(serde_json::json!(65.2)),
                limit_value: Some(serde_json::json!(60.0)),
                reference: None,
            },
        );
        let record = LedgerRecord::ViolationOverridden {
            job_id,
            violation_id: violation.id.clone(),
            record: OverrideRecord {
                engineer_id: "ENG-001".to_string(),
                engineer_name: "Nguyen Van A".to_string(),
                reason: "r".repeat(50),
                reference_doc: None,
                overridden_at: 1_722_000_000_000,
            },
        };
        let decoded = LedgerRecord::decode(&record.encode().unwrap()).unwrap();
        assert_eq!(record, decoded);
    }

    #[test]
    fn garbage_payload_is_a_codec_error() {
        assert!(matches!(
            LedgerRecord::decode(b"\x00\x01not json"),
            Err(JournalError::Codec(_))
        ));
    }
}
