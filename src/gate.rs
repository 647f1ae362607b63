// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Export gate.
//!
//! Export permission is derived from registry state on every call,
//! never cached: an override or a fresh run changes the answer
//! immediately. The export/CAD subsystem must consult this gate before
//! releasing any generated file.

use crate::registry::ViolationRegistry;
use crate::types::id::JobId;
use std::sync::Arc;

#[derive(Clone, Debug, serde::Serialize)]
pub struct ExportDecision {
    pub job_id: JobId,
    pub can_export: bool,
    /// One line per open critical violation; empty when exportable.
    pub block_reasons: Vec<String>,
}

pub struct ExportGate {
    registry: Arc<ViolationRegistry>,
}

impl ExportGate {
    pub fn new(registry: Arc<ViolationRegistry>) -> Self {
        Self { registry }
    }

    /// True when the job has no open critical violations. A job with no
    /// recorded run has none; a new run starts with zero overrides.
    pub fn can_export(&self, job_id: &JobId) -> bool {
        self.registry.list_open(job_id).is_empty()
    }

    pub fn check(&self, job_id: &JobId) -> ExportDecision {
        let open = self.registry.list_open(job_id);
        ExportDecision {
            job_id: job_id.clone(),
            can_export: open.is_empty(),
            block_reasons: open
                .iter()
                .map(|v| format!("{}: {}", v.code, v.message))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::OverrideRequest;
    use crate::types::violation::{Severity, ViolationInput};

    fn input(severity: Severity) -> ViolationInput {
        ViolationInput {
            code: "VL-001".to_string(),
            severity,
            message: "fill ratio above limit".to_string(),
            parameter: None,
            actual_value: None,
            limit_value: None,
            reference: None,
        }
    }

    fn long_reason() -> OverrideRequest {
        OverrideRequest {
            engineer_id: "ENG-001".to_string(),
            engineer_name: "Nguyen Van A".to_string(),
            reason: "Peak-hour inflow was re-measured on site and stays below the design threshold.".to_string(),
            reference_doc: Some("SURVEY-2024-18".to_string()),
        }
    }

    #[test]
    fn unknown_job_is_exportable() {
        let registry = Arc::new(ViolationRegistry::new());
        let gate = ExportGate::new(registry);
        assert!(gate.can_export(&JobId::from("never-seen")));
    }

    #[test]
    fn gate_transitions_false_to_true_after_last_override() {
        let registry = Arc::new(ViolationRegistry::new());
        let gate = ExportGate::new(registry.clone());
        let job = JobId::from("job-1");

        let recorded = registry
            .record(&job, vec![input(Severity::Critical), input(Severity::Critical)])
            .unwrap();
        assert!(!gate.can_export(&job));

        registry
            .override_violation(&job, &recorded[0].id, long_reason())
            .unwrap();
        assert!(!gate.can_export(&job));

        registry
            .override_violation(&job, &recorded[1].id, long_reason())
            .unwrap();
        assert!(gate.can_export(&job));
    }

    #[test]
    fn non_critical_violations_do_not_block() {
        let registry = Arc::new(ViolationRegistry::new());
        let gate = ExportGate::new(registry.clone());
        let job = JobId::from("job-1");

        registry
            .record(&job, vec![input(Severity::Warning), input(Severity::Info)])
            .unwrap();
        let decision = gate.check(&job);
        assert!(decision.can_export);
        assert!(decision.block_reasons.is_empty());
    }

    #[test]
    fn block_reasons_name_each_open_violation() {
        let registry = Arc::new(ViolationRegistry::new());
        let gate = ExportGate::new(registry.clone());
        let job = JobId::from("job-1");

        registry.record(&job, vec![input(Severity::Critical)]).unwrap();
        let decision = gate.check(&job);
        assert!(!decision.can_export);
        assert_eq!(decision.block_reasons, vec!["VL-001: fill ratio above limit"]);
    }
}
