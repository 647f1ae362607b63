// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Engine: the node's view of the domain kernel.
//!
//! Owns the durable ledger and exposes the nine public operations the
//! HTTP layer serves. All synchronization lives below (per-project and
//! per-job locks in the core, journal mutex in the ledger), so the
//! engine is shared as a plain `Arc` and operations on different
//! projects never contend.

use std::sync::Arc;

use traceline_core::diff::Comparison;
use traceline_core::gate::{ExportDecision, ExportGate};
use traceline_core::manager::VersionManager;
use traceline_core::registry::{OverrideRequest, SafetyCheckSummary};
use traceline_core::store::VersionPage;
use traceline_core::types::{
    DesignSnapshot, JobId, ProjectId, Version, VersionId, VersionSummary, Violation, ViolationId,
    ViolationInput,
};

use crate::config::NodeConfig;
use crate::errors::EngineError;
use crate::ledger::DurableLedger;

pub struct Engine {
    manager: VersionManager<DurableLedger>,
    ledger: Arc<DurableLedger>,
    gate: ExportGate,
}

impl Engine {
    /// Opens the journal under the configured data dir and recovers
    /// the ledger state from it.
    pub fn open(cfg: &NodeConfig) -> Result<Self, EngineError> {
        std::fs::create_dir_all(&cfg.data_dir)
            .map_err(traceline_persistence::JournalError::Io)?;

        let journal_path = cfg.journal_path();
        let (ledger, replayed) = DurableLedger::open(&journal_path)?;
        tracing::info!(
            "Ledger ready at {:?} ({} records replayed)",
            journal_path,
            replayed
        );

        let gate = ExportGate::new(ledger.registry().clone());
        Ok(Self {
            manager: VersionManager::new(ledger.clone()),
            ledger,
            gate,
        })
    }

    pub fn create_version(
        &self,
        project_id: &ProjectId,
        snapshot: DesignSnapshot,
        created_by: &str,
        description: &str,
    ) -> Result<Version, EngineError> {
        let version = self
            .manager
            .create_version(project_id, snapshot, created_by, description)?;
        metrics::increment_counter!("traceline_versions_created_total");
        tracing::info!(
            "Created version {} (tag {}) for project {}",
            version.version_id,
            version.tag,
            project_id
        );
        Ok(version)
    }

    pub fn get_version(&self, version_id: &VersionId) -> Result<Version, EngineError> {
        Ok(self.manager.get_version(version_id)?)
    }

    pub fn list_versions(
        &self,
        project_id: &ProjectId,
        cursor: Option<u64>,
        limit: usize,
    ) -> Result<VersionPage, EngineError> {
        Ok(self.manager.list_versions(project_id, cursor, limit)?)
    }

    pub fn latest_version(&self, project_id: &ProjectId) -> Result<Option<Version>, EngineError> {
        Ok(self.manager.latest_version(project_id)?)
    }

    pub fn history(&self, project_id: &ProjectId) -> Result<Vec<VersionSummary>, EngineError> {
        Ok(self.manager.history(project_id)?)
    }

    pub fn compare_versions(
        &self,
        from: &VersionId,
        to: &VersionId,
    ) -> Result<Comparison, EngineError> {
        Ok(self.manager.compare_versions(from, to)?)
    }

    pub fn approve_version(
        &self,
        version_id: &VersionId,
        approved_by: &str,
    ) -> Result<Version, EngineError> {
        let version = self.manager.approve_version(version_id, approved_by)?;
        tracing::info!("Version {} approved by {}", version_id, approved_by);
        Ok(version)
    }

    pub fn rollback_version(
        &self,
        project_id: &ProjectId,
        version_id: &VersionId,
        requested_by: &str,
    ) -> Result<Version, EngineError> {
        let version = self
            .manager
            .rollback_version(project_id, version_id, requested_by)?;
        metrics::increment_counter!("traceline_rollbacks_total");
        tracing::info!(
            "Rolled back project {} to {} as new version {} (tag {})",
            project_id,
            version_id,
            version.version_id,
            version.tag
        );
        Ok(version)
    }

    pub fn record_violations(
        &self,
        job_id: &JobId,
        inputs: Vec<ViolationInput>,
    ) -> Result<Vec<Violation>, EngineError> {
        let violations = self.ledger.record_violations(job_id, inputs)?;
        tracing::info!(
            "Recorded {} violations for job {}",
            violations.len(),
            job_id
        );
        Ok(violations)
    }

    pub fn override_violation(
        &self,
        job_id: &JobId,
        violation_id: &ViolationId,
        req: OverrideRequest,
    ) -> Result<Violation, EngineError> {
        let violation = self.ledger.override_violation(job_id, violation_id, req)?;
        metrics::increment_counter!("traceline_overrides_recorded_total");
        tracing::info!(
            "Violation {} on job {} overridden by {}",
            violation_id,
            job_id,
            violation
                .override_record
                .as_ref()
                .map(|r| r.engineer_id.as_str())
                .unwrap_or("unknown")
        );
        Ok(violation)
    }

    pub fn open_violations(&self, job_id: &JobId) -> Vec<Violation> {
        self.ledger.registry().list_open(job_id)
    }

    pub fn safety_summary(&self, job_id: &JobId) -> SafetyCheckSummary {
        self.ledger.registry().summary(job_id)
    }

    /// Recomputed from registry state on every call; never cached.
    pub fn export_gate(&self, job_id: &JobId) -> ExportDecision {
        let decision = self.gate.check(job_id);
        if !decision.can_export {
            metrics::increment_counter!("traceline_export_denied_total");
        }
        decision
    }
}
