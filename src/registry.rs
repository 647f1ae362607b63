// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Violation registry.
//!
//! Stores the violations detected for each calculation run and the one
//! authoritative override per violation. Override is a per-job
//! compare-and-swap: of two simultaneous attempts exactly one wins and
//! the other fails `Conflict`, so audit attributability is never lost.
//! Runs never share state: recording a job again replaces its previous
//! set, and overrides never carry across reruns.

use crate::clock;
use crate::error::{CoreError, CoreResult};
use crate::types::id::{JobId, ViolationId};
use crate::types::violation::{OverrideRecord, Severity, Violation, ViolationInput};
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Minimum override justification length, in Unicode codepoints.
/// Enforced here, server-side; client-side checks are advisory only.
pub const MIN_REASON_CHARS: usize = 50;

#[derive(Clone, Debug)]
pub struct OverrideRequest {
    pub engineer_id: String,
    pub engineer_name: String,
    pub reason: String,
    pub reference_doc: Option<String>,
}

/// Per-run safety roll-up for dashboards and export reports.
#[derive(Clone, Debug, serde::Serialize)]
pub struct SafetyCheckSummary {
    pub job_id: JobId,
    pub total: usize,
    pub critical_open: usize,
    pub warnings: usize,
    pub info: usize,
    pub overridden: usize,
    pub can_export: bool,
    pub block_reasons: Vec<String>,
}

#[derive(Default)]
struct JobRun {
    violations: Vec<Violation>,
}

#[derive(Default)]
pub struct ViolationRegistry {
    jobs: RwLock<FxHashMap<JobId, Arc<Mutex<JobRun>>>>,
}

impl ViolationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn run(&self, job_id: &JobId) -> Arc<Mutex<JobRun>> {
        if let Some(run) = self.jobs.read().unwrap().get(job_id) {
            return run.clone();
        }
        let mut guard = self.jobs.write().unwrap();
        guard
            .entry(job_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(JobRun::default())))
            .clone()
    }

    fn existing_run(&self, job_id: &JobId) -> Option<Arc<Mutex<JobRun>>> {
        self.jobs.read().unwrap().get(job_id).cloned()
    }

    /// Records the violations detected for one calculation run,
    /// assigning registry ids. Replaces any previous set for the job:
    /// each run starts clean, with zero overrides.
    pub fn record_with<F>(
        &self,
        job_id: &JobId,
        inputs: Vec<ViolationInput>,
        pre_commit: F,
    ) -> CoreResult<Vec<Violation>>
    where
        F: FnOnce(&[Violation]) -> CoreResult<()>,
    {
        let violations: Vec<Violation> = inputs
            .into_iter()
            .map(|input| Violation::from_input(job_id.clone(), input))
            .collect();

        let run = self.run(job_id);
        let mut guard = run.lock().unwrap();
        pre_commit(&violations)?;
        guard.violations = violations.clone();
        Ok(violations)
    }

    pub fn record(&self, job_id: &JobId, inputs: Vec<ViolationInput>) -> CoreResult<Vec<Violation>> {
        self.record_with(job_id, inputs, |_| Ok(()))
    }

    /// The one authoritative override of a violation. Validation errors
    /// are surfaced verbatim; a second attempt fails `Conflict`. The
    /// pre-commit hook runs inside the per-job critical section with
    /// the updated violation; its failure leaves the violation open.
    pub fn override_with<F>(
        &self,
        job_id: &JobId,
        violation_id: &ViolationId,
        req: OverrideRequest,
        pre_commit: F,
    ) -> CoreResult<Violation>
    where
        F: FnOnce(&Violation) -> CoreResult<()>,
    {
        validate_override(&req)?;

        let run = self
            .existing_run(job_id)
            .ok_or_else(|| CoreError::not_found("job", job_id.to_string()))?;
        let mut guard = run.lock().unwrap();

        let slot = guard
            .violations
            .iter_mut()
            .find(|v| v.id == *violation_id)
            .ok_or_else(|| CoreError::not_found("violation", violation_id.to_string()))?;

        if slot.overridden {
            return Err(CoreError::Conflict(format!(
                "violation {} is already overridden",
                violation_id
            )));
        }

        let mut updated = slot.clone();
        updated.overridden = true;
        updated.override_record = Some(OverrideRecord {
            engineer_id: req.engineer_id.trim().to_string(),
            engineer_name: req.engineer_name.trim().to_string(),
            reason: req.reason.trim().to_string(),
            reference_doc: req.reference_doc,
            overridden_at: clock::now_millis(),
        });

        pre_commit(&updated)?;
        *slot = updated.clone();
        Ok(updated)
    }

    pub fn override_violation(
        &self,
        job_id: &JobId,
        violation_id: &ViolationId,
        req: OverrideRequest,
    ) -> CoreResult<Violation> {
        self.override_with(job_id, violation_id, req, |_| Ok(()))
    }

    /// Export-blocking violations: critical and not overridden. An
    /// unknown job has none.
    pub fn list_open(&self, job_id: &JobId) -> Vec<Violation> {
        match self.existing_run(job_id) {
            Some(run) => {
                let guard = run.lock().unwrap();
                guard
                    .violations
                    .iter()
                    .filter(|v| v.is_open())
                    .cloned()
                    .collect()
            }
            None => Vec::new(),
        }
    }

    /// Full set for the job's current run, detection order preserved.
    pub fn violations(&self, job_id: &JobId) -> Vec<Violation> {
        match self.existing_run(job_id) {
            Some(run) => run.lock().unwrap().violations.clone(),
            None => Vec::new(),
        }
    }

    pub fn summary(&self, job_id: &JobId) -> SafetyCheckSummary {
        let violations = self.violations(job_id);
        let critical_open = violations.iter().filter(|v| v.is_open()).count();
        let block_reasons = violations
            .iter()
            .filter(|v| v.is_open())
            .map(|v| format!("{}: {}", v.code, v.message))
            .collect();

        SafetyCheckSummary {
            job_id: job_id.clone(),
            total: violations.len(),
            critical_open,
            warnings: violations
                .iter()
                .filter(|v| v.severity == Severity::Warning)
                .count(),
            info: violations
                .iter()
                .filter(|v| v.severity == Severity::Info)
                .count(),
            overridden: violations.iter().filter(|v| v.overridden).count(),
            can_export: critical_open == 0,
            block_reasons,
        }
    }

    /// Recovery entry point: reinstate a journaled run verbatim,
    /// including ids and any override state already applied.
    pub fn restore_run(&self, job_id: &JobId, violations: Vec<Violation>) {
        let run = self.run(job_id);
        run.lock().unwrap().violations = violations;
    }

    /// Recovery entry point for a journaled override.
    pub fn restore_override(
        &self,
        job_id: &JobId,
        violation_id: &ViolationId,
        record: OverrideRecord,
    ) -> CoreResult<()> {
        let run = self
            .existing_run(job_id)
            .ok_or_else(|| CoreError::not_found("job", job_id.to_string()))?;
        let mut guard = run.lock().unwrap();
        let slot = guard
            .violations
            .iter_mut()
            .find(|v| v.id == *violation_id)
            .ok_or_else(|| CoreError::not_found("violation", violation_id.to_string()))?;
        slot.overridden = true;
        slot.override_record = Some(record);
        Ok(())
    }
}

fn validate_override(req: &OverrideRequest) -> CoreResult<()> {
    if req.engineer_id.trim().is_empty() {
        return Err(CoreError::Validation(
            "engineer_id must not be empty".to_string(),
        ));
    }
    if req.engineer_name.trim().is_empty() {
        return Err(CoreError::Validation(
            "engineer_name must not be empty".to_string(),
        ));
    }
    let reason_len = req.reason.trim().chars().count();
    if reason_len < MIN_REASON_CHARS {
        return Err(CoreError::Validation(format!(
            "override reason must be at least {MIN_REASON_CHARS} characters to justify the exception; got {reason_len}"
        )));
    }
    Ok(())
}
