// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! End-to-end ledger properties over the in-memory store.

use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

use traceline_core::gate::ExportGate;
use traceline_core::manager::VersionManager;
use traceline_core::registry::{OverrideRequest, ViolationRegistry};
use traceline_core::store::{MemoryStore, VersionStore};
use traceline_core::types::{
    DesignSnapshot, JobId, ProjectId, Severity, VersionStatus, ViolationInput,
};

fn snapshot(pairs: &[(&str, serde_json::Value)]) -> DesignSnapshot {
    let params: BTreeMap<String, serde_json::Value> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    DesignSnapshot::new(params, Vec::new(), Vec::new())
}

fn manager() -> VersionManager<MemoryStore> {
    VersionManager::new(Arc::new(MemoryStore::new()))
}

#[test]
fn list_returns_strictly_increasing_gap_free_tags() {
    let mgr = manager();
    let project = ProjectId::from("XLNT-2024-001");

    for i in 0..20 {
        mgr.create_version(
            &project,
            snapshot(&[("depth", json!(3.0 + i as f64 * 0.1))]),
            "jmora",
            "sizing iteration",
        )
        .unwrap();
    }

    let page = mgr.list_versions(&project, None, 100).unwrap();
    let tags: Vec<u64> = page.versions.iter().map(|v| v.tag).collect();
    assert_eq!(tags, (1..=20).collect::<Vec<u64>>());
}

#[test]
fn version_workflow_draft_approve_rollback() {
    let mgr = manager();
    let project = ProjectId::from("XLNT-2024-001");

    let v1 = mgr
        .create_version(&project, snapshot(&[("depth", json!(3.0))]), "jmora", "initial")
        .unwrap();
    assert_eq!(v1.status, VersionStatus::Draft);
    assert_eq!(v1.tag, 1);
    assert!(v1.lineage_of.is_none());

    let approved = mgr.approve_version(&v1.version_id, "lead").unwrap();
    assert_eq!(approved.status, VersionStatus::Approved);

    // Approving again is a no-op, not an error.
    let again = mgr.approve_version(&v1.version_id, "lead").unwrap();
    assert_eq!(again.status, VersionStatus::Approved);

    let v2 = mgr
        .create_version(&project, snapshot(&[("depth", json!(3.5))]), "jmora", "deeper")
        .unwrap();
    let rb = mgr
        .rollback_version(&project, &v1.version_id, "jmora")
        .unwrap();
    assert_eq!(rb.tag, 3);
    assert_eq!(rb.snapshot, v1.snapshot);
    assert_eq!(rb.snapshot.content_hash, v1.snapshot.content_hash);

    // Rollback fabricated a new entity; the approved target still holds
    // its own id, status, and snapshot.
    let target = mgr.get_version(&v1.version_id).unwrap();
    assert_eq!(target.status, VersionStatus::Approved);
    assert_eq!(target.snapshot, v1.snapshot);
    assert_ne!(rb.version_id, v1.version_id);

    let latest = mgr.latest_version(&project).unwrap().unwrap();
    assert_eq!(latest.version_id, rb.version_id);
    let _ = v2;
}

#[test]
fn reference_comparison_scenario() {
    // Project XLNT-2024-001: v1 depth=3.0, v2 depth=3.5, other fields
    // equal. The diff must show exactly one modified key.
    let mgr = manager();
    let project = ProjectId::from("XLNT-2024-001");

    let base = &[
        ("depth", json!(3.0)),
        ("flow_rate", json!(1200.0)),
        ("material", json!("reinforced_concrete")),
    ];
    let v1 = mgr
        .create_version(&project, snapshot(base), "jmora", "initial")
        .unwrap();

    let changed = &[
        ("depth", json!(3.5)),
        ("flow_rate", json!(1200.0)),
        ("material", json!("reinforced_concrete")),
    ];
    let v2 = mgr
        .create_version(&project, snapshot(changed), "jmora", "deeper basin")
        .unwrap();

    let cmp = mgr.compare_versions(&v1.version_id, &v2.version_id).unwrap();
    assert!(cmp.added.is_empty());
    assert!(cmp.removed.is_empty());
    assert_eq!(cmp.modified.len(), 1);
    assert_eq!(cmp.modified[0].key, "depth");
    assert_eq!(cmp.modified[0].old, json!(3.0));
    assert_eq!(cmp.modified[0].new, json!(3.5));
    assert_eq!(cmp.modified[0].percent_change, Some(16.7));
}

#[test]
fn export_gate_scenario_with_override() {
    let registry = Arc::new(ViolationRegistry::new());
    let gate = ExportGate::new(registry.clone());
    let job = JobId::from("run-2024-0092");

    let recorded = registry
        .record(
            &job,
            vec![
                ViolationInput {
                    code: "VL-001".to_string(),
                    severity: Severity::Critical,
                    message: "surface loading above limit".to_string(),
                    parameter: Some("surface_loading".to_string()),
                    actual_value: Some(json!(65.2)),
                    limit_value: Some(json!(60.0)),
                    reference: Some("TCVN 7957:2008 7.2".to_string()),
                },
                ViolationInput {
                    code: "VL-017".to_string(),
                    severity: Severity::Warning,
                    message: "retention time above recommendation".to_string(),
                    parameter: None,
                    actual_value: None,
                    limit_value: None,
                    reference: None,
                },
            ],
        )
        .unwrap();
    assert!(!gate.can_export(&job));

    // 60-character reason with a full engineer identity.
    let reason = "Peak load rechecked on site; equalization margin is adequate";
    assert_eq!(reason.chars().count(), 60);
    let overridden = registry
        .override_violation(
            &job,
            &recorded[0].id,
            OverrideRequest {
                engineer_id: "ENG-001".to_string(),
                engineer_name: "Nguyen Van A".to_string(),
                reason: reason.to_string(),
                reference_doc: Some("CALC-EQ-2024-07".to_string()),
            },
        )
        .unwrap();
    assert!(overridden.overridden);
    assert!(registry.list_open(&job).is_empty());
    assert!(gate.can_export(&job));

    // A second override of the same violation is rejected.
    let err = registry.override_violation(
        &job,
        &recorded[0].id,
        OverrideRequest {
            engineer_id: "ENG-002".to_string(),
            engineer_name: "Tran Thi B".to_string(),
            reason: reason.to_string(),
            reference_doc: None,
        },
    );
    assert!(matches!(err, Err(traceline_core::CoreError::Conflict(_))));

    // The surviving record still names the first engineer.
    let all = registry.violations(&job);
    let v = all.iter().find(|v| v.code == "VL-001").unwrap();
    assert_eq!(
        v.override_record.as_ref().unwrap().engineer_id,
        "ENG-001"
    );
}

#[test]
fn store_trait_object_is_usable_behind_dyn() {
    // The node crate holds the store as a trait object; make sure the
    // trait stays object-safe.
    let store: Arc<dyn VersionStore> = Arc::new(MemoryStore::new());
    let project = ProjectId::from("P-1");
    let v = store
        .append(
            &project,
            traceline_core::store::NewVersion::draft(
                snapshot(&[("depth", json!(3.0))]),
                "jmora",
                "initial",
            ),
        )
        .unwrap();
    assert_eq!(store.get(&v.version_id).unwrap().tag, 1);
}
