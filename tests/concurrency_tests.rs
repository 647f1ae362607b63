// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Concurrency properties: tag allocation and override races.

use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Barrier};
use std::thread;

use traceline_core::manager::VersionManager;
use traceline_core::registry::{OverrideRequest, ViolationRegistry};
use traceline_core::store::MemoryStore;
use traceline_core::types::{DesignSnapshot, JobId, ProjectId, Severity, ViolationInput};
use traceline_core::CoreError;

fn snapshot(depth: f64) -> DesignSnapshot {
    let mut params = BTreeMap::new();
    params.insert("depth".to_string(), json!(depth));
    DesignSnapshot::new(params, Vec::new(), Vec::new())
}

#[test]
fn concurrent_creates_never_share_a_tag() {
    const WRITERS: usize = 8;
    const PER_WRITER: usize = 25;

    let mgr = Arc::new(VersionManager::new(Arc::new(MemoryStore::new())));
    let project = ProjectId::from("XLNT-2024-001");
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = (0..WRITERS)
        .map(|w| {
            let mgr = mgr.clone();
            let project = project.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let mut tags = Vec::with_capacity(PER_WRITER);
                for i in 0..PER_WRITER {
                    let v = mgr
                        .create_version(
                            &project,
                            snapshot(w as f64 + i as f64),
                            "jmora",
                            "concurrent save",
                        )
                        .unwrap();
                    tags.push(v.tag);
                }
                tags
            })
        })
        .collect();

    let mut all_tags = Vec::new();
    for handle in handles {
        all_tags.extend(handle.join().unwrap());
    }

    let unique: HashSet<u64> = all_tags.iter().copied().collect();
    assert_eq!(unique.len(), WRITERS * PER_WRITER);

    // Gap-free: the final history is exactly 1..=N in order.
    let page = mgr
        .list_versions(&project, None, WRITERS * PER_WRITER)
        .unwrap();
    let listed: Vec<u64> = page.versions.iter().map(|v| v.tag).collect();
    assert_eq!(listed, (1..=(WRITERS * PER_WRITER) as u64).collect::<Vec<u64>>());
}

#[test]
fn projects_do_not_contend_for_tags() {
    let mgr = Arc::new(VersionManager::new(Arc::new(MemoryStore::new())));
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4)
        .map(|p| {
            let mgr = mgr.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let project = ProjectId(format!("P-{p}"));
                barrier.wait();
                for i in 0..20 {
                    mgr.create_version(&project, snapshot(i as f64), "jmora", "save")
                        .unwrap();
                }
                let page = mgr.list_versions(&project, None, 100).unwrap();
                page.versions.iter().map(|v| v.tag).collect::<Vec<u64>>()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), (1..=20).collect::<Vec<u64>>());
    }
}

#[test]
fn simultaneous_overrides_yield_one_success_one_conflict() {
    const ATTEMPTS: usize = 6;

    let registry = Arc::new(ViolationRegistry::new());
    let job = JobId::from("run-1");
    let recorded = registry
        .record(
            &job,
            vec![ViolationInput {
                code: "VL-001".to_string(),
                severity: Severity::Critical,
                message: "uplift safety factor below minimum".to_string(),
                parameter: None,
                actual_value: None,
                limit_value: None,
                reference: None,
            }],
        )
        .unwrap();
    let violation_id = recorded[0].id.clone();
    let barrier = Arc::new(Barrier::new(ATTEMPTS));

    let handles: Vec<_> = (0..ATTEMPTS)
        .map(|n| {
            let registry = registry.clone();
            let job = job.clone();
            let violation_id = violation_id.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                registry.override_violation(
                    &job,
                    &violation_id,
                    OverrideRequest {
                        engineer_id: format!("ENG-{n:03}"),
                        engineer_name: format!("Engineer {n}"),
                        reason: "Anchor block weight was re-verified against the as-built drawings."
                            .to_string(),
                        reference_doc: None,
                    },
                )
            })
        })
        .collect();

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(_) => successes += 1,
            Err(CoreError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(conflicts, ATTEMPTS - 1);

    // Exactly one engineer is on record.
    let all = registry.violations(&job);
    assert!(all[0].overridden);
    assert!(all[0].override_record.is_some());
}
