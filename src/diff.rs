// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Structured snapshot diffing.
//!
//! Compares two flattened parameter maps and reports added, removed,
//! and modified keys. Output ordering is deterministic (lexicographic
//! by key) so reports are reproducible across runs and platforms.
//!
//! # Invariants
//! - `diff(m, m)` is empty for every map `m`
//! - Every key of both inputs appears in exactly one bucket or none
//! - Percent change is only reported for numeric pairs with a non-zero
//!   old value; a zero baseline is flagged instead of dividing

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct AddedParam {
    pub key: String,
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RemovedParam {
    pub key: String,
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ModifiedParam {
    pub key: String,
    pub old: Value,
    pub new: Value,
    /// `(new - old) / old * 100`, rounded to one decimal. Absent for
    /// non-numeric pairs and for zero baselines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_change: Option<f64>,
    /// True when both values are numeric but `old == 0`, so a percent
    /// change is undefined.
    pub zero_baseline: bool,
}

/// Derived comparison between two snapshots. Never persisted.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct Comparison {
    pub added: Vec<AddedParam>,
    pub removed: Vec<RemovedParam>,
    pub modified: Vec<ModifiedParam>,
}

impl Comparison {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/// Flattens nested objects into dot-path keys (`tank.depth`). Arrays
/// and scalars are treated as atomic values.
pub fn flatten(map: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    for (key, value) in map {
        flatten_into(key, value, &mut out);
    }
    out
}

fn flatten_into(prefix: &str, value: &Value, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(fields) => {
            if fields.is_empty() {
                out.insert(prefix.to_string(), value.clone());
            } else {
                for (key, nested) in fields {
                    flatten_into(&format!("{prefix}.{key}"), nested, out);
                }
            }
        }
        _ => {
            out.insert(prefix.to_string(), value.clone());
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DiffEngine;

impl DiffEngine {
    pub fn diff(&self, old: &BTreeMap<String, Value>, new: &BTreeMap<String, Value>) -> Comparison {
        let mut cmp = Comparison::default();

        // BTreeSet union keeps the output lexicographically sorted.
        let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();

        for key in keys {
            match (old.get(key), new.get(key)) {
                (None, Some(value)) => cmp.added.push(AddedParam {
                    key: key.clone(),
                    value: value.clone(),
                }),
                (Some(value), None) => cmp.removed.push(RemovedParam {
                    key: key.clone(),
                    value: value.clone(),
                }),
                (Some(old_value), Some(new_value)) => {
                    if let Some(change) = modified(key, old_value, new_value) {
                        cmp.modified.push(change);
                    }
                }
                (None, None) => unreachable!("key came from one of the maps"),
            }
        }

        cmp
    }
}

fn modified(key: &str, old: &Value, new: &Value) -> Option<ModifiedParam> {
    match (old.as_f64(), new.as_f64()) {
        // Numeric pair: compare by value so 3 and 3.0 are equal.
        (Some(old_n), Some(new_n)) => {
            if old_n == new_n {
                return None;
            }
            let zero_baseline = old_n == 0.0;
            let percent_change =
                (!zero_baseline).then(|| round1((new_n - old_n) / old_n * 100.0));
            Some(ModifiedParam {
                key: key.to_string(),
                old: old.clone(),
                new: new.clone(),
                percent_change,
                zero_baseline,
            })
        }
        _ => {
            if old == new {
                return None;
            }
            Some(ModifiedParam {
                key: key.to_string(),
                old: old.clone(),
                new: new.clone(),
                percent_change: None,
                zero_baseline: false,
            })
        }
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
