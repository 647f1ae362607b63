//! Identity types.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Caller-supplied project identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

/// Caller-supplied calculation-run identifier. One job per run; a rerun
/// gets a fresh job id from the calculation engine.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

/// Unique, immutable version identifier (`VER-` + 12 uppercase hex).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(pub String);

/// Registry-assigned violation identifier (`VIO-` + 12 uppercase hex).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViolationId(pub String);

fn short_hex() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    hex[..12].to_uppercase()
}

impl VersionId {
    pub fn generate() -> Self {
        VersionId(format!("VER-{}", short_hex()))
    }
}

impl ViolationId {
    pub fn generate() -> Self {
        ViolationId(format!("VIO-{}", short_hex()))
    }
}

macro_rules! impl_string_id {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }
    };
}

impl_string_id!(ProjectId);
impl_string_id!(JobId);
impl_string_id!(VersionId);
impl_string_id!(ViolationId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_prefixed_and_unique() {
        let a = VersionId::generate();
        let b = VersionId::generate();
        assert!(a.0.starts_with("VER-"));
        assert_eq!(a.0.len(), "VER-".len() + 12);
        assert_ne!(a, b);

        let v = ViolationId::generate();
        assert!(v.0.starts_with("VIO-"));
    }
}
