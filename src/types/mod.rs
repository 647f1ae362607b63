// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Domain types.

pub mod id;
pub mod snapshot;
pub mod version;
pub mod violation;

pub use id::{JobId, ProjectId, VersionId, ViolationId};
pub use snapshot::{CalculationEntry, DesignSnapshot, OutputFileRef};
pub use version::{Version, VersionStatus, VersionSummary};
pub use violation::{OverrideRecord, Severity, Violation, ViolationInput};
