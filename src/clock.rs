// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Server-assigned timestamps.

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch. Timestamps are always assigned
/// here, never accepted from callers.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
