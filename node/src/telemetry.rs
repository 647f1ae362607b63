// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize telemetry (logs + metrics)
pub fn init_telemetry() {
    // 1. Initialize Tracing (Logs)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "traceline_node=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Initialize Metrics (Prometheus)
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // Store handle for /metrics endpoint
    if PROM_HANDLE.set(handle).is_err() {
        tracing::warn!("Prometheus handle already set. Telemetry re-initialized?");
    }

    metrics::describe_counter!(
        "traceline_versions_created_total",
        "Total number of versions appended to the ledger"
    );
    metrics::describe_counter!(
        "traceline_rollbacks_total",
        "Total number of rollback versions created"
    );
    metrics::describe_counter!(
        "traceline_overrides_recorded_total",
        "Total number of violation overrides recorded"
    );
    metrics::describe_counter!(
        "traceline_export_denied_total",
        "Export gate checks that found open critical violations"
    );
    metrics::describe_histogram!(
        "traceline_journal_append_duration_seconds",
        "Time taken to durably append one journal record"
    );
    metrics::describe_histogram!(
        "traceline_replay_duration_seconds",
        "Time taken to replay the journal on startup"
    );

    // Ensure at least one metric exists on startup
    metrics::gauge!("traceline_node_up", 1.0);
}

/// Get the Prometheus handle to render metrics
pub fn get_metrics() -> String {
    if let Some(handle) = PROM_HANDLE.get() {
        handle.render()
    } else {
        "# metrics not initialized".to_string()
    }
}
