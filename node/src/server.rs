// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use axum::extract::Request as AxumRequest;
use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum::middleware::{from_fn_with_state, Next};
use axum::response::Response;
use tower_http::cors::CorsLayer;

use traceline_core::diff::Comparison;
use traceline_core::gate::ExportDecision;
use traceline_core::registry::{OverrideRequest, SafetyCheckSummary};
use traceline_core::types::{
    JobId, ProjectId, Version, VersionId, VersionSummary, Violation, ViolationId,
};

use crate::api::*;
use crate::engine::Engine;
use crate::errors::EngineError;

pub type SharedEngine = Arc<Engine>;

async fn auth_guard(
    State(token): State<Arc<String>>,
    req: AxumRequest,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|val| val.to_str().ok())
        .filter(|val| val.starts_with("Bearer "));

    if let Some(val) = auth_header {
        let provided = val.trim_start_matches("Bearer ");
        if provided == token.as_str() {
            return Ok(next.run(req).await);
        }
    }
    Err(StatusCode::UNAUTHORIZED)
}

pub fn build_router(state: SharedEngine, auth_token: Option<String>) -> Router {
    let mut v1 = Router::new()
        .route("/v1/versions", post(create_version))
        .route("/v1/versions/compare", post(compare_versions))
        .route("/v1/versions/:version_id", get(get_version))
        .route("/v1/versions/:version_id/approve", post(approve_version))
        .route("/v1/projects/:project_id/versions", get(list_versions))
        .route(
            "/v1/projects/:project_id/versions/latest",
            get(latest_version),
        )
        .route("/v1/projects/:project_id/history", get(history))
        .route("/v1/projects/:project_id/rollback", post(rollback_version))
        .route("/v1/jobs/:job_id/violations", post(record_violations))
        .route("/v1/jobs/:job_id/violations/open", get(open_violations))
        .route("/v1/jobs/:job_id/safety", get(safety_summary))
        .route("/v1/jobs/:job_id/export-gate", get(export_gate))
        .route(
            "/v1/violations/:violation_id/override",
            post(override_violation),
        )
        .with_state(state);

    if let Some(token) = auth_token {
        tracing::info!("Auth Enabled: Bearer token required");
        v1 = v1.layer(from_fn_with_state(Arc::new(token), auth_guard));
    } else {
        tracing::warn!("Auth Disabled: No token configured");
    }

    // The export/CAD subsystem and the authoring UI are browser-driven.
    Router::new()
        .merge(v1)
        .route("/metrics", get(metrics_handler))
        .layer(CorsLayer::permissive())
}

async fn create_version(
    State(state): State<SharedEngine>,
    Json(req): Json<CreateVersionRequest>,
) -> Result<Json<Version>, EngineError> {
    let project_id = ProjectId(req.project_id);
    let version = state.create_version(
        &project_id,
        req.snapshot.into_snapshot(),
        &req.created_by,
        &req.description,
    )?;
    Ok(Json(version))
}

async fn get_version(
    State(state): State<SharedEngine>,
    Path(version_id): Path<String>,
) -> Result<Json<Version>, EngineError> {
    Ok(Json(state.get_version(&VersionId(version_id))?))
}

async fn list_versions(
    State(state): State<SharedEngine>,
    Path(project_id): Path<String>,
    Query(query): Query<ListVersionsQuery>,
) -> Result<Json<ListVersionsResponse>, EngineError> {
    let page = state.list_versions(
        &ProjectId(project_id),
        query.cursor,
        query.limit.unwrap_or(0),
    )?;
    Ok(Json(ListVersionsResponse {
        versions: page.versions,
        next_cursor: page.next_cursor,
    }))
}

async fn latest_version(
    State(state): State<SharedEngine>,
    Path(project_id): Path<String>,
) -> Result<Json<Version>, EngineError> {
    let project_id = ProjectId(project_id);
    state
        .latest_version(&project_id)?
        .map(Json)
        .ok_or_else(|| {
            traceline_core::CoreError::not_found("project", project_id.to_string()).into()
        })
}

async fn history(
    State(state): State<SharedEngine>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<VersionSummary>>, EngineError> {
    Ok(Json(state.history(&ProjectId(project_id))?))
}

async fn compare_versions(
    State(state): State<SharedEngine>,
    Json(req): Json<CompareVersionsRequest>,
) -> Result<Json<Comparison>, EngineError> {
    Ok(Json(state.compare_versions(&req.from, &req.to)?))
}

async fn approve_version(
    State(state): State<SharedEngine>,
    Path(version_id): Path<String>,
    Json(req): Json<ApproveVersionRequest>,
) -> Result<Json<Version>, EngineError> {
    Ok(Json(
        state.approve_version(&VersionId(version_id), &req.approved_by)?,
    ))
}

async fn rollback_version(
    State(state): State<SharedEngine>,
    Path(project_id): Path<String>,
    Json(req): Json<RollbackRequest>,
) -> Result<Json<Version>, EngineError> {
    Ok(Json(state.rollback_version(
        &ProjectId(project_id),
        &req.version_id,
        &req.requested_by,
    )?))
}

async fn record_violations(
    State(state): State<SharedEngine>,
    Path(job_id): Path<String>,
    Json(req): Json<RecordViolationsRequest>,
) -> Result<Json<Vec<Violation>>, EngineError> {
    Ok(Json(
        state.record_violations(&JobId(job_id), req.violations)?,
    ))
}

async fn open_violations(
    State(state): State<SharedEngine>,
    Path(job_id): Path<String>,
) -> Json<Vec<Violation>> {
    Json(state.open_violations(&JobId(job_id)))
}

async fn safety_summary(
    State(state): State<SharedEngine>,
    Path(job_id): Path<String>,
) -> Json<SafetyCheckSummary> {
    Json(state.safety_summary(&JobId(job_id)))
}

async fn override_violation(
    State(state): State<SharedEngine>,
    Path(violation_id): Path<String>,
    Json(req): Json<OverrideViolationRequest>,
) -> Result<Json<Violation>, EngineError> {
    let violation = state.override_violation(
        &JobId(req.job_id),
        &ViolationId(violation_id),
        OverrideRequest {
            engineer_id: req.engineer_id,
            engineer_name: req.engineer_name,
            reason: req.reason,
            reference_doc: req.reference_doc,
        },
    )?;
    Ok(Json(violation))
}

async fn export_gate(
    State(state): State<SharedEngine>,
    Path(job_id): Path<String>,
) -> Json<ExportDecision> {
    Json(state.export_gate(&JobId(job_id)))
}

async fn metrics_handler() -> String {
    crate::telemetry::get_metrics()
}
