//! Instance endpoints: launch and zone lookup.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use cirrus_id::{InstanceId, ZoneName};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::request_context::RequestContext;
use crate::launch::LaunchOutcome;
use crate::state::AppState;
use crate::zones::LaunchRequest;

/// Create instance routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/instances", post(launch_instance))
        .route("/instances/batch", post(launch_batch))
        .route("/instances/zones", post(instance_zones))
}

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchLaunchRequest {
    pub requests: Vec<LaunchRequest>,
}

/// Result of one launch in a batch.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchLaunchResult {
    Launched(LaunchOutcome),
    Failed { code: String, message: String },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchLaunchResponse {
    pub results: Vec<BatchLaunchResult>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InstanceZonesRequest {
    pub instance_ids: Vec<InstanceId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InstanceZonesResponse {
    pub zones: Vec<ZoneName>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Launch one instance in the first candidate zone that accepts it.
///
/// POST /v1/instances
async fn launch_instance(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(req): Json<LaunchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id;

    let outcome = state.launcher().launch(&req).await.map_err(|e| {
        tracing::warn!(error = %e, request_id = %request_id, "Launch failed");
        ApiError::from(e).with_request_id(request_id.clone())
    })?;

    tracing::info!(
        request_id = %request_id,
        launch_id = %outcome.launch_id,
        instance_id = %outcome.instance_id,
        zone = %outcome.zone,
        "Instance launched"
    );

    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Launch independent instances concurrently.
///
/// POST /v1/instances/batch
async fn launch_batch(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(req): Json<BatchLaunchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.requests.is_empty() {
        return Err(
            ApiError::bad_request("empty_batch", "requests must not be empty")
                .with_request_id(ctx.request_id),
        );
    }

    let results = state
        .launcher()
        .launch_many(&req.requests)
        .await
        .into_iter()
        .map(|result| match result {
            Ok(outcome) => BatchLaunchResult::Launched(outcome),
            Err(e) => {
                let problem = *ApiError::from(e).problem;
                BatchLaunchResult::Failed {
                    code: problem.code,
                    message: problem.detail,
                }
            }
        })
        .collect();

    Ok(Json(BatchLaunchResponse { results }))
}

/// Zone of each existing instance, in request order.
///
/// POST /v1/instances/zones
async fn instance_zones(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(req): Json<InstanceZonesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id;

    let zones = state
        .zones()
        .instance_availability_zone_names(&req.instance_ids)
        .await
        .map_err(|e| ApiError::from(e).with_request_id(request_id.clone()))?;

    Ok(Json(InstanceZonesResponse { zones }))
}
