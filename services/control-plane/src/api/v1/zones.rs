//! Availability zone endpoints.
//!
//! Listing, single-zone derivation and candidate resolution. None of these
//! create anything; they answer "where would this launch go".

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use cirrus_id::{Region, ZoneName};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::request_context::RequestContext;
use crate::state::AppState;
use crate::zones::{LaunchRequest, ZoneInfo};

/// Create zone routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/zones", get(list_zones))
        .route("/zones/derive", post(derive_zone))
        .route("/zones/candidates", post(candidate_zones))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListZonesResponse {
    pub region: Region,
    pub zones: Vec<ZoneInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeriveZoneResponse {
    pub zone: ZoneName,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CandidateZonesResponse {
    pub zones: Vec<ZoneName>,
}

/// List the region's zones.
///
/// GET /v1/zones
async fn list_zones(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id;

    let zones = state.zones().availability_zones().await.map_err(|e| {
        tracing::error!(error = %e, request_id = %request_id, "Failed to list zones");
        ApiError::from(e).with_request_id(request_id.clone())
    })?;

    Ok(Json(ListZonesResponse {
        region: state.zones().region().clone(),
        zones,
    }))
}

/// Derive the single zone a launch must use.
///
/// POST /v1/zones/derive
async fn derive_zone(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(req): Json<LaunchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id;

    let zone = state
        .zones()
        .derive_availability_zone(&req)
        .await
        .map_err(|e| ApiError::from(e).with_request_id(request_id.clone()))?;

    tracing::debug!(request_id = %request_id, zone = %zone, "Zone derived");
    Ok(Json(DeriveZoneResponse { zone }))
}

/// Resolve the ordered zones a launch would attempt.
///
/// POST /v1/zones/candidates
async fn candidate_zones(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(req): Json<LaunchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id;

    let zones = state
        .zones()
        .start_instance_availability_zones(&req)
        .await
        .map_err(|e| ApiError::from(e).with_request_id(request_id.clone()))?;

    Ok(Json(CandidateZonesResponse { zones }))
}
