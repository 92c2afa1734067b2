//! Age Routes
//!
//! - GET /api/age/:id - Estimate when a structure was anchored
//! - POST /api/admin/age/reload - Re-read the first-seen CSV (admin)

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::age::{parse_structure_id, AgeError, LoadReport};
use crate::api::auth::AdminUser;
use crate::api::dto::AgeResponse;
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// GET /api/age/:id
///
/// 400 for a malformed ID, 503 while the index is empty, 404 when no
/// estimate can be made.
pub async fn estimate_age(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> ApiResult<Json<AgeResponse>> {
    let raw = raw.trim();
    let id = parse_structure_id(raw)?;

    let estimate = state.age.query(id).await?;
    let response =
        AgeResponse::from_estimate(raw, &estimate).ok_or(AgeError::NotEstimable(id))?;

    tracing::debug!(id, method = %estimate.method, "Estimated structure age");
    Ok(Json(response))
}

/// POST /api/admin/age/reload
///
/// Swap in a freshly read index. On failure the old index keeps serving.
pub async fn reload_index(
    State(state): State<Arc<AppState>>,
    AdminUser(user): AdminUser,
) -> ApiResult<Json<LoadReport>> {
    tracing::info!(user = %user, "Age index reload requested");
    let report = state.age.reload().await?;
    Ok(Json(report))
}
