//! Admin Routes
//!
//! CRUD over ransom notices, behind HTTP Basic auth.
//!
//! - GET /api/admin/systems?search= - List systems
//! - POST /api/admin/systems - Create or replace a system
//! - GET /api/admin/systems/:jcode - Get a system
//! - PUT /api/admin/systems/:jcode - Update a system
//! - DELETE /api/admin/systems/:jcode - Delete a system
//! - PATCH /api/admin/systems/:jcode/evicted - Set the evicted flag
//! - PATCH /api/admin/systems/:jcode/ransomed - Set the ransomed flag
//! - GET /api/admin/schema - Database schema report

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::auth::AdminUser;
use crate::api::dto::{
    EvictedRequest, ListSystemsQuery, RansomedRequest, UpdateSystemRequest, UpsertSystemRequest,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::store::{normalize_jcode, SchemaReport, SystemDetail, SystemInput, SystemSummary};

fn not_found(jcode: &str) -> ApiError {
    ApiError::NotFound(format!("System {} not found", jcode))
}

/// GET /api/admin/systems
pub async fn list_systems(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<ListSystemsQuery>,
) -> ApiResult<Json<Vec<SystemSummary>>> {
    let systems = state.store.list_systems(query.search.as_deref())?;
    Ok(Json(systems))
}

/// POST /api/admin/systems
pub async fn upsert_system(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(req): Json<UpsertSystemRequest>,
) -> ApiResult<StatusCode> {
    let jcode = normalize_jcode(req.jcode.as_deref().unwrap_or(""))?;

    let input = SystemInput {
        ransom_isk: req.ransom_isk.into(),
        notes: req.notes.unwrap_or_default(),
        structures: req.structures,
    };
    state.store.upsert_system(&jcode, &input)?;

    Ok(StatusCode::CREATED)
}

/// GET /api/admin/systems/:jcode
pub async fn get_system(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(jcode): Path<String>,
) -> ApiResult<Json<SystemDetail>> {
    let jcode = jcode.trim().to_uppercase();
    let system = state
        .store
        .get_system(&jcode)?
        .ok_or_else(|| not_found(&jcode))?;
    Ok(Json(system))
}

/// PUT /api/admin/systems/:jcode
pub async fn update_system(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(jcode): Path<String>,
    Json(req): Json<UpdateSystemRequest>,
) -> ApiResult<StatusCode> {
    let jcode = jcode.trim().to_uppercase();

    let input = SystemInput {
        ransom_isk: req.ransom_isk.into(),
        notes: req.notes.unwrap_or_default(),
        structures: req.structures,
    };

    if state.store.update_system(&jcode, &input)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(&jcode))
    }
}

/// DELETE /api/admin/systems/:jcode
pub async fn delete_system(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(jcode): Path<String>,
) -> ApiResult<StatusCode> {
    let jcode = jcode.trim().to_uppercase();
    if state.store.delete_system(&jcode)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(&jcode))
    }
}

/// PATCH /api/admin/systems/:jcode/evicted
pub async fn set_evicted(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(jcode): Path<String>,
    Json(req): Json<EvictedRequest>,
) -> ApiResult<StatusCode> {
    let jcode = jcode.trim().to_uppercase();
    if state.store.set_evicted(&jcode, req.evicted)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(&jcode))
    }
}

/// PATCH /api/admin/systems/:jcode/ransomed
pub async fn set_ransomed(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(jcode): Path<String>,
    Json(req): Json<RansomedRequest>,
) -> ApiResult<StatusCode> {
    let jcode = jcode.trim().to_uppercase();
    if state.store.set_ransomed(&jcode, req.ransomed)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(&jcode))
    }
}

/// GET /api/admin/schema
pub async fn schema_report(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> ApiResult<Json<SchemaReport>> {
    Ok(Json(state.store.inspect()?))
}
