//! Public Routes
//!
//! - GET /api/lookup/:jcode - Ransom notice for a system
//! - POST /api/contact - Forward a negotiation request to Discord

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::ContactRequest;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::notify::{negotiation_embed, WebhookPayload};
use crate::store::{format_isk_short, normalize_jcode, SystemDetail};

/// GET /api/lookup/:jcode
pub async fn lookup(
    State(state): State<Arc<AppState>>,
    Path(jcode): Path<String>,
) -> ApiResult<Json<SystemDetail>> {
    let jcode = normalize_jcode(&jcode)?;

    let system = state
        .store
        .get_system(&jcode)?
        .ok_or_else(|| ApiError::NotFound(format!("No notice for {}", jcode)))?;

    Ok(Json(system))
}

fn required(field: Option<String>) -> Option<String> {
    field.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// POST /api/contact
///
/// Sends one webhook; 502 if Discord refuses it.
pub async fn contact(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ContactRequest>,
) -> ApiResult<StatusCode> {
    let (Some(jcode), Some(ign), Some(message)) =
        (required(req.jcode), required(req.ign), required(req.message))
    else {
        return Err(ApiError::Validation("Missing fields".to_string()));
    };

    let notifier = state
        .notifier
        .as_ref()
        .ok_or_else(|| ApiError::NotConfigured("Webhook not configured".to_string()))?;

    let jcode = jcode.to_uppercase();
    // a contact for a system without a notice is still forwarded
    let quoted = match state.store.get_system(&jcode) {
        Ok(sys) => sys.map(|s| format_isk_short(s.ransom_isk)),
        Err(e) => {
            tracing::warn!(error = %e, jcode = %jcode, "Quote lookup failed");
            None
        }
    };

    let payload = WebhookPayload {
        username: state.notifier_username.clone(),
        content: None,
        embeds: vec![negotiation_embed(&jcode, &ign, &message, quoted.as_deref())],
    };

    notifier.send(&payload).await?;

    tracing::info!(jcode = %jcode, notifier = notifier.name(), "Forwarded negotiation request");
    Ok(StatusCode::NO_CONTENT)
}
