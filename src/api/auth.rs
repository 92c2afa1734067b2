//! Admin Authentication
//!
//! HTTP Basic gate for the admin routes. Add [`AdminUser`] to a handler's
//! arguments to require it.
//!
//! - no `Authorization: Basic` header → 401 with a `WWW-Authenticate` challenge
//! - wrong credentials, or none configured → 403

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::config::AdminConfig;

/// An authenticated admin
#[derive(Debug, Clone)]
pub struct AdminUser(pub String);

/// Split a `Basic` authorization header into user and password.
///
/// Returns `None` when the scheme is not Basic. A payload that does not
/// decode yields empty credentials, which never match.
pub fn parse_basic(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = STANDARD
        .decode(encoded.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_default();

    let (user, pass) = decoded.split_once(':').unwrap_or((decoded.as_str(), ""));
    Some((user.to_string(), pass.to_string()))
}

/// Both configured and equal
pub fn credentials_match(admin: &AdminConfig, user: &str, pass: &str) -> bool {
    match (&admin.user, &admin.pass) {
        (Some(u), Some(p)) => u == user && p == pass,
        _ => false,
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        let (user, pass) = parse_basic(header).ok_or(ApiError::Unauthorized)?;

        if credentials_match(&state.admin, &user, &pass) {
            Ok(AdminUser(user))
        } else {
            tracing::warn!(user = %user, "Rejected admin credentials");
            Err(ApiError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(user: &str, pass: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{}:{}", user, pass)))
    }

    fn admin() -> AdminConfig {
        AdminConfig {
            user: Some("admin".to_string()),
            pass: Some("s3cret".to_string()),
        }
    }

    #[test]
    fn test_parse_basic() {
        assert_eq!(
            parse_basic(&basic("admin", "s3cret")),
            Some(("admin".to_string(), "s3cret".to_string()))
        );
        assert_eq!(parse_basic("Bearer abc"), None);
        assert_eq!(parse_basic(""), None);
        assert_eq!(
            parse_basic("Basic !!!"),
            Some((String::new(), String::new()))
        );
    }

    #[test]
    fn test_password_may_contain_colon() {
        let (user, pass) = parse_basic(&basic("admin", "a:b")).unwrap();
        assert_eq!(user, "admin");
        assert_eq!(pass, "a:b");
    }

    #[test]
    fn test_credentials_match() {
        assert!(credentials_match(&admin(), "admin", "s3cret"));
        assert!(!credentials_match(&admin(), "admin", "wrong"));
        assert!(!credentials_match(&AdminConfig::default(), "", ""));
    }
}
