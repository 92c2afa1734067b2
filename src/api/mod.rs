//! Reject REST API
//!
//! HTTP layer over the age index and the ransom notice store, built with Axum.
//!
//! # Endpoints
//!
//! ## Public
//! - `GET /api/age/:id` - Structure age estimate
//! - `GET /api/lookup/:jcode` - Ransom notice for a system
//! - `POST /api/contact` - Negotiation request, forwarded to Discord
//!
//! ## Admin (HTTP Basic)
//! - `GET /api/admin/systems` - List systems (`?search=`)
//! - `POST /api/admin/systems` - Create or replace a system
//! - `GET /api/admin/systems/:jcode` - Get a system
//! - `PUT /api/admin/systems/:jcode` - Update a system
//! - `DELETE /api/admin/systems/:jcode` - Delete a system
//! - `PATCH /api/admin/systems/:jcode/evicted` - Set the evicted flag
//! - `PATCH /api/admin/systems/:jcode/ransomed` - Set the ransomed flag
//! - `POST /api/admin/age/reload` - Reload the age index
//! - `GET /api/admin/schema` - Schema report
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use reject::age::AgeService;
//! use reject::api::{serve, AppState};
//! use reject::config::Config;
//! use reject::store::SystemStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let age = Arc::new(AgeService::load(&config.age.csv_path).await);
//!     let store = Arc::new(SystemStore::open(&config.database.path, true)?);
//!
//!     let state = AppState::new(age, store, config.admin.clone(), config.server.clone());
//!     serve(state, &config.server).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ServerConfig;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route(
            "/systems",
            get(routes::admin::list_systems).post(routes::admin::upsert_system),
        )
        .route(
            "/systems/:jcode",
            get(routes::admin::get_system)
                .put(routes::admin::update_system)
                .delete(routes::admin::delete_system),
        )
        .route("/systems/:jcode/evicted", patch(routes::admin::set_evicted))
        .route("/systems/:jcode/ransomed", patch(routes::admin::set_ransomed))
        .route("/age/reload", post(routes::age::reload_index))
        .route("/schema", get(routes::admin::schema_report));

    let api_routes = Router::new()
        .route("/age/:id", get(routes::age::estimate_age))
        .route("/lookup/:jcode", get(routes::public::lookup))
        .route("/contact", post(routes::public::contact))
        .nest("/admin", admin_routes);

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.cors_origins);
    let body_limit = state.config.max_body_bytes;

    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api", api_routes)
        .nest("/health", health_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Permissive when no origins are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ServerConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Reject API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Reject API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::age::{AgeIndex, AgeService};
    use crate::config::AdminConfig;
    use crate::notify::{Notifier, NotifyError, WebhookPayload};
    use crate::store::SystemStore;
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use std::io::Write;
    use tempfile::tempdir;
    use tokio::sync::Mutex;
    use tower::util::ServiceExt;

    const JAN_1_2020: i64 = 1_577_836_800;
    const DAY: i64 = 86_400;

    /// Records payloads instead of posting them
    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<WebhookPayload>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(&self, payload: &WebhookPayload) -> Result<(), NotifyError> {
            self.sent.lock().await.push(payload.clone());
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        fn name(&self) -> &str {
            "failing"
        }

        async fn send(&self, _payload: &WebhookPayload) -> Result<(), NotifyError> {
            Err(NotifyError::Status(500))
        }
    }

    fn sample_index() -> AgeIndex {
        AgeIndex::from_entries(vec![
            (1_000_000_000, JAN_1_2020),
            (1_000_000_100, JAN_1_2020 + 10 * DAY),
            (1_000_000_200, JAN_1_2020 + 20 * DAY),
        ])
    }

    fn admin() -> AdminConfig {
        AdminConfig {
            user: Some("admin".to_string()),
            pass: Some("hunter2".to_string()),
        }
    }

    fn test_state(age: AgeService) -> AppState {
        let store = SystemStore::open_in_memory().unwrap();
        AppState::new(
            Arc::new(age),
            Arc::new(store),
            admin(),
            ServerConfig::default(),
        )
    }

    fn create_test_app() -> Router {
        build_router(test_state(AgeService::from_index("memory", sample_index())))
    }

    fn basic(user: &str, pass: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{}:{}", user, pass)))
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_req(method: &str, uri: &str, body: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn admin_get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, basic("admin", "hunter2"))
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn seed_system(app: &Router, body: &str) {
        let auth = basic("admin", "hunter2");
        let response = app
            .clone()
            .oneshot(json_req("POST", "/api/admin/systems", body, Some(&auth)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_health_live() {
        let app = create_test_app();
        let response = app.oneshot(get_req("/health/live")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready() {
        let app = create_test_app();
        let response = app.oneshot(get_req("/health/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let app = create_test_app();
        let response = app.oneshot(get_req("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["database"], "ok");
        assert_eq!(json["age_index"]["loaded"], true);
        assert_eq!(json["age_index"]["rows"], 3);
    }

    #[tokio::test]
    async fn test_age_exact() {
        let app = create_test_app();
        let response = app.oneshot(get_req("/api/age/1000000100")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["id"], "1000000100");
        assert_eq!(json["method"], "exact");
        assert_eq!(json["midISO"], "2020-01-11T00:00:00.000Z");
        assert_eq!(json["lowISO"], "2020-01-08T00:00:00.000Z");
        assert_eq!(json["highISO"], "2020-01-14T00:00:00.000Z");
        assert_eq!(json["daysWide"], "6.0");
    }

    #[tokio::test]
    async fn test_age_interpolate() {
        let app = create_test_app();
        let response = app.oneshot(get_req("/api/age/1000000050")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["method"], "interpolate");
        assert_eq!(json["midISO"], "2020-01-06T00:00:00.000Z");
        assert_eq!(json["daysWide"], "5.0");
    }

    #[tokio::test]
    async fn test_age_extrapolate_tail() {
        let app = create_test_app();
        let response = app.oneshot(get_req("/api/age/1000000300")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["method"], "extrapolate-tail");
        assert_eq!(json["midISO"], "2020-01-31T00:00:00.000Z");
        assert_eq!(json["daysWide"], "14.0");
    }

    #[tokio::test]
    async fn test_age_invalid_id() {
        let app = create_test_app();
        for uri in ["/api/age/123", "/api/age/abc", "/api/age/12345678901x"] {
            let response = app.clone().oneshot(get_req(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_age_not_loaded() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.csv");
        let app = build_router(test_state(AgeService::load(&missing).await));

        let response = app.oneshot(get_req("/api/age/1000000100")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "AGE_INDEX_NOT_LOADED");
    }

    #[tokio::test]
    async fn test_lookup() {
        let app = create_test_app();
        seed_system(
            &app,
            r#"{"jcode": "j123456", "ransomISK": "2.5b", "notes": "pay up",
                "structures": [{"kind": "Astrahus", "fitText": "", "estimatedISK": "1b"}]}"#,
        )
        .await;

        let response = app
            .clone()
            .oneshot(get_req("/api/lookup/j123456"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["jcode"], "J123456");
        assert_eq!(json["ransomISK"], 2_500_000_000i64);
        assert_eq!(json["totalStructuresISK"], 1_000_000_000i64);
        assert_eq!(json["pilot"], "Leshak Pilot 1");

        let response = app.clone().oneshot(get_req("/api/lookup/J654321")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.oneshot(get_req("/api/lookup/Jita")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_requires_auth() {
        let app = create_test_app();

        let response = app
            .clone()
            .oneshot(get_req("/api/admin/systems"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"admin\""
        );

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/admin/systems")
                    .header(header::AUTHORIZATION, basic("admin", "wrong"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_crud() {
        let app = create_test_app();
        let auth = basic("admin", "hunter2");
        seed_system(&app, r#"{"jcode": "J100001", "ransomISK": 500000000}"#).await;
        seed_system(&app, r#"{"jcode": "J200002", "ransomISK": "1b"}"#).await;

        let response = app
            .clone()
            .oneshot(admin_get("/api/admin/systems?search=J1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["jcode"], "J100001");

        let response = app
            .clone()
            .oneshot(json_req(
                "PUT",
                "/api/admin/systems/J100001",
                r#"{"ransomISK": "750m", "notes": "revised"}"#,
                Some(&auth),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .clone()
            .oneshot(admin_get("/api/admin/systems/J100001"))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["ransomISK"], 750_000_000i64);
        assert_eq!(json["notes"], "revised");

        let response = app
            .clone()
            .oneshot(json_req(
                "PATCH",
                "/api/admin/systems/J100001/evicted",
                r#"{"evicted": true}"#,
                Some(&auth),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .clone()
            .oneshot(json_req(
                "PUT",
                "/api/admin/systems/J999999",
                r#"{"ransomISK": 1}"#,
                Some(&auth),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/admin/systems/J100001")
                    .header(header::AUTHORIZATION, &auth)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(admin_get("/api/admin/systems/J100001"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_upsert_rejects_bad_jcode() {
        let app = create_test_app();
        let auth = basic("admin", "hunter2");
        let response = app
            .oneshot(json_req(
                "POST",
                "/api/admin/systems",
                r#"{"jcode": "Amarr", "ransomISK": 1}"#,
                Some(&auth),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_schema() {
        let app = create_test_app();
        let response = app.oneshot(admin_get("/api/admin/schema")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["ok"], true);
    }

    #[tokio::test]
    async fn test_admin_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("first_seen.csv");
        let app = build_router(test_state(AgeService::load(&path).await));
        let auth = basic("admin", "hunter2");

        let reload = || {
            Request::builder()
                .method("POST")
                .uri("/api/admin/age/reload")
                .header(header::AUTHORIZATION, &auth)
                .body(Body::empty())
                .unwrap()
        };

        let response = app.clone().oneshot(reload()).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "structure_id,first_seen").unwrap();
        writeln!(file, "1000000000,2020-01-01T00:00:00Z").unwrap();
        writeln!(file, "1000000100,2020-01-11T00:00:00Z").unwrap();
        drop(file);

        let response = app.clone().oneshot(reload()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["rows"], 2);

        let response = app.oneshot(get_req("/api/age/1000000100")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_contact_forwards_embed() {
        let notifier = Arc::new(RecordingNotifier::default());
        let state = test_state(AgeService::from_index("memory", sample_index()))
            .with_notifier(notifier.clone(), "SALT MINER WOOOO");
        let app = build_router(state);
        seed_system(&app, r#"{"jcode": "J123456", "ransomISK": "1.5b"}"#).await;

        let response = app
            .oneshot(json_req(
                "POST",
                "/api/contact",
                r#"{"jcode": "j123456", "ign": "Some Pilot", "message": "can we talk"}"#,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let sent = notifier.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].username.as_deref(), Some("SALT MINER WOOOO"));

        let embed = &sent[0].embeds[0];
        let values: Vec<&str> = embed.fields.iter().map(|f| f.value.as_str()).collect();
        assert!(values.contains(&"J123456"));
        assert!(values.contains(&"Some Pilot"));
        assert!(values.contains(&"1.50b ISK"));
    }

    #[tokio::test]
    async fn test_contact_missing_fields() {
        let notifier = Arc::new(RecordingNotifier::default());
        let state = test_state(AgeService::from_index("memory", sample_index()))
            .with_notifier(notifier.clone(), "bot");
        let app = build_router(state);

        let response = app
            .oneshot(json_req(
                "POST",
                "/api/contact",
                r#"{"jcode": "J123456", "ign": "  "}"#,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(notifier.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_contact_without_webhook() {
        let app = create_test_app();
        let response = app
            .oneshot(json_req(
                "POST",
                "/api/contact",
                r#"{"jcode": "J123456", "ign": "Pilot", "message": "hi"}"#,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_contact_webhook_failure() {
        let state = test_state(AgeService::from_index("memory", sample_index()))
            .with_notifier(Arc::new(FailingNotifier), "bot");
        let app = build_router(state);

        let response = app
            .oneshot(json_req(
                "POST",
                "/api/contact",
                r#"{"jcode": "J123456", "ign": "Pilot", "message": "hi"}"#,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let app = create_test_app();
        let response = app
            .oneshot(json_req("POST", "/api/contact", "not json", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
