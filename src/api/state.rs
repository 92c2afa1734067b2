//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::age::AgeService;
use crate::config::{AdminConfig, ServerConfig};
use crate::notify::Notifier;
use crate::store::SystemStore;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Structure-age index
    pub age: Arc<AgeService>,
    /// Systems and structures database
    pub store: Arc<SystemStore>,
    /// Delivery for negotiation requests (None when no webhook is configured)
    pub notifier: Option<Arc<dyn Notifier>>,
    /// Bot name put on webhook payloads
    pub notifier_username: Option<String>,
    /// Admin credentials for the basic-auth gate
    pub admin: Arc<AdminConfig>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState without a webhook
    pub fn new(
        age: Arc<AgeService>,
        store: Arc<SystemStore>,
        admin: AdminConfig,
        config: ServerConfig,
    ) -> Self {
        Self {
            age,
            store,
            notifier: None,
            notifier_username: None,
            admin: Arc::new(admin),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Attach a notifier for the contact form
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>, username: impl Into<String>) -> Self {
        self.notifier = Some(notifier);
        self.notifier_username = Some(username.into());
        self
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
