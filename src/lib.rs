//! # Reject
//!
//! Backend for a wormhole eviction crew: ransom notices, a contact form that
//! pings Discord, and an estimator for when an Upwell structure was anchored.
//!
//! ## Modules
//!
//! - [`age`]: structure-age index, CSV loader and reloadable service
//! - [`store`]: SQLite store for systems and their structures
//! - [`notify`]: outbound webhooks
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust
//! use reject::age::{AgeIndex, EstimateMethod};
//!
//! let index = AgeIndex::from_entries(vec![
//!     (1_000_000_000, 1_577_836_800),
//!     (1_000_000_100, 1_578_700_800),
//! ]);
//!
//! let est = index.estimate(1_000_000_050).unwrap();
//! assert_eq!(est.method, EstimateMethod::Interpolate);
//! assert!(est.low <= est.ts && est.ts <= est.high);
//! ```

pub mod age;
pub mod api;
pub mod config;
pub mod notify;
pub mod store;

// Re-export top-level types for convenience
pub use age::{AgeError, AgeEstimate, AgeIndex, AgeService, EstimateMethod, LoadReport};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{Config, ConfigError, LoggingConfig};

pub use notify::{DiscordConfig, DiscordWebhook, Notifier, NotifyError, WebhookPayload};

pub use store::{StoreError, SystemDetail, SystemStore, SystemSummary};
