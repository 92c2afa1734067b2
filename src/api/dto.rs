//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! Field names follow what the web frontend already sends and reads.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::age::AgeEstimate;
use crate::store::{Isk, Structure};

// ============================================
// AGE DTOs
// ============================================

/// Structure-age estimate response
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AgeResponse {
    /// Structure ID as requested
    pub id: String,
    /// exact | interpolate | extrapolate-head | extrapolate-tail
    pub method: String,
    #[serde(rename = "midISO")]
    pub mid_iso: String,
    #[serde(rename = "lowISO")]
    pub low_iso: String,
    #[serde(rename = "highISO")]
    pub high_iso: String,
    /// Window width in days, one decimal place
    #[serde(rename = "daysWide")]
    pub days_wide: String,
}

/// ISO 8601 with milliseconds and a `Z` suffix
pub fn iso_from_secs(secs: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl AgeResponse {
    /// `None` when a bound falls outside the representable date range
    pub fn from_estimate(id: &str, est: &AgeEstimate) -> Option<Self> {
        Some(Self {
            id: id.to_string(),
            method: est.method.as_str().to_string(),
            mid_iso: iso_from_secs(est.ts)?,
            low_iso: iso_from_secs(est.low)?,
            high_iso: iso_from_secs(est.high)?,
            days_wide: est.days_wide(),
        })
    }
}

// ============================================
// PUBLIC DTOs
// ============================================

/// Contact form submission
#[derive(Debug, Default, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub jcode: Option<String>,
    /// In-game name of the pilot asking
    #[serde(default)]
    pub ign: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================
// ADMIN DTOs
// ============================================

/// Create-or-replace a system
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertSystemRequest {
    #[serde(default)]
    pub jcode: Option<String>,
    #[serde(rename = "ransomISK", default)]
    pub ransom_isk: Isk,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub structures: Vec<Structure>,
}

/// Update an existing system
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSystemRequest {
    #[serde(rename = "ransomISK", default)]
    pub ransom_isk: Isk,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub structures: Vec<Structure>,
}

/// `?search=` on the admin list
#[derive(Debug, Default, Deserialize)]
pub struct ListSystemsQuery {
    #[serde(default)]
    pub search: Option<String>,
}

/// PATCH body for the evicted flag
#[derive(Debug, Default, Deserialize)]
pub struct EvictedRequest {
    #[serde(default)]
    pub evicted: bool,
}

/// PATCH body for the ransomed flag
#[derive(Debug, Default, Deserialize)]
pub struct RansomedRequest {
    #[serde(default)]
    pub ransomed: bool,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// healthy | degraded | unhealthy
    pub status: String,
    pub database: String,
    pub age_index: AgeIndexHealth,
    pub uptime_seconds: u64,
    pub version: String,
}

/// Age index part of the health response
#[derive(Debug, Serialize)]
pub struct AgeIndexHealth {
    pub loaded: bool,
    pub rows: usize,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
