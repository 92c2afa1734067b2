//! Age Service
//!
//! Owns the process-wide [`AgeIndex`] and its reload path.
//!
//! Readers take a cheap `Arc` clone of the current snapshot and estimate
//! without holding any lock. A reload builds a complete new snapshot off the
//! async runtime and publishes it with a single write, so a query sees either
//! the old index or the new one, never a mix. Reloads are serialized.

use super::loader::{self, ParseStats};
use super::{AgeError, AgeEstimate, AgeIndex, AgeResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Minimum number of digits in a structure ID
pub const MIN_ID_DIGITS: usize = 10;

/// Outcome of the most recent load attempt
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub source: PathBuf,
    pub rows: usize,
    pub skipped: usize,
    pub loaded_at: DateTime<Utc>,
    /// Error text when the load fell back to an empty index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// An index together with the report of the load that produced it
#[derive(Debug)]
pub struct IndexSnapshot {
    pub index: AgeIndex,
    pub report: Option<LoadReport>,
}

impl IndexSnapshot {
    fn empty() -> Self {
        Self {
            index: AgeIndex::empty(),
            report: None,
        }
    }
}

/// Shared age index with atomic whole-index reloads
pub struct AgeService {
    source: PathBuf,
    current: RwLock<Arc<IndexSnapshot>>,
    reload_lock: Mutex<()>,
}

impl AgeService {
    /// A service with an empty index; nothing is read yet
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            current: RwLock::new(Arc::new(IndexSnapshot::empty())),
            reload_lock: Mutex::new(()),
        }
    }

    /// Create the service and load the source once.
    ///
    /// A missing or unreadable source leaves the index empty; queries then
    /// report [`AgeError::NotLoaded`] instead of the process refusing to start.
    pub async fn load(source: impl Into<PathBuf>) -> Self {
        let service = Self::new(source);
        if let Err(e) = service.reload().await {
            tracing::warn!(error = %e, "Age index unavailable, serving without it");
            let report = LoadReport {
                source: service.source.clone(),
                rows: 0,
                skipped: 0,
                loaded_at: Utc::now(),
                error: Some(e.to_string()),
            };
            service
                .publish(IndexSnapshot {
                    index: AgeIndex::empty(),
                    report: Some(report),
                })
                .await;
        }
        service
    }

    /// Wrap an already-built index (tests, offline tools)
    pub fn from_index(source: impl Into<PathBuf>, index: AgeIndex) -> Self {
        let source = source.into();
        let report = LoadReport {
            source: source.clone(),
            rows: index.len(),
            skipped: 0,
            loaded_at: Utc::now(),
            error: None,
        };
        Self {
            source,
            current: RwLock::new(Arc::new(IndexSnapshot {
                index,
                report: Some(report),
            })),
            reload_lock: Mutex::new(()),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Re-read the source and swap in the new index.
    ///
    /// On failure the previous index stays in place.
    pub async fn reload(&self) -> AgeResult<LoadReport> {
        let _guard = self.reload_lock.lock().await;

        let path = self.source.clone();
        let (index, stats) = tokio::task::spawn_blocking(move || loader::load_path(&path))
            .await
            .map_err(|e| AgeError::SourceUnavailable {
                path: self.source.clone(),
                error: format!("loader task failed: {e}"),
            })??;

        let report = self.report_for(&stats);
        tracing::info!(
            rows = stats.rows,
            skipped = stats.skipped,
            header = stats.header,
            path = ?self.source,
            "Loaded age index"
        );

        self.publish(IndexSnapshot {
            index,
            report: Some(report.clone()),
        })
        .await;

        Ok(report)
    }

    fn report_for(&self, stats: &ParseStats) -> LoadReport {
        LoadReport {
            source: self.source.clone(),
            rows: stats.rows,
            skipped: stats.skipped,
            loaded_at: Utc::now(),
            error: None,
        }
    }

    async fn publish(&self, snapshot: IndexSnapshot) {
        *self.current.write().await = Arc::new(snapshot);
    }

    /// The index currently being served
    pub async fn snapshot(&self) -> Arc<IndexSnapshot> {
        Arc::clone(&*self.current.read().await)
    }

    /// Number of entries in the current index
    pub async fn len(&self) -> usize {
        self.snapshot().await.index.len()
    }

    pub async fn is_loaded(&self) -> bool {
        !self.snapshot().await.index.is_empty()
    }

    /// Report of the last load, if any
    pub async fn status(&self) -> Option<LoadReport> {
        self.snapshot().await.report.clone()
    }

    /// Estimate the creation time of a structure
    pub async fn query(&self, id: u64) -> AgeResult<AgeEstimate> {
        let snapshot = self.snapshot().await;
        if snapshot.index.is_empty() {
            return Err(AgeError::NotLoaded);
        }
        snapshot.index.estimate(id).ok_or(AgeError::NotEstimable(id))
    }
}

/// Validate a structure ID as it arrives over HTTP: at least ten ASCII
/// digits that fit in a `u64`.
pub fn parse_structure_id(raw: &str) -> AgeResult<u64> {
    let trimmed = raw.trim();
    if trimmed.len() < MIN_ID_DIGITS || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AgeError::InvalidId(raw.to_string()));
    }
    trimmed
        .parse::<u64>()
        .map_err(|_| AgeError::InvalidId(raw.to_string()))
}
