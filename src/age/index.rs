//! Age Index - sorted structure ID → first-seen timestamp lookup
//!
//! Structure IDs are handed out roughly in creation order, so a sorted table
//! of IDs with the time a crawler first saw them is enough to guess the age of
//! any other structure:
//!
//! ```text
//! ids:    1000000001   1000000101   1000000201
//! epochs: 2020-01-01   2020-01-11   2020-02-10
//!                  ▲
//!             1000000051 → halfway between its neighbours → 2020-01-06
//! ```
//!
//! # Estimation
//! - exact hit: the recorded timestamp, ±3 days
//! - between two entries: linear interpolation, ±¼ of the local gap
//!   clamped to 2..=7 days
//! - outside the table: extrapolate along the two boundary entries, ±7 days
//!
//! Identifier arithmetic stays in integers until the final ratio; structure
//! IDs are far beyond 2^53.

use serde::{Deserialize, Serialize};

/// Seconds in a day
pub const DAY_SECS: i64 = 86_400;

/// Half-width of the window around an exact hit
pub const EXACT_PAD_SECS: i64 = 3 * DAY_SECS;

/// Half-width of the window for extrapolated estimates
pub const EXTRAPOLATE_PAD_SECS: i64 = 7 * DAY_SECS;

/// Smallest half-width of an interpolated window
pub const MIN_INTERPOLATE_PAD_SECS: i64 = 2 * DAY_SECS;

/// Largest half-width of an interpolated window
pub const MAX_INTERPOLATE_PAD_SECS: i64 = 7 * DAY_SECS;

/// How an estimate was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EstimateMethod {
    Exact,
    Interpolate,
    ExtrapolateHead,
    ExtrapolateTail,
}

impl EstimateMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimateMethod::Exact => "exact",
            EstimateMethod::Interpolate => "interpolate",
            EstimateMethod::ExtrapolateHead => "extrapolate-head",
            EstimateMethod::ExtrapolateTail => "extrapolate-tail",
        }
    }
}

impl std::fmt::Display for EstimateMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estimated creation time with its uncertainty window (Unix seconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeEstimate {
    pub method: EstimateMethod,
    pub ts: i64,
    pub low: i64,
    pub high: i64,
}

impl AgeEstimate {
    fn around(method: EstimateMethod, ts: i64, pad: i64) -> Self {
        Self {
            method,
            ts,
            low: ts.saturating_sub(pad),
            high: ts.saturating_add(pad),
        }
    }

    /// Window width in days, one decimal place, ties rounded up
    pub fn days_wide(&self) -> String {
        let secs = self.high.saturating_sub(self.low);
        let tenths = (secs as f64 / (DAY_SECS / 10) as f64).round();
        format!("{:.1}", tenths / 10.0)
    }
}

/// Immutable sorted index of structure IDs and their first-seen timestamps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgeIndex {
    ids: Vec<u64>,
    epochs: Vec<i64>,
}

impl AgeIndex {
    /// An index with no entries; every estimate is `None`
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from unsorted `(id, epoch_secs)` pairs.
    ///
    /// Entries are sorted by id. Duplicates are kept; which of several equal
    /// ids ends up first is unspecified.
    pub fn from_entries(mut entries: Vec<(u64, i64)>) -> Self {
        entries.sort_unstable_by_key(|&(id, _)| id);
        let (ids, epochs) = entries.into_iter().unzip();
        Self { ids, epochs }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    pub fn epochs(&self) -> &[i64] {
        &self.epochs
    }

    /// Smallest and largest indexed id
    pub fn id_range(&self) -> Option<(u64, u64)> {
        Some((*self.ids.first()?, *self.ids.last()?))
    }

    /// Leftmost position at which `id` could be inserted keeping `ids` sorted
    pub fn lower_bound(&self, id: u64) -> usize {
        self.ids.partition_point(|&x| x < id)
    }

    /// Estimate the creation time of `id`. `None` only for an empty index.
    pub fn estimate(&self, id: u64) -> Option<AgeEstimate> {
        let len = self.ids.len();
        let i = self.lower_bound(id);

        if i < len && self.ids[i] == id {
            return Some(AgeEstimate::around(
                EstimateMethod::Exact,
                self.epochs[i],
                EXACT_PAD_SECS,
            ));
        }

        if len == 0 {
            return None;
        }

        if i == 0 || i == len {
            return Some(self.extrapolate(id, i == 0));
        }

        Some(self.interpolate(id, i - 1, i))
    }

    fn extrapolate(&self, id: u64, head: bool) -> AgeEstimate {
        let len = self.ids.len();
        // A single entry has nothing to take a slope from; it degenerates to
        // a flat projection of that one point.
        let (a, b) = if head {
            (0, 1.min(len - 1))
        } else {
            (len.saturating_sub(2), len - 1)
        };

        let did = self.ids[b] - self.ids[a];
        let dts = self.epochs[b] as i128 - self.epochs[a] as i128;
        let slope = if did == 0 { 0.0 } else { dts as f64 / did as f64 };

        let base = if head { a } else { b };
        let offset = id as i128 - self.ids[base] as i128;
        let ts = round_to_secs(self.epochs[base] as f64 + slope * offset as f64);

        let method = if head {
            EstimateMethod::ExtrapolateHead
        } else {
            EstimateMethod::ExtrapolateTail
        };
        AgeEstimate::around(method, ts, EXTRAPOLATE_PAD_SECS)
    }

    fn interpolate(&self, id: u64, lo: usize, hi: usize) -> AgeEstimate {
        let (lo_id, hi_id) = (self.ids[lo], self.ids[hi]);
        let (lo_ts, hi_ts) = (self.epochs[lo], self.epochs[hi]);

        let did = hi_id - lo_id;
        let alpha = if did == 0 {
            0.5
        } else {
            (id - lo_id) as f64 / did as f64
        };
        let dts = hi_ts as i128 - lo_ts as i128;
        let ts = round_to_secs(lo_ts as f64 + alpha * dts as f64);

        let gap = dts.abs();
        let half = round_to_secs(gap as f64 * 0.25);
        let pad = half.clamp(MIN_INTERPOLATE_PAD_SECS, MAX_INTERPOLATE_PAD_SECS);

        AgeEstimate::around(EstimateMethod::Interpolate, ts, pad)
    }
}

/// Round half away from zero; saturates at the i64 range
fn round_to_secs(value: f64) -> i64 {
    value.round() as i64
}
