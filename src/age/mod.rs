//! Structure Age Estimation
//!
//! Estimates when an Upwell structure was anchored from its item ID, using a
//! crawler export of `(structure_id, first_seen)` pairs.
//!
//! - [`AgeIndex`]: immutable sorted index with the estimator
//! - [`loader`]: CSV parsing into an index
//! - [`AgeService`]: shared, reloadable index used by the API

mod error;
mod index;
pub mod loader;
mod service;

pub use error::{AgeError, AgeResult};
pub use index::{
    AgeEstimate, AgeIndex, EstimateMethod, DAY_SECS, EXACT_PAD_SECS, EXTRAPOLATE_PAD_SECS,
    MAX_INTERPOLATE_PAD_SECS, MIN_INTERPOLATE_PAD_SECS,
};
pub use loader::ParseStats;
pub use service::{parse_structure_id, AgeService, IndexSnapshot, LoadReport, MIN_ID_DIGITS};
