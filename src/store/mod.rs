//! Systems Store
//!
//! SQLite persistence for ransom notices:
//! - [`SystemStore`]: CRUD over systems and their structures
//! - [`schema`]: create-if-empty and read-only schema inspection
//! - [`isk`]: ISK amount parsing and short formatting

mod error;
pub mod isk;
pub mod schema;
mod systems;

pub use error::{StoreError, StoreResult};
pub use isk::{format_isk_short, parse_isk, Isk};
pub use schema::{CreateOutcome, SchemaReport};
pub use systems::{
    normalize_jcode, Structure, SystemDetail, SystemInput, SystemStore, SystemSummary,
    NOTICE_PILOT,
};
