//! API Routes
//!
//! Route handlers organized by functionality.

pub mod admin;
pub mod age;
pub mod health;
pub mod public;
