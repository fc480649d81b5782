//! # Mizan Support
//!
//! Utilities shared between the mizan crates:
//! - rendering of type names and findings for diagnostics

pub mod rendering;
