//! Domain layer
//!
//! Analysis results are produced by the scanning platform and consumed
//! read-only here; dashboard types describe the rollups derived from them.

pub mod analysis;
pub mod dashboard;
