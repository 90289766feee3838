//! Analysis domain module
//!
//! Completed scans and the vulnerabilities they carry.

pub mod entities;
mod lenient;
pub mod value_objects;

pub use entities::*;
pub use value_objects::*;
