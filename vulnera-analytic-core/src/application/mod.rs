//! Application Layer - Use cases over the dashboard domain

pub mod dashboard;

pub use dashboard::*;
