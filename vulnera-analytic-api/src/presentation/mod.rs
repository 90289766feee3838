//! Analytic presentation layer

pub mod controllers;
pub mod models;
pub mod routes;

pub use controllers::*;
pub use models::*;
pub use routes::{ApiDoc, create_router};
