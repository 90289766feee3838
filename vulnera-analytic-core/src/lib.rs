//! Vulnera Analytic Core - Dashboard analytics foundation
//!
//! This crate turns completed security analyses into pre-aggregated rollups and
//! serves them back as dashboard charts.
//!
//! # Modules
//!
//! - [`config`] : Strongly-typed configuration with TOML and environment variable support
//! - [`domain`] : Analysis entities, rollup records, dashboard filter and repository traits
//! - [`application`] : Aggregation, dashboard assembly and ingestion use cases
//! - [`infrastructure`] : PostgreSQL and in-memory rollup stores
//! - [`logging`] : Structured logging with tracing
//!
//! # Architecture
//!
//! ```text
//! vulnera-analytic-core/
//! ├── domain/
//! │   ├── analysis/     # Scan results as produced by the analysis platform
//! │   └── dashboard/    # Rollups, filter, errors, store trait
//! ├── application/
//! │   └── dashboard/    # Aggregator, chart assembly, ingestion writer
//! ├── infrastructure/
//! │   └── dashboard/    # SQLx (PostgreSQL) and in-memory stores
//! └── config/           # Configuration management
//! ```
//!
//! # Data flow
//!
//! ```text
//! AnalysisResult ──► AnalysisAggregator ──► rollups ──► IDashboardRepository::upsert_*
//! DashboardFilter ──► GetDashboardChartsUseCase ──► IDashboardRepository reads ──► DashboardCharts
//! ```
//!
//! # Configuration
//!
//! Environment variables use the `VULNERA__` prefix with double underscore separators:
//!
//! ```bash
//! VULNERA__SERVER__PORT=8005
//! VULNERA__DASHBOARD__QUERY_STRATEGY=concurrent
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;

pub use config::Config;
pub use logging::init_tracing;
