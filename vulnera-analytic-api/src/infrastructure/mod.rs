//! Analytic API infrastructure

pub mod ingestion_queue;

pub use ingestion_queue::{
    IngestionQueueError, IngestionQueueHandle, QueuedAnalysis, spawn_ingestion_worker,
};
