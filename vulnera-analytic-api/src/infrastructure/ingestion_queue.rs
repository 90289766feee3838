use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use vulnera_analytic_core::application::dashboard::{IngestAnalysisUseCase, IngestionOutcome};
use vulnera_analytic_core::config::IngestionConfig;
use vulnera_analytic_core::domain::analysis::AnalysisResult;

/// Message delivered to the ingestion worker when an analysis is accepted.
#[derive(Debug, Clone)]
pub struct QueuedAnalysis {
    pub analysis: AnalysisResult,
    pub enqueued_at: DateTime<Utc>,
}

/// Handle that allows HTTP handlers to push analyses into the background worker.
#[derive(Clone)]
pub struct IngestionQueueHandle {
    sender: mpsc::Sender<QueuedAnalysis>,
}

impl IngestionQueueHandle {
    pub fn new(sender: mpsc::Sender<QueuedAnalysis>) -> Self {
        Self { sender }
    }

    /// Bounded queue plus the receiver the worker consumes
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<QueuedAnalysis>) {
        let (sender, receiver) =
            mpsc::channel(capacity.clamp(1, IngestionConfig::MAX_QUEUE_CAPACITY));
        (Self::new(sender), receiver)
    }

    /// Enqueue without waiting; a full queue is reported to the caller
    pub fn enqueue(&self, analysis: AnalysisResult) -> Result<(), IngestionQueueError> {
        let analysis_id = analysis.id;
        self.sender
            .try_send(QueuedAnalysis {
                analysis,
                enqueued_at: Utc::now(),
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    warn!(analysis_id = %analysis_id, "Ingestion queue is full");
                    IngestionQueueError::Full
                }
                mpsc::error::TrySendError::Closed(_) => {
                    error!(analysis_id = %analysis_id, "Ingestion queue is closed");
                    IngestionQueueError::Closed
                }
            })
    }

    pub fn capacity(&self) -> usize {
        self.sender.max_capacity()
    }

    /// Free slots left in the queue
    pub fn available(&self) -> usize {
        self.sender.capacity()
    }
}

/// Errors that can occur when enqueuing an analysis.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestionQueueError {
    #[error("Ingestion queue is full")]
    Full,
    #[error("Ingestion queue is closed")]
    Closed,
}

/// Spawn the worker that drains the queue into the ingestion use case.
///
/// At most `max_concurrent` analyses are ingested at once. When `shutdown` is
/// cancelled the queue is closed to new analyses and the ones already
/// accepted are still ingested. The returned handle resolves once the queue is
/// empty and every in-flight ingestion has finished.
pub fn spawn_ingestion_worker(
    mut receiver: mpsc::Receiver<QueuedAnalysis>,
    use_case: Arc<IngestAnalysisUseCase>,
    max_concurrent: usize,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    let concurrency = max_concurrent.clamp(1, IngestionConfig::MAX_CONCURRENT_INGESTIONS);
    let semaphore = Arc::new(Semaphore::new(concurrency));

    tokio::spawn(async move {
        info!("Ingestion worker started with concurrency: {}", concurrency);

        loop {
            let queued = tokio::select! {
                _ = shutdown.cancelled() => break,
                message = receiver.recv() => match message {
                    Some(queued) => queued,
                    None => {
                        info!("Ingestion queue closed");
                        break;
                    }
                },
            };

            if !dispatch(&semaphore, &use_case, queued).await {
                break;
            }
        }

        // Already acknowledged analyses are ingested before exiting
        receiver.close();
        let mut drained = 0usize;
        while let Some(queued) = receiver.recv().await {
            if !dispatch(&semaphore, &use_case, queued).await {
                break;
            }
            drained += 1;
        }
        if drained > 0 {
            info!(drained, "Ingested analyses left in the queue at shutdown");
        }

        // In-flight ingestions hold permits until they finish
        match u32::try_from(concurrency) {
            Ok(permits) => {
                if let Err(err) = semaphore.acquire_many(permits).await {
                    error!(error = %err, "Failed to wait for in-flight ingestions");
                }
            }
            Err(err) => error!(error = %err, "Ingestion concurrency exceeds permit range"),
        }

        warn!("Ingestion worker exiting");
    })
}

/// Wait for a permit and ingest `queued` on its own task
async fn dispatch(
    semaphore: &Arc<Semaphore>,
    use_case: &Arc<IngestAnalysisUseCase>,
    queued: QueuedAnalysis,
) -> bool {
    let permit = match semaphore.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(err) => {
            error!(
                analysis_id = %queued.analysis.id,
                error = %err,
                "Failed to acquire concurrency permit for ingestion"
            );
            return false;
        }
    };

    let use_case = use_case.clone();
    tokio::spawn(async move {
        process_analysis(&use_case, queued).await;
        drop(permit);
    });
    true
}

async fn process_analysis(use_case: &IngestAnalysisUseCase, queued: QueuedAnalysis) {
    let analysis_id = queued.analysis.id;
    let waited_ms = (Utc::now() - queued.enqueued_at).num_milliseconds();
    debug!(analysis_id = %analysis_id, waited_ms, "Processing queued analysis");

    match use_case.execute(&queued.analysis).await {
        Ok(IngestionOutcome::Ingested(report)) if report.is_complete() => {
            info!(
                analysis_id = %analysis_id,
                records = report.records_written(),
                "Analysis rollups written"
            );
        }
        Ok(IngestionOutcome::Ingested(report)) => {
            let failed: Vec<String> = report
                .failed_facets()
                .iter()
                .map(ToString::to_string)
                .collect();
            warn!(
                analysis_id = %analysis_id,
                failed_facets = ?failed,
                records = report.records_written(),
                "Analysis rollups partially written"
            );
        }
        Ok(IngestionOutcome::Duplicate { .. }) => {
            debug!(analysis_id = %analysis_id, "Queued analysis was a duplicate");
        }
        Err(err) => {
            error!(analysis_id = %analysis_id, error = %err, "Background ingestion failed");
        }
    }
}
