//! Analysis worker: fire-and-forget execution off the triggering call.
//!
//! Submissions enqueue and return immediately; pipelines run on a bounded
//! pool of concurrent tasks (tens of simultaneous analyses, not one task
//! per document). Analyses of different documents are independent and
//! unordered; within one document the pipeline stages run strictly
//! sequentially. There is no cancellation once a pipeline starts —
//! shutdown drains in-flight work.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info};
use uuid::Uuid;

use zipfit_core::{defaults, Error, Profile, Result};

use crate::pipeline::AnalysisPipeline;

/// Configuration for the analysis worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum number of concurrently running analyses.
    pub max_concurrent: usize,
    /// Capacity of the submission queue.
    pub queue_capacity: usize,
    /// Whether to enable analysis processing.
    pub enabled: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: defaults::ANALYSIS_MAX_CONCURRENT,
            queue_capacity: defaults::ANALYSIS_QUEUE_CAPACITY,
            enabled: true,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `ANALYSIS_WORKER_ENABLED` | `true` | Enable/disable processing |
    /// | `ANALYSIS_MAX_CONCURRENT` | `16` | Max concurrent analyses |
    /// | `ANALYSIS_QUEUE_CAPACITY` | `256` | Submission queue capacity |
    pub fn from_env() -> Self {
        let enabled = std::env::var("ANALYSIS_WORKER_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let max_concurrent = std::env::var("ANALYSIS_MAX_CONCURRENT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::ANALYSIS_MAX_CONCURRENT)
            .max(1);

        let queue_capacity = std::env::var("ANALYSIS_QUEUE_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::ANALYSIS_QUEUE_CAPACITY)
            .max(1);

        Self {
            max_concurrent,
            queue_capacity,
            enabled,
        }
    }

    /// Set maximum concurrent analyses.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }

    /// Enable or disable processing.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// A fire-and-forget analysis request.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub document_id: Uuid,
    /// Profile snapshot of the uploader, looked up once at submission.
    pub profile: Option<Profile>,
}

/// Event emitted by the analysis worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// An analysis started running.
    AnalysisStarted { document_id: Uuid },
    /// An analysis reached a terminal document state (COMPLETED or FAILED;
    /// poll the document for which).
    AnalysisFinished { document_id: Uuid },
    /// Worker started.
    WorkerStarted,
    /// Worker stopped.
    WorkerStopped,
}

/// Cloneable submission side of the worker queue.
#[derive(Clone)]
pub struct AnalysisSubmitter {
    tx: mpsc::Sender<AnalysisRequest>,
}

impl AnalysisSubmitter {
    /// Enqueue an analysis and return immediately.
    ///
    /// The caller gets no completion channel; terminal state is observed by
    /// polling the document.
    pub fn submit(&self, document_id: Uuid, profile: Option<Profile>) -> Result<()> {
        self.tx
            .try_send(AnalysisRequest {
                document_id,
                profile,
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    Error::Job("Analysis queue is full".to_string())
                }
                mpsc::error::TrySendError::Closed(_) => {
                    Error::Job("Analysis worker is not running".to_string())
                }
            })
    }
}

/// Handle for controlling a running worker.
pub struct WorkerHandle {
    submitter: AnalysisSubmitter,
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<WorkerEvent>,
}

impl WorkerHandle {
    /// Submission side of the queue (cloneable).
    pub fn submitter(&self) -> AnalysisSubmitter {
        self.submitter.clone()
    }

    /// Enqueue an analysis and return immediately.
    pub fn submit(&self, document_id: Uuid, profile: Option<Profile>) -> Result<()> {
        self.submitter.submit(document_id, profile)
    }

    /// Signal the worker to shut down after draining in-flight analyses.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))?;
        Ok(())
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_rx.resubscribe()
    }
}

/// Analysis worker running pipelines off a submission queue.
pub struct AnalysisWorker {
    pipeline: Arc<AnalysisPipeline>,
    config: WorkerConfig,
    event_tx: broadcast::Sender<WorkerEvent>,
}

impl AnalysisWorker {
    /// Create a new worker around a pipeline.
    pub fn new(pipeline: AnalysisPipeline, config: WorkerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(defaults::EVENT_BUS_CAPACITY);
        Self {
            pipeline: Arc::new(pipeline),
            config,
            event_tx,
        }
    }

    /// Start the worker and return a handle for control.
    pub fn start(self) -> WorkerHandle {
        let (submit_tx, submit_rx) = mpsc::channel(self.config.queue_capacity);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();

        tokio::spawn(async move {
            self.run(submit_rx, shutdown_rx).await;
        });

        WorkerHandle {
            submitter: AnalysisSubmitter { tx: submit_tx },
            shutdown_tx,
            event_rx,
        }
    }

    /// Worker loop: spawn a task per submission, concurrency bounded by a
    /// semaphore, drain on shutdown.
    async fn run(
        self,
        mut submit_rx: mpsc::Receiver<AnalysisRequest>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        if !self.config.enabled {
            info!("Analysis worker is disabled, not starting");
            return;
        }

        info!(
            max_concurrent = self.config.max_concurrent,
            queue_capacity = self.config.queue_capacity,
            "Analysis worker started"
        );
        let _ = self.event_tx.send(WorkerEvent::WorkerStarted);

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent));
        let mut tasks: JoinSet<()> = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Analysis worker received shutdown signal");
                    break;
                }
                request = submit_rx.recv() => {
                    match request {
                        Some(request) => self.spawn_analysis(request, &semaphore, &mut tasks),
                        None => break,
                    }
                }
                Some(result) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = result {
                        error!(error = ?e, "Analysis task panicked");
                    }
                }
            }
        }

        // Drain in-flight analyses; started pipelines are never cancelled.
        debug!(in_flight = tasks.len(), "Draining in-flight analyses");
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                error!(error = ?e, "Analysis task panicked");
            }
        }

        let _ = self.event_tx.send(WorkerEvent::WorkerStopped);
        info!("Analysis worker stopped");
    }

    fn spawn_analysis(
        &self,
        request: AnalysisRequest,
        semaphore: &Arc<Semaphore>,
        tasks: &mut JoinSet<()>,
    ) {
        let pipeline = self.pipeline.clone();
        let event_tx = self.event_tx.clone();
        let semaphore = semaphore.clone();

        tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };
            let document_id = request.document_id;

            let _ = event_tx.send(WorkerEvent::AnalysisStarted { document_id });
            pipeline.analyze(document_id, request.profile).await;
            let _ = event_tx.send(WorkerEvent::AnalysisFinished { document_id });
        });
    }
}
