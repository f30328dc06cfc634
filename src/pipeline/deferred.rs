//! Detached care-tip composition.
//!
//! The submitting request returns as soon as the job is queued; the result
//! lands in the cache and is read later through `poll`. Jobs flow through a
//! bounded queue to a single dispatcher task, which runs each pipeline on the
//! blocking pool with at most `workers` in flight.

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinHandle, JoinSet};

use super::orchestrator::{CareTipService, PollStatus};
use crate::care_tip_cache::{CacheError, CareTipKey};
use crate::config::PipelineConfig;

#[derive(Error, Debug)]
pub enum DeferredError {
    #[error("Deferred queue is full")]
    QueueFull,

    #[error("Deferred worker is shutting down")]
    ShuttingDown,

    #[error(transparent)]
    Cache(#[from] CacheError),
}

struct DeferredJob {
    key: CareTipKey,
    severity: i64,
    symptom: String,
}

/// Handle to the deferred worker.
pub struct DeferredCareTips {
    service: Arc<CareTipService>,
    queue: Mutex<Option<mpsc::Sender<DeferredJob>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl DeferredCareTips {
    /// Start the dispatcher. Must be called from within a Tokio runtime.
    pub fn start(service: Arc<CareTipService>, queue_capacity: usize, workers: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let workers = workers.max(1);
        let dispatcher = tokio::spawn(dispatch(Arc::clone(&service), rx, workers));

        tracing::info!(queue_capacity, workers, "Deferred care tip worker started");

        Self {
            service,
            queue: Mutex::new(Some(tx)),
            dispatcher: Mutex::new(Some(dispatcher)),
        }
    }

    pub fn from_config(service: Arc<CareTipService>, config: &PipelineConfig) -> Self {
        Self::start(service, config.deferred_queue_capacity, config.deferred_workers)
    }

    /// Queue a composition for `key`. Never waits: a saturated queue is
    /// reported as `QueueFull`.
    pub fn submit(&self, key: CareTipKey, severity: i64, symptom: &str) -> Result<(), DeferredError> {
        let sender = self
            .queue
            .lock()
            .map_err(|_| DeferredError::ShuttingDown)?
            .clone()
            .ok_or(DeferredError::ShuttingDown)?;

        let job = DeferredJob {
            key,
            severity,
            symptom: symptom.to_string(),
        };
        sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(job) => {
                tracing::warn!(key = %job.key, "Deferred queue full, rejecting job");
                DeferredError::QueueFull
            }
            mpsc::error::TrySendError::Closed(_) => DeferredError::ShuttingDown,
        })
    }

    pub fn poll(&self, key: &CareTipKey) -> Result<PollStatus, DeferredError> {
        Ok(self.service.poll(key)?)
    }

    /// Stop accepting jobs and wait until every queued job has finished.
    pub async fn shutdown(&self) {
        let sender = self.queue.lock().ok().and_then(|mut q| q.take());
        drop(sender);

        let dispatcher = self.dispatcher.lock().ok().and_then(|mut d| d.take());
        if let Some(handle) = dispatcher {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Deferred dispatcher terminated abnormally");
            }
        }
        tracing::info!("Deferred care tip worker stopped");
    }
}

async fn dispatch(service: Arc<CareTipService>, mut rx: mpsc::Receiver<DeferredJob>, workers: usize) {
    let permits = Arc::new(Semaphore::new(workers));
    let mut running = JoinSet::new();

    while let Some(job) = rx.recv().await {
        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            break;
        };
        let service = Arc::clone(&service);
        running.spawn_blocking(move || {
            let _permit = permit;
            run_job(&service, job);
        });

        while let Some(finished) = running.try_join_next() {
            log_join(finished);
        }
    }

    while let Some(finished) = running.join_next().await {
        log_join(finished);
    }
}

fn run_job(service: &CareTipService, job: DeferredJob) {
    if let Err(e) = service.run_deferred(&job.key, job.severity, &job.symptom) {
        tracing::error!(key = %job.key, error = %e, "Failed to store deferred care tip");
    }
}

fn log_join(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "Deferred care tip job panicked");
    }
}
