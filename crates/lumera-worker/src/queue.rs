//! Work queue: bounded in-memory channel plus a fixed-size worker pool.
//!
//! Backpressure: the channel holds at most `capacity` jobs and the pool runs
//! at most `max_workers` jobs concurrently. When both are saturated,
//! [`WorkQueue::enqueue`] waits until a slot frees.
//!
//! Shutdown: [`WorkQueue::shutdown`] signals the pool to stop; it does not
//! wait for in-flight jobs. Jobs still sitting in the channel are dropped.
//! For graceful shutdown, coordinate with your runtime and allow time for
//! running jobs to finish before process exit.

use anyhow::{anyhow, Result};
use chrono::Utc;
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, Semaphore};
use uuid::Uuid;

use crate::handler::{Job, JobHandler};

#[derive(Clone)]
pub struct WorkQueueConfig {
    /// Number of jobs the channel buffers before `enqueue` starts waiting.
    pub capacity: usize,
    pub max_workers: usize,
}

impl Default for WorkQueueConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            max_workers: 4,
        }
    }
}

#[derive(Clone)]
pub struct WorkQueue {
    job_tx: mpsc::Sender<Job>,
    shutdown_tx: mpsc::Sender<()>,
}

impl WorkQueue {
    /// Start the dispatcher and worker pool with a weak reference to the
    /// job handler. Jobs enqueued after the handler has been dropped are
    /// discarded with a warning rather than failing the queue.
    pub fn start(config: WorkQueueConfig, handler: Weak<dyn JobHandler>) -> Self {
        let (job_tx, job_rx) = mpsc::channel(config.capacity.max(1));
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        tokio::spawn(async move {
            Self::dispatch_loop(config, handler, job_rx, shutdown_rx).await;
        });

        Self {
            job_tx,
            shutdown_tx,
        }
    }

    /// Submit an asset for background processing.
    ///
    /// Waits when the queue is full; errors once the queue has shut down.
    #[tracing::instrument(skip(self))]
    pub async fn enqueue(&self, asset_id: Uuid) -> Result<()> {
        self.job_tx
            .send(Job::new(asset_id))
            .await
            .map_err(|_| anyhow!("Work queue has shut down, cannot accept job"))?;

        tracing::info!(asset_id = %asset_id, "Job submitted to queue");
        Ok(())
    }

    async fn dispatch_loop(
        config: WorkQueueConfig,
        handler: Weak<dyn JobHandler>,
        mut job_rx: mpsc::Receiver<Job>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!(
            capacity = config.capacity,
            max_workers = config.max_workers,
            "Work queue started"
        );

        let semaphore = Arc::new(Semaphore::new(config.max_workers.max(1)));

        loop {
            // Take a worker slot before pulling a job so that waiting jobs
            // stay in the channel and count against its capacity.
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Work queue shutting down");
                    break;
                }
                job = job_rx.recv() => {
                    let Some(job) = job else {
                        break;
                    };
                    let Some(handler) = handler.upgrade() else {
                        tracing::warn!(
                            asset_id = %job.asset_id,
                            "Job handler was dropped, discarding job"
                        );
                        continue;
                    };
                    tokio::spawn(async move {
                        let _permit = permit;
                        let asset_id = job.asset_id;
                        let waited_ms = (Utc::now() - job.submitted_at).num_milliseconds();
                        tracing::debug!(asset_id = %asset_id, queue_wait_ms = waited_ms, "Job started");
                        if let Err(e) = handler.run(job).await {
                            tracing::error!(error = %e, asset_id = %asset_id, "Job failed");
                        }
                    });
                }
            }
        }

        tracing::info!("Work queue stopped");
    }

    /// Signals the worker pool to stop pulling new jobs and exit the main loop.
    ///
    /// Returns immediately after sending the signal; it does **not** wait for
    /// in-flight jobs to complete. Already-spawned handlers continue running
    /// until they finish. Subsequent `enqueue` calls fail once the dispatcher
    /// has observed the signal.
    pub async fn shutdown(&self) {
        tracing::info!("Initiating work queue shutdown");
        let _ = self.shutdown_tx.send(()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::time::timeout;

    /// Reports every processed asset id back over a channel.
    struct CountingHandler {
        tx: mpsc::Sender<Uuid>,
    }

    #[async_trait]
    impl JobHandler for CountingHandler {
        async fn run(self: Arc<Self>, job: Job) -> Result<()> {
            self.tx
                .send(job.asset_id)
                .await
                .map_err(|_| anyhow!("receipt channel closed"))?;
            Ok(())
        }
    }

    /// Never finishes a job; used to saturate the pool.
    struct StuckHandler;

    #[async_trait]
    impl JobHandler for StuckHandler {
        async fn run(self: Arc<Self>, _job: Job) -> Result<()> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn jobs_are_dispatched_to_handler() {
        let (tx, mut rx) = mpsc::channel(8);
        let handler: Arc<dyn JobHandler> = Arc::new(CountingHandler { tx });
        let queue = WorkQueue::start(WorkQueueConfig::default(), Arc::downgrade(&handler));

        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            queue.enqueue(*id).await.unwrap();
        }

        let mut seen = Vec::new();
        for _ in 0..3 {
            let id = timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("job was not dispatched in time")
                .expect("handler channel closed");
            seen.push(id);
        }
        seen.sort();
        let mut expected = ids.clone();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn enqueue_fails_after_shutdown() {
        let (tx, _rx) = mpsc::channel(8);
        let handler: Arc<dyn JobHandler> = Arc::new(CountingHandler { tx });
        let queue = WorkQueue::start(WorkQueueConfig::default(), Arc::downgrade(&handler));

        queue.shutdown().await;
        // The dispatcher drops the receiver once it observes the signal.
        queue.job_tx.closed().await;

        assert!(queue.enqueue(Uuid::new_v4()).await.is_err());
    }

    #[tokio::test]
    async fn jobs_discarded_when_handler_dropped() {
        let (tx, mut rx) = mpsc::channel(8);
        let handler: Arc<dyn JobHandler> = Arc::new(CountingHandler { tx });
        let weak = Arc::downgrade(&handler);
        drop(handler);

        let queue = WorkQueue::start(WorkQueueConfig::default(), weak);
        queue.enqueue(Uuid::new_v4()).await.unwrap();

        // The handler (and its channel sender) are gone, so nothing arrives.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn enqueue_applies_backpressure_when_saturated() {
        let handler: Arc<dyn JobHandler> = Arc::new(StuckHandler);
        let config = WorkQueueConfig {
            capacity: 1,
            max_workers: 1,
        };
        let queue = WorkQueue::start(config, Arc::downgrade(&handler));

        // First job occupies the single worker, second fills the channel.
        queue.enqueue(Uuid::new_v4()).await.unwrap();
        queue.enqueue(Uuid::new_v4()).await.unwrap();

        let third = timeout(Duration::from_millis(100), queue.enqueue(Uuid::new_v4())).await;
        assert!(third.is_err(), "third enqueue should wait for a free slot");
    }
}
