//! Job handler trait
//!
//! The service layer implements this trait for its processing pipeline. The
//! worker calls `run` for each claimed job; the implementation loads the
//! asset and produces whatever derived artifacts it needs.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// A unit of background work: process one asset.
#[derive(Debug, Clone)]
pub struct Job {
    pub asset_id: Uuid,
    pub submitted_at: DateTime<Utc>,
}

impl Job {
    pub fn new(asset_id: Uuid) -> Self {
        Self {
            asset_id,
            submitted_at: Utc::now(),
        }
    }
}

/// Executes jobs pulled from the queue.
///
/// Implemented by the processing pipeline. The worker holds a weak
/// reference and calls `run` when dispatching a claimed job.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Process one job to completion. Errors are logged by the worker; the
    /// handler is responsible for recording job outcome on the asset itself.
    async fn run(self: Arc<Self>, job: Job) -> Result<()>;
}

/// Placeholder handler used when no real handler exists yet (e.g. during init).
/// Running a job always errors.
struct NoopHandler;

#[async_trait]
impl JobHandler for NoopHandler {
    async fn run(self: Arc<Self>, _job: Job) -> Result<()> {
        Err(anyhow!("NoopHandler: no job handler available"))
    }
}

/// Returns a weak reference to a no-op handler. Use as placeholder when
/// building a WorkQueue before the real pipeline exists.
pub fn empty_handler_weak() -> Weak<dyn JobHandler> {
    let n: Arc<dyn JobHandler> = Arc::new(NoopHandler);
    Arc::downgrade(&n)
}
