//! In-memory job queue and worker pool for asset processing.
//!
//! Uploads enqueue a [`Job`] per asset; a fixed pool of workers pulls jobs
//! off a bounded channel and hands them to a [`JobHandler`]. The handler is
//! held weakly so the queue never keeps application state alive on its own.

pub mod handler;
pub mod queue;

pub use handler::{empty_handler_weak, Job, JobHandler};
pub use queue::{WorkQueue, WorkQueueConfig};
