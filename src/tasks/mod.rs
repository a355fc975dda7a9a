//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry sweeper: deletes expired time buckets once per second
//! - Snapshot: writes the cache to disk at configured intervals

mod snapshot;
mod sweeper;

pub use snapshot::spawn_snapshot_task;
pub use sweeper::{spawn_expiry_sweeper, SWEEP_QUEUE_CAPACITY};
