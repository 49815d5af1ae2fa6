use jobsys_core::CoreError;

use crate::job::JobHandle;

/// Errors surfaced by the job system itself. Payload failures never show up
/// here; see [`WorkError`].
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Job queue is full, rejected job {}", .job.name())]
    QueueFull { job: JobHandle },
    #[error("Batch stopped after {queued} jobs; {} jobs were not queued", .remaining.len())]
    BatchIncomplete {
        queued: usize,
        /// The job that failed to queue followed by the rest of the batch,
        /// in dependency order, ready to resubmit.
        remaining: Vec<JobHandle>,
    },
    #[error("Job system is closed; build a new one to schedule more work")]
    Closed,
    #[error("At least one worker is required")]
    NoWorkers,
    #[error("Queue capacity must be greater than zero")]
    InvalidCapacity,
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Worker panicked: {0}")]
    WorkerPanicked(String),
}

/// Error type returned by job payloads.
///
/// The scheduler logs and counts these, then marks the job Done anyway.
#[derive(Debug, thiserror::Error)]
pub enum WorkError {
    #[error("Work failed: {0}")]
    Failed(String),
    #[error("Missing input: {0}")]
    MissingInput(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Core(#[from] CoreError),
}
