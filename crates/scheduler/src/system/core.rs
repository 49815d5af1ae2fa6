use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::{debug, info};

use crate::error::SchedulerError;
use crate::metrics::SchedulerMetrics;
use crate::types::{JobSystemConfig, SystemState};
use crate::worker::{JobQueue, Worker, WorkerContext};

/// Dependency-aware job system: one bounded queue shared by a pool of
/// worker threads.
///
/// All methods take `&self`, so a system wrapped in an `Arc` can be fed
/// from several producer threads while its workers run.
pub struct JobSystem {
    pub(super) config: JobSystemConfig,
    /// Pending jobs, shared with every worker.
    pub(super) queue: Arc<JobQueue>,
    /// Launched workers not yet joined.
    pub(super) workers: Mutex<Vec<Worker>>,
    /// Lifecycle state. Also serialises pushes against closing.
    pub(super) state: Mutex<SystemState>,
    /// Set by `join_workers` (or drop); no job is pushed afterwards.
    pub(super) closed: Arc<AtomicBool>,
    /// Held for the whole of `join_workers` so concurrent callers return
    /// only once every worker has been joined.
    pub(super) join_lock: Mutex<()>,
    pub(super) metrics: Arc<RwLock<SchedulerMetrics>>,
}

impl JobSystem {
    /// Create a job system with the given config.
    pub fn new(config: JobSystemConfig) -> Result<Self, SchedulerError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: JobSystemConfig) -> Self {
        let queue = JobQueue::new(config.queue_capacity, config.overflow_policy);
        debug!(
            capacity = config.queue_capacity,
            overflow = ?config.overflow_policy,
            termination = %config.termination,
            "job system created"
        );
        Self {
            config,
            queue: Arc::new(queue),
            workers: Mutex::new(Vec::new()),
            state: Mutex::new(SystemState::Idle),
            closed: Arc::new(AtomicBool::new(false)),
            join_lock: Mutex::new(()),
            metrics: Arc::new(RwLock::new(SchedulerMetrics::default())),
        }
    }

    pub fn config(&self) -> &JobSystemConfig {
        &self.config
    }

    pub fn state(&self) -> SystemState {
        *self.lock_state()
    }

    /// Whether the system has stopped accepting work.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of jobs waiting in the shared queue.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of launched workers not yet joined.
    pub fn worker_count(&self) -> usize {
        self.lock_workers().len()
    }

    /// Get a snapshot of the current metrics.
    pub fn metrics(&self) -> SchedulerMetrics {
        self.metrics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(super) fn update_metrics(&self, update: impl FnOnce(&mut SchedulerMetrics)) {
        let mut metrics = self.metrics.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut metrics);
    }

    pub(super) fn worker_context(&self) -> WorkerContext {
        WorkerContext {
            queue: Arc::clone(&self.queue),
            closed: Arc::clone(&self.closed),
            metrics: Arc::clone(&self.metrics),
            termination: self.config.termination,
            idle_backoff: self.config.idle_backoff(),
        }
    }

    pub(super) fn lock_state(&self) -> MutexGuard<'_, SystemState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn lock_workers(&self) -> MutexGuard<'_, Vec<Worker>> {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for JobSystem {
    fn default() -> Self {
        Self::from_valid_config(JobSystemConfig::default())
    }
}

impl Drop for JobSystem {
    /// Close without joining. Workers exit once the queue is empty; a worker
    /// blocked on a dependency that never completes stays detached.
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
        let running = self.lock_workers().len();
        if running > 0 {
            info!(workers = running, "job system dropped without join, detaching workers");
        }
    }
}
