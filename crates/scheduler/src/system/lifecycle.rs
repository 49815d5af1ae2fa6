use std::sync::atomic::Ordering;
use std::sync::{Arc, PoisonError};

use tracing::{debug, error, info, trace, warn};

use crate::error::SchedulerError;
use crate::job::{JobHandle, JobKind};
use crate::ring_buffer::PushOutcome;
use crate::types::SystemState;
use crate::worker::Worker;

use super::ordering::dependency_order;
use super::JobSystem;

impl JobSystem {
    /// Push a job onto the shared queue.
    ///
    /// Every job meant to run on a worker thread goes through here, at most
    /// once. Under `discard_new` a full queue hands the job back inside
    /// [`SchedulerError::QueueFull`]; under `replace_oldest` the oldest
    /// pending job is dropped instead and will never run.
    pub fn add_job(&self, job: JobHandle) -> Result<(), SchedulerError> {
        let mut state = self.lock_state();
        if self.closed.load(Ordering::Acquire) {
            return Err(SchedulerError::Closed);
        }
        if *state == SystemState::Idle {
            *state = SystemState::Populating;
        }
        if job.kind() == JobKind::Confined {
            warn!(job = %job.name(), "confined job submitted to the shared queue, it will run on a worker");
        }

        match self.queue.push(job) {
            PushOutcome::Stored => {
                trace!(pending = self.queue.len(), "job queued");
                Ok(())
            }
            PushOutcome::Evicted(evicted) => {
                warn!(job = %evicted.name(), "queue full, evicted oldest pending job");
                self.update_metrics(|m| m.jobs_evicted += 1);
                Ok(())
            }
            PushOutcome::Rejected(job) => {
                warn!(job = %job.name(), capacity = self.queue.capacity(), "queue full, job rejected");
                self.update_metrics(|m| m.jobs_rejected += 1);
                Err(SchedulerError::QueueFull { job })
            }
        }
    }

    /// Push a batch of jobs, each one after every in-batch job it depends on.
    ///
    /// With dependencies queued ahead of their dependents, a worker that pops
    /// a job never waits on a predecessor still sitting behind it in the
    /// queue. Duplicate handles are pushed once. Returns how many jobs were
    /// queued.
    ///
    /// If a push fails partway through, the queued prefix stays queued (it is
    /// closed under dependencies) and [`SchedulerError::BatchIncomplete`]
    /// carries the jobs that still need submitting.
    pub fn add_batch<I>(&self, jobs: I) -> Result<usize, SchedulerError>
    where
        I: IntoIterator<Item = JobHandle>,
    {
        let ordered = dependency_order(jobs);
        for (queued, job) in ordered.iter().enumerate() {
            match self.add_job(Arc::clone(job)) {
                Ok(()) => {}
                Err(SchedulerError::Closed) if queued == 0 => return Err(SchedulerError::Closed),
                Err(e) => {
                    let remaining = ordered[queued..].to_vec();
                    warn!(error = %e, queued, remaining = remaining.len(), "batch stopped early");
                    return Err(SchedulerError::BatchIncomplete { queued, remaining });
                }
            }
        }
        let queued = ordered.len();
        debug!(count = queued, "batch queued");
        Ok(queued)
    }

    /// Spawn `count` worker threads against the shared queue.
    ///
    /// Safe to call before, after, or while jobs are being added. Under
    /// `drain_and_exit` a worker that finds the queue empty exits, so jobs
    /// added after that point may be left for later workers.
    pub fn launch_workers(&self, count: usize) -> Result<(), SchedulerError> {
        if count == 0 {
            return Err(SchedulerError::NoWorkers);
        }
        let mut state = self.lock_state();
        if self.closed.load(Ordering::Acquire) {
            return Err(SchedulerError::Closed);
        }

        let mut workers = self.lock_workers();
        let context = self.worker_context();
        let first = workers.len();
        for index in first..first + count {
            match Worker::spawn(index, context.clone()) {
                Ok(worker) => {
                    workers.push(worker);
                    self.update_metrics(|m| m.workers_launched += 1);
                }
                Err(e) => {
                    error!(error = %e, index, "failed to spawn worker");
                    if !workers.is_empty() {
                        *state = SystemState::Running;
                    }
                    return Err(SchedulerError::Spawn(e));
                }
            }
        }
        *state = SystemState::Running;

        info!(
            workers = count,
            pending = self.queue.len(),
            termination = %self.config.termination,
            "launched workers"
        );
        Ok(())
    }

    /// Launch the configured number of workers (0 = available parallelism).
    pub fn launch_configured_workers(&self) -> Result<usize, SchedulerError> {
        let count = self.config.resolved_worker_threads();
        self.launch_workers(count)?;
        Ok(count)
    }

    /// Close the system and block until every worker thread has returned.
    ///
    /// Absent a dependency deadlock, every job pushed before this call is
    /// Done afterwards, provided at least one worker was launched. Concurrent
    /// callers are serialised: each returns after the workers are joined.
    pub fn join_workers(&self) -> Result<(), SchedulerError> {
        let _joining = self.join_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let workers = {
            let _state = self.lock_state();
            self.closed.store(true, Ordering::Release);
            std::mem::take(&mut *self.lock_workers())
        };

        let joined = workers.len();
        let mut executed = 0;
        let mut first_panic = None;
        for worker in workers {
            match worker.join() {
                Ok(count) => executed += count,
                Err(e) => {
                    error!(error = %e, "worker thread panicked");
                    if first_panic.is_none() {
                        first_panic = Some(e);
                    }
                }
            }
        }

        *self.lock_state() = SystemState::Drained;
        let pending = self.queue.len();
        if pending > 0 {
            warn!(pending, "job system drained with jobs still queued");
        }
        info!(workers = joined, executed, "workers joined");

        match first_panic {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
