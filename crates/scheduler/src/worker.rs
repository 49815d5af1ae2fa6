//! Worker threads that drain the shared job queue.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::SchedulerError;
use crate::job::JobHandle;
use crate::metrics::SchedulerMetrics;
use crate::ring_buffer::BoundedQueue;
use crate::types::TerminationPolicy;

/// The queue shared by every worker of a job system.
pub type JobQueue = BoundedQueue<JobHandle>;

/// State a worker shares with the job system that launched it.
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub queue: Arc<JobQueue>,
    /// Set once no more jobs will be pushed.
    pub closed: Arc<AtomicBool>,
    pub metrics: Arc<RwLock<SchedulerMetrics>>,
    pub termination: TerminationPolicy,
    pub idle_backoff: Duration,
}

/// One OS thread bound to the shared queue.
pub struct Worker {
    name: String,
    thread: JoinHandle<usize>,
}

impl Worker {
    pub(crate) fn spawn(index: usize, context: WorkerContext) -> io::Result<Self> {
        let name = format!("jobsys-worker-{index}");
        let thread = thread::Builder::new()
            .name(name.clone())
            .spawn(move || run_loop(&context))?;
        Ok(Self { name, thread })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the thread to exit. Returns how many jobs it executed.
    pub fn join(self) -> Result<usize, SchedulerError> {
        self.thread
            .join()
            .map_err(|_| SchedulerError::WorkerPanicked(self.name))
    }
}

fn run_loop(context: &WorkerContext) -> usize {
    let mut executed = 0;
    loop {
        // Read before polling: once the flag is set no further push can land,
        // so an empty pop after a set flag means the queue is empty for good.
        let closed = context.closed.load(Ordering::Acquire);
        match context.queue.pop() {
            Some(job) => {
                trace!(job = %job.name(), "dequeued job");
                let execution = job.execute();
                context
                    .metrics
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .record_execution(&execution);
                executed += 1;
            }
            None => match context.termination {
                TerminationPolicy::DrainAndExit => break,
                TerminationPolicy::BlockForMore if closed => break,
                TerminationPolicy::BlockForMore => idle(context.idle_backoff),
            },
        }
    }
    debug!(
        worker = thread::current().name().unwrap_or("unnamed"),
        executed,
        "worker exiting"
    );
    executed
}

fn idle(backoff: Duration) {
    if backoff.is_zero() {
        thread::yield_now();
    } else {
        thread::sleep(backoff);
    }
}
