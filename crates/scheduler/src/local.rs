//! Caller-owned queue for jobs confined to one thread.

use std::collections::VecDeque;

use tracing::trace;

use crate::job::JobHandle;

/// FIFO of jobs that must run on the thread that owns the queue, such as a
/// render or UI thread. Nothing here is shared with the workers; the owner
/// drains it itself, typically once per frame.
#[derive(Debug, Default)]
pub struct LocalJobQueue {
    jobs: VecDeque<JobHandle>,
}

impl LocalJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, job: JobHandle) {
        self.jobs.push_back(job);
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Run jobs from the front while the front job is ready to start.
    ///
    /// Never blocks on a dependency: stops at the first job whose
    /// predecessors are not all Done and leaves it queued. Returns how many
    /// jobs ran.
    pub fn run_ready(&mut self) -> usize {
        let mut ran = 0;
        while let Some(front) = self.jobs.front() {
            if !front.is_ready_to_start() {
                trace!(job = %front.name(), "confined job not ready, yielding");
                break;
            }
            if let Some(job) = self.jobs.pop_front() {
                job.execute();
                ran += 1;
            }
        }
        ran
    }

    /// Run every queued job in order, blocking on dependencies as needed.
    pub fn run_all(&mut self) -> usize {
        let mut ran = 0;
        while let Some(job) = self.jobs.pop_front() {
            job.execute();
            ran += 1;
        }
        ran
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::job::{Job, JobKind};

    fn confined(counter: &Arc<AtomicUsize>) -> Job {
        let counter = Arc::clone(counter);
        Job::from_fn("confined", JobKind::Confined, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn run_ready_stops_at_first_unready_job() {
        let counter = Arc::new(AtomicUsize::new(0));
        let gate = Job::from_fn("gate", JobKind::General, || {}).into_handle();

        let mut queue = LocalJobQueue::new();
        queue.push(confined(&counter).into_handle());
        queue.push(confined(&counter).with_dependency(&gate).into_handle());
        queue.push(confined(&counter).into_handle());

        assert_eq!(queue.run_ready(), 1);
        assert_eq!(queue.len(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        gate.execute();
        assert_eq!(queue.run_ready(), 2);
        assert!(queue.is_empty());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn run_all_blocks_on_dependencies() {
        let counter = Arc::new(AtomicUsize::new(0));
        let slow = Job::from_fn("slow", JobKind::General, || {
            thread::sleep(Duration::from_millis(20));
        })
        .into_handle();

        let mut queue = LocalJobQueue::new();
        queue.push(confined(&counter).with_dependency(&slow).into_handle());

        let runner = {
            let slow = Arc::clone(&slow);
            thread::spawn(move || slow.execute())
        };
        assert_eq!(queue.run_all(), 1);
        runner.join().unwrap();

        assert!(slow.is_done());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_queue_runs_nothing() {
        let mut queue = LocalJobQueue::new();
        assert_eq!(queue.run_ready(), 0);
        assert_eq!(queue.run_all(), 0);
    }
}
