use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::job::{Execution, JobKind, Outcome};

/// Job system counters, written by workers and read by the producer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchedulerMetrics {
    /// Payloads run to completion (successfully or not), by kind.
    pub jobs_executed: HashMap<JobKind, u64>,
    /// Payloads that returned an error, by kind.
    pub jobs_failed: HashMap<JobKind, u64>,
    /// Payloads that panicked.
    pub jobs_panicked: u64,
    /// `execute` calls ignored because the job had already started.
    pub jobs_skipped: u64,
    /// Jobs pushed out of a full queue under `replace_oldest`.
    pub jobs_evicted: u64,
    /// Jobs refused by a full queue under `discard_new`.
    pub jobs_rejected: u64,
    /// Average payload duration by kind.
    pub avg_job_duration: HashMap<JobKind, Duration>,
    /// Longest time any job spent blocked on its dependencies.
    pub max_dependency_wait: Duration,
    /// Worker threads launched over the system's lifetime.
    pub workers_launched: usize,
    /// When the most recent job finished.
    pub last_completed: Option<DateTime<Utc>>,
}

impl SchedulerMetrics {
    /// Record one `Job::execute` call.
    pub fn record_execution(&mut self, execution: &Execution) {
        let kind = execution.kind;
        match &execution.outcome {
            Outcome::Skipped => {
                self.jobs_skipped += 1;
                return;
            }
            Outcome::Failed(_) => *self.jobs_failed.entry(kind).or_default() += 1,
            Outcome::Panicked(_) => self.jobs_panicked += 1,
            Outcome::Succeeded => {}
        }

        *self.jobs_executed.entry(kind).or_default() += 1;
        self.last_completed = Some(Utc::now());
        self.max_dependency_wait = self.max_dependency_wait.max(execution.waited);

        // Incremental mean: new_avg = prev_avg + (duration - prev_avg) / count
        let count = self.jobs_executed[&kind];
        let prev_avg = self.avg_job_duration.get(&kind).copied().unwrap_or_default();
        let new_avg = if count == 1 {
            execution.duration
        } else {
            let prev_nanos = prev_avg.as_nanos() as f64;
            let cur_nanos = execution.duration.as_nanos() as f64;
            let avg_nanos = prev_nanos + (cur_nanos - prev_nanos) / count as f64;
            Duration::from_nanos(avg_nanos as u64)
        };
        self.avg_job_duration.insert(kind, new_avg);
    }

    /// Total payloads run across all kinds.
    pub fn total_executed(&self) -> u64 {
        self.jobs_executed.values().sum()
    }

    /// Total payloads that failed or panicked.
    pub fn total_failed(&self) -> u64 {
        self.jobs_failed.values().sum::<u64>() + self.jobs_panicked
    }
}
