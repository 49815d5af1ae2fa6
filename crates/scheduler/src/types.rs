use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;
use crate::ring_buffer::OverflowPolicy;

/// What a worker does when it finds the shared queue empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationPolicy {
    /// Exit as soon as the queue is empty. Suited to a batch that is fully
    /// queued before (or while) the workers start.
    #[default]
    DrainAndExit,
    /// Keep polling for new work until the system is closed by
    /// [`JobSystem::join_workers`](crate::system::JobSystem::join_workers),
    /// then drain what is left and exit.
    BlockForMore,
}

impl fmt::Display for TerminationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationPolicy::DrainAndExit => f.write_str("drain_and_exit"),
            TerminationPolicy::BlockForMore => f.write_str("block_for_more"),
        }
    }
}

impl FromStr for TerminationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "drain" | "drain_and_exit" => Ok(TerminationPolicy::DrainAndExit),
            "block" | "block_for_more" => Ok(TerminationPolicy::BlockForMore),
            other => Err(format!(
                "unknown termination policy {other:?} (expected drain or block)"
            )),
        }
    }
}

/// Lifecycle of a [`JobSystem`](crate::system::JobSystem).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemState {
    /// Nothing queued, no workers.
    Idle,
    /// Jobs are being queued; no workers yet.
    Populating,
    /// Workers have been launched.
    Running,
    /// `join_workers` returned; the system accepts no more work.
    Drained,
}

/// Job system configuration, typically parsed from the `[scheduler]` TOML table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSystemConfig {
    /// Number of worker threads. 0 = available parallelism.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    /// Maximum number of pending jobs in the shared queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// What `add_job` does when the queue is full.
    #[serde(default = "default_overflow_policy")]
    pub overflow_policy: OverflowPolicy,
    /// Worker behaviour on an empty queue.
    #[serde(default)]
    pub termination: TerminationPolicy,
    /// Sleep between empty polls under `block_for_more`. 0 = yield only.
    #[serde(default = "default_idle_backoff")]
    pub idle_backoff_micros: u64,
}

fn default_worker_threads() -> usize { 0 }
fn default_queue_capacity() -> usize { 300 }
fn default_overflow_policy() -> OverflowPolicy { OverflowPolicy::DiscardNew }
fn default_idle_backoff() -> u64 { 0 }

impl Default for JobSystemConfig {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
            queue_capacity: default_queue_capacity(),
            overflow_policy: default_overflow_policy(),
            termination: TerminationPolicy::default(),
            idle_backoff_micros: default_idle_backoff(),
        }
    }
}

impl JobSystemConfig {
    /// Resolve worker thread count (0 means use available parallelism).
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.worker_threads
        }
    }

    pub fn idle_backoff(&self) -> Duration {
        Duration::from_micros(self.idle_backoff_micros)
    }

    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.queue_capacity == 0 {
            return Err(SchedulerError::InvalidCapacity);
        }
        Ok(())
    }
}
