//! Schedulable units of work and the dependency edges between them.
//!
//! A [`Job`] is built as an owned value, wired to its predecessors with
//! [`Job::add_dependency`], and then frozen into a shared [`JobHandle`].
//! Once frozen the dependency list can no longer change, so every worker
//! sees the same set of edges.

mod signal;
mod work;

pub use signal::CompletionSignal;
pub use work::Work;

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::WorkError;

/// Shared, immutable handle to a published job.
pub type JobHandle = Arc<Job>;

/// Classification tag. The scheduler records it in metrics and logs but
/// never routes on it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    #[default]
    General,
    FileLoading,
    Decoding,
    ResourceCreation,
    /// Must run on one particular thread; such jobs belong in a
    /// [`LocalJobQueue`](crate::local::LocalJobQueue), not the shared queue.
    Confined,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::General => "general",
            JobKind::FileLoading => "file_loading",
            JobKind::Decoding => "decoding",
            JobKind::ResourceCreation => "resource_creation",
            JobKind::Confined => "confined",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monotonic job status: `NotStarted -> Started -> Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum JobStatus {
    NotStarted = 0,
    Started = 1,
    Done = 2,
}

impl JobStatus {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => JobStatus::NotStarted,
            1 => JobStatus::Started,
            _ => JobStatus::Done,
        }
    }
}

/// How a payload ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed(String),
    Panicked(String),
    /// `execute` was called on a job that had already started.
    Skipped,
}

/// Record of a single [`Job::execute`] call.
#[derive(Debug, Clone)]
pub struct Execution {
    pub job_id: Uuid,
    pub kind: JobKind,
    pub outcome: Outcome,
    /// Time spent blocked on dependencies.
    pub waited: Duration,
    /// Time spent inside the payload.
    pub duration: Duration,
}

pub struct Job {
    id: Uuid,
    name: String,
    kind: JobKind,
    dependencies: Vec<JobHandle>,
    work: Mutex<Option<Box<dyn Work>>>,
    status: AtomicU8,
    completion: CompletionSignal,
}

impl Job {
    pub fn new(name: impl Into<String>, kind: JobKind, work: impl Work + 'static) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            dependencies: Vec::new(),
            work: Mutex::new(Some(Box::new(work))),
            status: AtomicU8::new(JobStatus::NotStarted as u8),
            completion: CompletionSignal::new(),
        }
    }

    /// Job whose payload is an infallible closure.
    pub fn from_fn<F>(name: impl Into<String>, kind: JobKind, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::try_from_fn(name, kind, move || {
            f();
            Ok(())
        })
    }

    /// Job whose payload is a fallible closure.
    pub fn try_from_fn<F>(name: impl Into<String>, kind: JobKind, f: F) -> Self
    where
        F: FnOnce() -> Result<(), WorkError> + Send + 'static,
    {
        Self::new(name, kind, f)
    }

    /// Append a predecessor. Dependencies are waited on in insertion order.
    pub fn add_dependency(&mut self, dependency: &JobHandle) {
        self.dependencies.push(Arc::clone(dependency));
    }

    pub fn with_dependency(mut self, dependency: &JobHandle) -> Self {
        self.add_dependency(dependency);
        self
    }

    /// Freeze the job so it can be published to a queue.
    pub fn into_handle(self) -> JobHandle {
        Arc::new(self)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn dependencies(&self) -> &[JobHandle] {
        &self.dependencies
    }

    pub fn status(&self) -> JobStatus {
        JobStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub fn is_done(&self) -> bool {
        self.status() == JobStatus::Done
    }

    pub fn has_started(&self) -> bool {
        self.status() != JobStatus::NotStarted
    }

    /// True iff every dependency already reports Done. Never blocks.
    pub fn is_ready_to_start(&self) -> bool {
        self.dependencies.iter().all(|dependency| dependency.is_done())
    }

    /// Block until this job is Done. Returns immediately if it already is.
    pub fn wait_until_done(&self) {
        if self.is_done() {
            return;
        }
        self.completion.wait();
    }

    /// Block for at most `timeout`. Returns whether the job is Done.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_done() {
            return true;
        }
        self.completion.wait_timeout(timeout)
    }

    /// Wait for every dependency, run the payload, then publish Done.
    ///
    /// Payload errors and panics are caught here and reported through the
    /// returned [`Execution`]; the job is marked Done either way. A job whose
    /// dependency never runs blocks here forever.
    pub fn execute(&self) -> Execution {
        let claimed = self.status.compare_exchange(
            JobStatus::NotStarted as u8,
            JobStatus::Started as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        if claimed.is_err() {
            warn!(job = %self.name, status = ?self.status(), "job executed more than once, ignoring");
            return self.execution(Outcome::Skipped, Duration::ZERO, Duration::ZERO);
        }

        let wait_started = Instant::now();
        for dependency in &self.dependencies {
            if !dependency.is_done() {
                debug!(job = %self.name, dependency = %dependency.name, "waiting on dependency");
                dependency.wait_until_done();
            }
        }
        let waited = wait_started.elapsed();

        debug!(job = %self.name, kind = %self.kind, "job started");
        let work = self.work.lock().unwrap_or_else(PoisonError::into_inner).take();
        let started = Instant::now();
        let outcome = match work {
            Some(work) => match panic::catch_unwind(AssertUnwindSafe(move || work.run())) {
                Ok(Ok(())) => Outcome::Succeeded,
                Ok(Err(e)) => {
                    warn!(job = %self.name, kind = %self.kind, error = %e, "job payload failed");
                    Outcome::Failed(e.to_string())
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    warn!(job = %self.name, kind = %self.kind, panic = %message, "job payload panicked");
                    Outcome::Panicked(message)
                }
            },
            None => Outcome::Skipped,
        };
        let duration = started.elapsed();

        self.status.store(JobStatus::Done as u8, Ordering::Release);
        self.completion.fire();
        debug!(job = %self.name, elapsed_ms = duration.as_millis() as u64, "job done");

        self.execution(outcome, waited, duration)
    }

    fn execution(&self, outcome: Outcome, waited: Duration, duration: Duration) -> Execution {
        Execution {
            job_id: self.id,
            kind: self.kind,
            outcome,
            waited,
            duration,
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dependencies: Vec<&str> = self.dependencies.iter().map(|d| d.name()).collect();
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("status", &self.status())
            .field("dependencies", &dependencies)
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
