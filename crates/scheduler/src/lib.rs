pub mod error;
pub mod job;
pub mod local;
pub mod metrics;
pub mod ring_buffer;
pub mod system;
pub mod tasks;
pub mod types;
pub mod worker;

pub use error::{SchedulerError, WorkError};
pub use job::{Execution, Job, JobHandle, JobKind, JobStatus, Outcome, Work};
pub use local::LocalJobQueue;
pub use metrics::SchedulerMetrics;
pub use ring_buffer::{BoundedQueue, OverflowPolicy, PushOutcome};
pub use system::{JobSystem, dependency_order};
pub use types::{JobSystemConfig, SystemState, TerminationPolicy};
pub use worker::{JobQueue, Worker};
