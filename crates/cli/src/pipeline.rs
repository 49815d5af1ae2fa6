//! The `digest` job graph: load -> digest per file, then one confined report.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use jobsys_scheduler::tasks::{DigestSlot, DigestTask, FileSlot, LoadFileTask, Slot};
use jobsys_scheduler::{
    Job, JobHandle, JobKind, JobSystem, JobSystemConfig, LocalJobQueue, SchedulerError,
    SchedulerMetrics,
};
use serde::Serialize;
use tracing::{debug, info};

/// Outcome for one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    fn from_slot(path: &Path, slot: &DigestSlot) -> Self {
        match slot.cloned() {
            Some(digest) => Self {
                path: path.to_path_buf(),
                sha256: Some(digest.sha256),
                bytes: Some(digest.bytes),
                error: None,
            },
            None => Self {
                path: path.to_path_buf(),
                sha256: None,
                bytes: None,
                error: Some(slot.error().unwrap_or_else(|| "digest never ran".to_string())),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything the `digest` command reports.
#[derive(Debug, Serialize)]
pub struct DigestRun {
    pub files: Vec<FileReport>,
    pub workers: usize,
    pub elapsed_ms: u64,
    pub metrics: SchedulerMetrics,
}

impl DigestRun {
    pub fn failed(&self) -> usize {
        self.files.iter().filter(|f| !f.is_ok()).count()
    }
}

/// Build the job graph for `paths`, run it, and collect the results.
///
/// The report job is confined to the calling thread: it is polled through a
/// [`LocalJobQueue`] while the workers drain the shared queue.
pub fn run_digest(paths: &[PathBuf], mut config: JobSystemConfig) -> Result<DigestRun, SchedulerError> {
    let started = Instant::now();
    let job_count = paths.len() * 2;
    if config.queue_capacity < job_count {
        debug!(
            configured = config.queue_capacity,
            required = job_count,
            "raising queue capacity to fit the batch"
        );
        config.queue_capacity = job_count;
    }
    let system = JobSystem::new(config)?;

    let mut jobs: Vec<JobHandle> = Vec::with_capacity(job_count);
    let mut digest_jobs: Vec<JobHandle> = Vec::with_capacity(paths.len());
    let mut outputs: Vec<(PathBuf, DigestSlot)> = Vec::with_capacity(paths.len());
    for path in paths {
        let file = FileSlot::new();
        let digest = DigestSlot::new();
        let load = LoadFileTask::new(path, file.clone()).into_job().into_handle();
        let hash = DigestTask::new(path.display().to_string(), file, digest.clone())
            .into_job()
            .with_dependency(&load)
            .into_handle();
        jobs.push(load);
        jobs.push(hash.clone());
        digest_jobs.push(hash);
        outputs.push((path.clone(), digest));
    }

    let reports: Slot<Vec<FileReport>> = Slot::new();
    let mut report = {
        let reports = reports.clone();
        Job::from_fn("report", JobKind::Confined, move || {
            let files = outputs
                .iter()
                .map(|(path, slot)| FileReport::from_slot(path, slot))
                .collect();
            reports.fill(files);
        })
    };
    for job in &digest_jobs {
        report.add_dependency(job);
    }
    let mut local = LocalJobQueue::new();
    local.push(report.into_handle());

    system.add_batch(jobs)?;
    let workers = system.launch_configured_workers()?;

    while !local.is_empty() {
        if local.run_ready() == 0 {
            thread::sleep(Duration::from_millis(1));
        }
    }
    system.join_workers()?;

    let files = reports.take().unwrap_or_default();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    info!(files = files.len(), workers, elapsed_ms, "digest run complete");

    Ok(DigestRun {
        files,
        workers,
        elapsed_ms,
        metrics: system.metrics(),
    })
}
