//! End-to-end scheduling scenarios against the public API.
//!
//! ```text
//!   [load a] ──> [digest a] ──┐
//!   [load b] ──> [digest b] ──┼──> [report] (main thread, LocalJobQueue)
//!   [load c] ──> [digest c] ──┘
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use jobsys_scheduler::tasks::{DigestSlot, DigestTask, FileSlot, LoadFileTask};
use jobsys_scheduler::{
    Job, JobHandle, JobKind, JobSystem, JobSystemConfig, LocalJobQueue, OverflowPolicy,
    SystemState, TerminationPolicy,
};

const TIMEOUT: Duration = Duration::from_secs(10);

fn system(workers: usize, capacity: usize) -> JobSystem {
    JobSystem::new(JobSystemConfig {
        worker_threads: workers,
        queue_capacity: capacity,
        overflow_policy: OverflowPolicy::DiscardNew,
        termination: TerminationPolicy::DrainAndExit,
        idle_backoff_micros: 0,
    })
    .unwrap()
}

#[test]
fn load_digest_report_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = Vec::new();
    for (name, body) in [("a.txt", "alpha"), ("b.txt", "beta"), ("c.txt", "gamma")] {
        let path = dir.path().join(name);
        std::fs::File::create(&path).unwrap().write_all(body.as_bytes()).unwrap();
        paths.push(path);
    }
    paths.push(dir.path().join("missing.txt"));

    let system = system(3, 64);
    let mut graph = Vec::new();
    let mut digests = Vec::new();
    for path in &paths {
        let file = FileSlot::new();
        let digest = DigestSlot::new();
        let load = LoadFileTask::new(path, file.clone()).into_job().into_handle();
        let hash = DigestTask::new(path.display().to_string(), file, digest.clone())
            .into_job()
            .with_dependency(&load)
            .into_handle();
        graph.push(hash);
        graph.push(load);
        digests.push(digest);
    }

    let report_lines = Arc::new(Mutex::new(Vec::new()));
    let mut report = {
        let digests = digests.clone();
        let lines = Arc::clone(&report_lines);
        Job::from_fn("report", JobKind::Confined, move || {
            for slot in &digests {
                let line = slot
                    .with_value(|d| d.sha256.clone())
                    .unwrap_or_else(|| "failed".to_string());
                lines.lock().unwrap().push(line);
            }
        })
    };
    for job in graph.iter().filter(|j| j.kind() == JobKind::Decoding) {
        report.add_dependency(job);
    }
    let mut local = LocalJobQueue::new();
    local.push(report.into_handle());

    // Digests were listed before their loads; the batch reorders them.
    assert_eq!(system.add_batch(graph.clone()).unwrap(), 8);
    system.launch_workers(3).unwrap();

    while !local.is_empty() {
        local.run_ready();
        std::thread::yield_now();
    }
    system.join_workers().unwrap();

    assert!(graph.iter().all(|j| j.is_done()));
    let lines = report_lines.lock().unwrap();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[3], "failed");
    assert!(lines[..3].iter().all(|l| l.len() == 64));
    assert!(digests[3].error().unwrap().contains("missing.txt"));

    let metrics = system.metrics();
    assert_eq!(metrics.total_executed(), 8);
    assert_eq!(metrics.jobs_failed[&JobKind::FileLoading], 1);
    assert_eq!(metrics.jobs_failed[&JobKind::Decoding], 1);
}

#[test]
fn wide_graph_respects_every_edge() {
    let system = system(4, 512);
    let finished = Arc::new(AtomicUsize::new(0));
    let violations = Arc::new(AtomicUsize::new(0));

    let mut jobs: Vec<JobHandle> = Vec::new();
    for i in 0..200usize {
        // Deterministic pseudo-random predecessors among earlier jobs.
        let deps: Vec<JobHandle> = (1..=3)
            .filter_map(|k| i.checked_sub(k * 7 + i % 5))
            .map(|d| Arc::clone(&jobs[d]))
            .collect();

        let watched = deps.clone();
        let finished = Arc::clone(&finished);
        let violations = Arc::clone(&violations);
        let mut job = Job::from_fn(format!("job-{i}"), JobKind::General, move || {
            if !watched.iter().all(|d| d.is_done()) {
                violations.fetch_add(1, Ordering::SeqCst);
            }
            finished.fetch_add(1, Ordering::SeqCst);
        });
        for dep in &deps {
            job.add_dependency(dep);
        }
        jobs.push(job.into_handle());
    }

    system.add_batch(jobs.iter().rev().cloned()).unwrap();
    system.launch_workers(4).unwrap();
    system.join_workers().unwrap();

    assert_eq!(finished.load(Ordering::SeqCst), 200);
    assert_eq!(violations.load(Ordering::SeqCst), 0);
    assert_eq!(system.state(), SystemState::Drained);
}

#[test]
fn jobs_added_while_running_complete_under_block_for_more() {
    let system = JobSystem::new(JobSystemConfig {
        worker_threads: 2,
        termination: TerminationPolicy::BlockForMore,
        idle_backoff_micros: 100,
        ..JobSystemConfig::default()
    })
    .unwrap();
    system.launch_workers(2).unwrap();

    let first = Job::from_fn("first", JobKind::General, || {}).into_handle();
    system.add_job(Arc::clone(&first)).unwrap();
    assert!(first.wait_timeout(TIMEOUT));

    let second = Job::from_fn("second", JobKind::General, || {})
        .with_dependency(&first)
        .into_handle();
    system.add_job(Arc::clone(&second)).unwrap();
    system.join_workers().unwrap();

    assert!(second.is_done());
}
