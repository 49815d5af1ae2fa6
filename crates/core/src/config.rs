use std::env;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled value: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_opt<F>(lookup: &F, profile: &str, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = lookup(&prefixed) {
            return Some(v);
        }
    }
    lookup(key)
}

fn profiled_usize<F>(lookup: &F, profile: &str, key: &str) -> Result<Option<usize>, CoreError>
where
    F: Fn(&str) -> Option<String>,
{
    match profiled_opt(lookup, profile, key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| CoreError::Config {
            key: key.to_string(),
            value: raw,
        }),
    }
}

// ── Top-level config ──────────────────────────────────────────

/// Environment overrides for the job system.
///
/// Every field is optional: an unset key means "use whatever the config file
/// or the built-in default says".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    /// `JOBSYS_WORKERS`: worker thread count (0 = available parallelism).
    pub workers: Option<usize>,
    /// `JOBSYS_QUEUE_CAPACITY`: shared queue capacity.
    pub queue_capacity: Option<usize>,
    /// `JOBSYS_LOG`: tracing filter directive used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `JOBSYS_PROFILE`. When set (e.g. `CI`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self, CoreError> {
        let profile = env_opt("JOBSYS_PROFILE").unwrap_or_default().to_uppercase();
        Self::from_lookup(&profile, env_opt)
    }

    /// Build config for a named profile using an arbitrary key lookup.
    pub fn from_lookup<F>(profile: &str, lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Ok(Self {
            profile: p.to_string(),
            workers: profiled_usize(&lookup, p, "JOBSYS_WORKERS")?,
            queue_capacity: profiled_usize(&lookup, p, "JOBSYS_QUEUE_CAPACITY")?,
            log_filter: profiled_opt(&lookup, p, "JOBSYS_LOG"),
        })
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::debug!(
            profile = self.profile_label(),
            workers = ?self.workers,
            queue_capacity = ?self.queue_capacity,
            log_filter = ?self.log_filter,
            "environment config loaded"
        );
    }

    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "workers": self.workers,
            "queue_capacity": self.queue_capacity,
            "log_filter": self.log_filter,
        })
    }
}
