use anyhow::{Context, Result};
use jobsys_core::Config;
use jobsys_scheduler::{JobSystemConfig, TerminationPolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// CLI configuration loaded from TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Tracing filter used when neither `RUST_LOG` nor `JOBSYS_LOG` is set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Job system settings (`[scheduler]` table)
    #[serde(default)]
    pub scheduler: JobSystemConfig,
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            scheduler: JobSystemConfig::default(),
        }
    }
}

impl CliConfig {
    /// Return the default config directory path: ~/.config/jobsys/
    pub fn default_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("could not determine user config directory")?
            .join("jobsys");
        Ok(config_dir)
    }

    /// Return the default config file path.
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("config.toml"))
    }

    /// Load config from the given path, or the default path.
    /// Returns default config if the file does not exist.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => match Self::default_config_path() {
                Ok(p) => p,
                Err(e) => {
                    debug!(error = %e, "No config directory, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if config_path.exists() {
            debug!(?config_path, "Loading config");
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read config: {}", config_path.display()))?;
            let config: Self = toml::from_str(&content)
                .with_context(|| format!("failed to parse config: {}", config_path.display()))?;
            Ok(config)
        } else {
            debug!(?config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Resolve the scheduler config.
    /// Priority: CLI flag > environment > config file > built-in default.
    pub fn resolve_scheduler(
        &self,
        env: &Config,
        workers: Option<usize>,
        termination: Option<TerminationPolicy>,
    ) -> JobSystemConfig {
        let mut scheduler = self.scheduler.clone();
        if let Some(n) = workers.or(env.workers) {
            scheduler.worker_threads = n;
        }
        if let Some(capacity) = env.queue_capacity {
            scheduler.queue_capacity = capacity;
        }
        if let Some(policy) = termination {
            scheduler.termination = policy;
        }
        scheduler
    }

    /// Resolve the fallback log filter.
    /// Priority: environment > config file.
    pub fn resolve_log_filter(&self, env: &Config) -> String {
        env.log_filter.clone().unwrap_or_else(|| self.log_filter.clone())
    }
}
