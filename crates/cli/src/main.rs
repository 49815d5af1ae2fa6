mod cli;
mod config;
mod pipeline;
mod terminal;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, info};

use jobsys_core::{load_dotenv, Config};

use crate::cli::{CliArgs, Command, DigestArgs};
use crate::config::CliConfig;

fn main() -> Result<()> {
    load_dotenv();
    let args = CliArgs::parse();

    let env = Config::from_env().context("invalid environment configuration")?;
    let config = CliConfig::load(args.config.as_deref())
        .context("failed to load configuration")?;

    // Initialize tracing; logs go to stderr so stdout stays machine-readable
    let fallback_filter = config.resolve_log_filter(&env);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&fallback_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    env.log_summary();

    match args.command {
        Command::Digest(digest) => run_digest(&config, &env, digest),
        Command::Config => {
            let effective = CliConfig {
                log_filter: fallback_filter,
                scheduler: config.resolve_scheduler(&env, None, None),
            };
            let toml_str = toml::to_string_pretty(&effective)
                .context("failed to serialize configuration")?;
            print!("{toml_str}");
            Ok(())
        }
    }
}

fn run_digest(config: &CliConfig, env: &Config, args: DigestArgs) -> Result<()> {
    let scheduler = config.resolve_scheduler(env, args.workers, args.termination);
    debug!(?scheduler, "resolved scheduler config");
    info!(
        files = args.files.len(),
        workers = scheduler.resolved_worker_threads(),
        termination = %scheduler.termination,
        "starting digest run"
    );

    let run = pipeline::run_digest(&args.files, scheduler).context("job system failed")?;

    if args.json {
        terminal::print_json(&run)?;
    } else {
        terminal::print_digests(&run)?;
    }

    let failed = run.failed();
    if failed > 0 {
        bail!("{} of {} files failed", failed, run.files.len());
    }
    Ok(())
}
