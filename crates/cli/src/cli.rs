use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use jobsys_scheduler::TerminationPolicy;

/// Dependency-aware parallel file digests.
///
/// Every file gets a load job and a digest job that depends on it; a final
/// report job waits for all digests and runs on the main thread.
#[derive(Parser, Debug)]
#[command(name = "jobsys", version, about = "Run file digests on a dependency-aware job system")]
pub struct CliArgs {
    /// Path to config file (default: ~/.config/jobsys/config.toml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Hash files in parallel and print one `sha256  path` line per file
    Digest(DigestArgs),
    /// Print the effective scheduler configuration as TOML
    Config,
}

#[derive(Args, Debug)]
pub struct DigestArgs {
    /// Files to hash
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Worker thread count (0 = available parallelism)
    #[arg(long, short)]
    pub workers: Option<usize>,

    /// What idle workers do: drain (exit when the queue is empty) or block
    #[arg(long)]
    pub termination: Option<TerminationPolicy>,

    /// Emit JSON (per-file results plus scheduler metrics)
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_digest_flags() {
        let args = CliArgs::try_parse_from([
            "jobsys", "digest", "a.bin", "b.bin", "-w", "3", "--termination", "block", "--json",
        ])
        .unwrap();
        match args.command {
            Command::Digest(digest) => {
                assert_eq!(digest.files, vec![PathBuf::from("a.bin"), PathBuf::from("b.bin")]);
                assert_eq!(digest.workers, Some(3));
                assert_eq!(digest.termination, Some(TerminationPolicy::BlockForMore));
                assert!(digest.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn digest_requires_files() {
        assert!(CliArgs::try_parse_from(["jobsys", "digest"]).is_err());
    }

    #[test]
    fn rejects_unknown_termination() {
        assert!(CliArgs::try_parse_from(["jobsys", "digest", "a", "--termination", "never"]).is_err());
    }

    #[test]
    fn config_flag_is_global() {
        let args = CliArgs::try_parse_from(["jobsys", "config", "--config", "/tmp/jobsys.toml"]).unwrap();
        assert_eq!(args.config.as_deref(), Some("/tmp/jobsys.toml"));
        assert!(matches!(args.command, Command::Config));
    }
}
