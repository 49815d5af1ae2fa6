use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::io::{self, Write};

use crate::pipeline::{DigestRun, FileReport};

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const ERROR: Color = Color::Red;
    const DIM: Color = Color::DarkGrey;
}

/// Plain-text line for one file, in `sha256sum` layout.
pub fn digest_line(report: &FileReport) -> String {
    match (&report.sha256, &report.error) {
        (Some(sha256), _) => format!("{}  {}", sha256, report.path.display()),
        (None, Some(error)) => format!("{}: {}", report.path.display(), error),
        (None, None) => format!("{}: no result", report.path.display()),
    }
}

/// Summary line printed after the per-file results.
pub fn summary_line(run: &DigestRun) -> String {
    format!(
        "{} files, {} failed, {} workers, {} ms",
        run.files.len(),
        run.failed(),
        run.workers,
        run.elapsed_ms
    )
}

/// Print digests to stdout and failures (in red) to stderr.
pub fn print_digests(run: &DigestRun) -> Result<()> {
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    for report in &run.files {
        if report.is_ok() {
            writeln!(stdout, "{}", digest_line(report))?;
        } else {
            execute!(
                stderr,
                SetForegroundColor(Colors::ERROR),
                Print(format!("error: {}\n", digest_line(report))),
                ResetColor,
            )?;
        }
    }
    stdout.flush()?;

    execute!(
        stderr,
        SetForegroundColor(Colors::DIM),
        Print(format!("{}\n", summary_line(run))),
        ResetColor,
    )?;
    Ok(())
}

/// Print the whole run as pretty JSON.
pub fn print_json(run: &DigestRun) -> Result<()> {
    let mut stdout = io::stdout();
    writeln!(stdout, "{}", serde_json::to_string_pretty(run)?)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobsys_scheduler::SchedulerMetrics;
    use std::path::PathBuf;

    fn report(sha256: Option<&str>, error: Option<&str>) -> FileReport {
        FileReport {
            path: PathBuf::from("data/a.bin"),
            sha256: sha256.map(String::from),
            bytes: sha256.map(|_| 3),
            error: error.map(String::from),
        }
    }

    #[test]
    fn test_digest_line_layout() {
        assert_eq!(digest_line(&report(Some("abc"), None)), "abc  data/a.bin");
        assert_eq!(
            digest_line(&report(None, Some("File not found"))),
            "data/a.bin: File not found"
        );
    }

    #[test]
    fn test_summary_line_counts_failures() {
        let run = DigestRun {
            files: vec![report(Some("abc"), None), report(None, Some("boom"))],
            workers: 4,
            elapsed_ms: 12,
            metrics: SchedulerMetrics::default(),
        };
        assert_eq!(summary_line(&run), "2 files, 1 failed, 4 workers, 12 ms");
    }
}
