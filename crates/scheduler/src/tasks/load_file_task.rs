use std::path::{Path, PathBuf};

use jobsys_core::{load_file, FileBuffer};
use tracing::debug;

use crate::error::WorkError;
use crate::job::{Job, JobKind, Work};
use crate::tasks::Slot;

pub type FileSlot = Slot<FileBuffer>;

/// Reads a whole file into a [`FileSlot`].
///
/// On failure the error text is stored in the slot as well, so a dependent
/// job can tell a failed load from one that never ran.
pub struct LoadFileTask {
    path: PathBuf,
    output: FileSlot,
}

impl LoadFileTask {
    pub fn new(path: impl Into<PathBuf>, output: FileSlot) -> Self {
        Self { path: path.into(), output }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_job(self) -> Job {
        let name = format!("load:{}", self.path.display());
        Job::new(name, JobKind::FileLoading, self)
    }
}

impl Work for LoadFileTask {
    fn run(self: Box<Self>) -> Result<(), WorkError> {
        match load_file(&self.path) {
            Ok(buffer) => {
                debug!(path = %self.path.display(), bytes = buffer.len(), "file loaded");
                self.output.fill(buffer);
                Ok(())
            }
            Err(e) => {
                self.output.fail(e.to_string());
                Err(e.into())
            }
        }
    }
}
