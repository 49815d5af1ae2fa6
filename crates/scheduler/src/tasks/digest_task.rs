use std::path::PathBuf;

use serde::Serialize;
use sha2::{Digest as _, Sha256};
use tracing::debug;

use crate::error::WorkError;
use crate::job::{Job, JobKind, Work};
use crate::tasks::{FileSlot, Slot};

/// SHA-256 of one loaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Digest {
    pub path: PathBuf,
    pub sha256: String,
    pub bytes: usize,
}

pub type DigestSlot = Slot<Digest>;

/// Hashes the contents of a [`FileSlot`] filled by an earlier job.
pub struct DigestTask {
    label: String,
    input: FileSlot,
    output: DigestSlot,
}

impl DigestTask {
    pub fn new(label: impl Into<String>, input: FileSlot, output: DigestSlot) -> Self {
        Self {
            label: label.into(),
            input,
            output,
        }
    }

    pub fn into_job(self) -> Job {
        let name = format!("digest:{}", self.label);
        Job::new(name, JobKind::Decoding, self)
    }
}

impl Work for DigestTask {
    fn run(self: Box<Self>) -> Result<(), WorkError> {
        if let Some(cause) = self.input.error() {
            let message = format!("{}: {cause}", self.label);
            self.output.fail(message.clone());
            return Err(WorkError::MissingInput(message));
        }

        let digest = self.input.with_value(|buffer| Digest {
            path: buffer.path().to_path_buf(),
            sha256: format!("{:x}", Sha256::digest(buffer.bytes())),
            bytes: buffer.len(),
        });

        match digest {
            Some(digest) => {
                debug!(path = %digest.path.display(), sha256 = %digest.sha256, "digest computed");
                self.output.fill(digest);
                Ok(())
            }
            None => {
                let message = format!("{}: input was never loaded", self.label);
                self.output.fail(message.clone());
                Err(WorkError::MissingInput(message))
            }
        }
    }
}
