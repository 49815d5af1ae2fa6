//! Whole-file loading helpers used by I/O payloads.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::CoreError;

/// Raw bytes of a file together with the path they were read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileBuffer {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl FileBuffer {
    pub fn new(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        Self { path: path.into(), bytes }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn map_io(path: &Path, err: std::io::Error) -> CoreError {
    if err.kind() == ErrorKind::NotFound {
        CoreError::FileNotFound(path.to_path_buf())
    } else {
        CoreError::Io(err)
    }
}

/// Read a file fully into memory.
pub fn load_file(path: impl AsRef<Path>) -> Result<FileBuffer, CoreError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| map_io(path, e))?;
    tracing::trace!(path = %path.display(), bytes = bytes.len(), "file loaded");
    Ok(FileBuffer::new(path, bytes))
}
