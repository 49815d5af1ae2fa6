//! Ready-made payloads for file processing pipelines.

mod digest_task;
mod load_file_task;
mod slot;

pub use digest_task::{Digest, DigestSlot, DigestTask};
pub use load_file_task::{FileSlot, LoadFileTask};
pub use slot::Slot;
