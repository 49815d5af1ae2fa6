//! Job system -- owns the shared queue and the worker pool.
//!
//! Split into focused submodules:
//! - `core`: JobSystem struct, constructor, and accessor methods
//! - `lifecycle`: job submission, worker launch, and join
//! - `ordering`: dependency-first ordering for batch submission

mod core;
mod lifecycle;
mod ordering;

pub use self::core::JobSystem;
pub use self::ordering::dependency_order;
