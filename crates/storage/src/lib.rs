#![forbid(unsafe_code)]

pub mod backend;
pub mod cache;
pub mod progress;

pub use backend::{BackendError, FileBackend, MemoryBackend, StorageBackend};
pub use cache::{CacheError, CacheService, CacheStats, DEFAULT_NAMESPACE};
pub use progress::{PROGRESS_NAMESPACE, ProgressStore};
