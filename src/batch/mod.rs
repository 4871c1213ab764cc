pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod summary;
mod task;

// Re-export commonly used types
pub use dispatcher::{BatchDispatcher, DEFAULT_MAX_CONCURRENCY};
pub use error::{BatchError, FailureKind, ItemFailure};
pub use executor::BatchExecutor;
pub use summary::{BatchStatus, BatchSummary, Outcome};
