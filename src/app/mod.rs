pub mod args;
pub mod cli;
pub mod error;

// Re-export commonly used types
pub use args::{BatchArgs, BatchKind};
pub use cli::{CliApp, init_tracing};
pub use error::AppError;
