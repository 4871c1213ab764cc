pub mod error;
pub mod scope;

// Re-export commonly used types
pub use error::ContextError;
pub use scope::Context;
