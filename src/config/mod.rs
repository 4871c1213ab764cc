pub mod error;
pub mod settings;

// Re-export commonly used types
pub use error::ConfigError;
pub use settings::{Config, Environment, PRODUCTION_BASE_URL, SANDBOX_BASE_URL};
