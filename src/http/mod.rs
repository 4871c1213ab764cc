pub mod error;
pub mod stats;
pub mod transport;

// Re-export commonly used types
pub use error::ClientError;
pub use stats::{ClientStats, StatsSnapshot};
pub use transport::{HttpTransport, USER_AGENT};
