pub mod gate;

// Re-export commonly used types
pub use gate::{Admission, RateGate, SharedGate, Unthrottled};
