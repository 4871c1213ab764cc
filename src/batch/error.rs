use std::fmt;

use thiserror::Error;

/// Top-level batch errors; per-item problems never surface here
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("request list must not be empty")]
    EmptyBatch,
}

/// Stage at which an item left the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Local field checks rejected the item; nothing was sent
    Validation,
    /// Cancelled or timed out while waiting for a worker slot or the rate gate
    Admission,
    /// The remote call failed or was interrupted
    Execution,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Admission => "admission",
            Self::Execution => "execution",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of one batch item, tagged with its input position
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("request {index} {kind} failed: {reason}")]
pub struct ItemFailure {
    pub index: usize,
    pub kind: FailureKind,
    pub reason: String,
}

impl ItemFailure {
    pub fn new(index: usize, kind: FailureKind, reason: impl fmt::Display) -> Self {
        Self {
            index,
            kind,
            reason: reason.to_string(),
        }
    }

    pub fn validation(index: usize, reason: impl fmt::Display) -> Self {
        Self::new(index, FailureKind::Validation, reason)
    }

    pub fn admission(index: usize, reason: impl fmt::Display) -> Self {
        Self::new(index, FailureKind::Admission, reason)
    }

    pub fn execution(index: usize, reason: impl fmt::Display) -> Self {
        Self::new(index, FailureKind::Execution, reason)
    }
}
