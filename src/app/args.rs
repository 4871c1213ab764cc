use std::path::PathBuf;

use super::error::AppError;

pub const USAGE: &str = "Usage: autopay <payments|refunds> <file.csv> [max_workers]";

/// Which request type the input file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Payments,
    Refunds,
}

/// Parsed command line of the batch CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchArgs {
    pub kind: BatchKind,
    pub input: PathBuf,
    /// 0 defers to the configured worker count
    pub max_workers: usize,
}

impl BatchArgs {
    /// Parse and validate command-line arguments, program name included
    pub fn parse(args: Vec<String>) -> Result<Self, AppError> {
        let usage = || AppError::InvalidArguments(USAGE.to_string());

        if !(3..=4).contains(&args.len()) {
            return Err(usage());
        }

        let kind = match args[1].as_str() {
            "payments" => BatchKind::Payments,
            "refunds" => BatchKind::Refunds,
            _ => return Err(usage()),
        };

        let max_workers = match args.get(3) {
            Some(raw) => raw.parse().map_err(|_| {
                AppError::InvalidArguments(format!("max_workers must be a number, got '{raw}'"))
            })?,
            None => 0,
        };

        Ok(Self {
            kind,
            input: PathBuf::from(&args[2]),
            max_workers,
        })
    }
}
