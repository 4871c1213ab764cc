use std::io;
use thiserror::Error;

use crate::batch::BatchError;
use crate::config::ConfigError;
use crate::http::ClientError;
use crate::io::IoError;

/// Top-level application errors unifying all layer errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV IO error: {0}")]
    CsvIo(#[from] IoError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}
