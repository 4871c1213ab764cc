use std::io;
use thiserror::Error;

/// IO-level errors for CSV ingestion and report output
#[derive(Error, Debug)]
pub enum IoError {
    #[error("CSV writing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV async parsing error: {0}")]
    CsvAsync(#[from] csv_async::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let wrapped = IoError::from(io_err);

        match wrapped {
            IoError::Io(_) => {}
            _ => panic!("Expected Io error variant"),
        }
        assert_eq!(
            IoError::from(io::Error::new(io::ErrorKind::Other, "disk full")).to_string(),
            "IO error: disk full"
        );
    }
}
