pub mod csv_reader;
pub mod csv_writer;
pub mod error;
pub mod parse;

// Re-export commonly used types
pub use csv_reader::{CsvRequestStream, PaymentCsvStream, RefundCsvStream};
pub use csv_writer::{ReportDetail, write_report};
pub use error::IoError;
pub use parse::{BatchRecord, RawPaymentRecord, RawRefundRecord};
