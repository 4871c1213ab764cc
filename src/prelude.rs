//! Prelude module for convenient imports
//!
//! Import everything you need with: `use autopay::prelude::*;`

// Domain types
pub use crate::domain::{
    Amount, Channel, ChannelCode, ChannelQuery, ChannelStatus, Currency, DomainError,
    OrderStatus, PaymentMethod, PaymentRequest, PaymentResponse, RefundRequest, RefundResponse,
    RefundStatus, StatisticsRequest,
};

// Client and services
pub use crate::client::{AutoPayClient, BatchRequest, BatchResult};
pub use crate::config::{Config, ConfigError, Environment};
pub use crate::http::{ClientError, StatsSnapshot};
pub use crate::services::{ChannelService, PaymentService, RefundService};

// Concurrency types
pub use crate::batch::{
    BatchDispatcher, BatchError, BatchExecutor, BatchSummary, FailureKind, ItemFailure, Outcome,
};
pub use crate::context::{Context, ContextError};
pub use crate::ratelimit::{Admission, RateGate, SharedGate, Unthrottled};

// IO types
pub use crate::io::{IoError, PaymentCsvStream, RefundCsvStream, write_report};

// App types
pub use crate::app::{AppError, BatchArgs, BatchKind, CliApp, init_tracing};
