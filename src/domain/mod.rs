pub mod amount;
pub mod channel;
pub mod common;
pub mod currency;
pub mod error;
pub mod payment;
pub mod refund;
pub(crate) mod wire;

// Re-export commonly used types
pub use amount::Amount;
pub use channel::{
    Channel, ChannelCode, ChannelList, ChannelQuery, ChannelStats, ChannelStatus, Comparison,
    ComparisonItem, Recommendation, RecommendationRequest,
};
pub use common::{ErrorResponse, HealthResponse, Pagination, StatisticsRequest};
pub use currency::Currency;
pub use error::DomainError;
pub use payment::{
    OrderStatus, PaymentCancelRequest, PaymentCancelResponse, PaymentMethod, PaymentQueryRequest,
    PaymentQueryResponse, PaymentRequest, PaymentResponse, PaymentStatistics,
};
pub use refund::{
    RefundCancelRequest, RefundCancelResponse, RefundQueryRequest, RefundQueryResponse,
    RefundRequest, RefundResponse, RefundStatistics, RefundStatus,
};
