use thiserror::Error;

/// Local validation failures, detected before any network attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("out_trade_no must not be empty")]
    MissingOutTradeNo,

    #[error("amount must be greater than 0")]
    NonPositiveAmount,

    #[error("currency must not be empty")]
    MissingCurrency,

    #[error("subject must not be empty")]
    MissingSubject,

    #[error("payment_method must not be empty")]
    MissingPaymentMethod,

    #[error("at least one of out_trade_no or trade_no is required")]
    MissingOrderReference,

    #[error("at least one of out_refund_no or refund_no is required")]
    MissingRefundReference,

    #[error("at least one query parameter is required")]
    MissingQueryParameter,

    #[error("refund_reason must not be empty")]
    MissingRefundReason,

    #[error("start_date and end_date are required")]
    MissingDateRange,

    #[error("channel code list must not be empty")]
    EmptyChannelList,

    #[error("Invalid amount format: {0}")]
    InvalidAmount(String),

    #[error("Arithmetic overflow")]
    AmountOverflow,

    #[error("Unknown {field}: {value}")]
    UnknownValue { field: &'static str, value: String },
}
