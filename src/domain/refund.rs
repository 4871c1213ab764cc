use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::amount::Amount;
use super::currency::Currency;
use super::error::DomainError;
use super::wire::{nanos, nullable, option_nanos};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RefundStatus {
    Pending,
    Processing,
    Success,
    Failed,
    Partial,
    Cancelled,
    #[default]
    #[serde(other)]
    Unknown,
}

impl RefundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Partial => "PARTIAL",
            Self::Cancelled => "CANCELLED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Request to refund (part of) an existing order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefundRequest {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub out_trade_no: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub trade_no: String,
    pub refund_amount: Amount,
    pub currency: Option<Currency>,
    pub refund_reason: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notify_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub batch_no: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attach_data: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub custom_fields: HashMap<String, Value>,
    #[serde(default, with = "option_nanos", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

impl RefundRequest {
    /// Default expiry applied when the caller leaves `timeout` unset
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

    /// Refund against a merchant order number
    pub fn for_order(
        out_trade_no: impl Into<String>,
        refund_amount: Amount,
        currency: Currency,
        refund_reason: impl Into<String>,
    ) -> Self {
        Self {
            out_trade_no: out_trade_no.into(),
            refund_amount,
            currency: Some(currency),
            refund_reason: refund_reason.into(),
            ..Default::default()
        }
    }

    /// Refund against a platform trade number
    pub fn for_trade(
        trade_no: impl Into<String>,
        refund_amount: Amount,
        currency: Currency,
        refund_reason: impl Into<String>,
    ) -> Self {
        Self {
            trade_no: trade_no.into(),
            refund_amount,
            currency: Some(currency),
            refund_reason: refund_reason.into(),
            ..Default::default()
        }
    }

    pub fn with_notify_url(mut self, url: impl Into<String>) -> Self {
        self.notify_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.out_trade_no.trim().is_empty() && self.trade_no.trim().is_empty() {
            return Err(DomainError::MissingOrderReference);
        }
        if !self.refund_amount.is_positive() {
            return Err(DomainError::NonPositiveAmount);
        }
        if self.currency.is_none() {
            return Err(DomainError::MissingCurrency);
        }
        if self.refund_reason.trim().is_empty() {
            return Err(DomainError::MissingRefundReason);
        }
        Ok(())
    }

    /// Whichever order reference identifies this refund, for logs and reports
    pub fn reference(&self) -> &str {
        if self.out_trade_no.is_empty() {
            &self.trade_no
        } else {
            &self.out_trade_no
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefundResponse {
    pub out_trade_no: String,
    pub trade_no: String,
    pub refund_no: String,
    pub out_refund_no: String,
    pub status: RefundStatus,
    pub refund_amount: Amount,
    pub currency: Option<Currency>,
    pub original_amount: Amount,
    pub refund_reason: String,
    pub refund_method: String,
    pub transaction_id: String,
    pub channel_code: String,
    pub channel_msg: String,
    pub order_time: Option<DateTime<Utc>>,
    pub submit_time: Option<DateTime<Utc>>,
    pub process_time: Option<DateTime<Utc>>,
    pub complete_time: Option<DateTime<Utc>>,
    pub expire_time: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "nullable")]
    pub attach_data: HashMap<String, Value>,
    #[serde(deserialize_with = "nullable")]
    pub metadata: HashMap<String, String>,
    #[serde(deserialize_with = "nullable")]
    pub custom_fields: HashMap<String, Value>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl RefundResponse {
    pub fn is_success(&self) -> bool {
        self.status == RefundStatus::Success
    }

    pub fn is_failed(&self) -> bool {
        self.status == RefundStatus::Failed
    }

    pub fn is_partial(&self) -> bool {
        self.status == RefundStatus::Partial
    }

    pub fn can_retry(&self) -> bool {
        self.status == RefundStatus::Failed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundQueryRequest {
    pub out_trade_no: String,
    pub trade_no: String,
    pub out_refund_no: String,
    pub refund_no: String,
}

impl RefundQueryRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.query_params().is_empty() {
            return Err(DomainError::MissingQueryParameter);
        }
        Ok(())
    }

    /// Every non-empty identifier is sent
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        [
            ("out_trade_no", &self.out_trade_no),
            ("trade_no", &self.trade_no),
            ("out_refund_no", &self.out_refund_no),
            ("refund_no", &self.refund_no),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key, value.clone()))
        .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefundQueryResponse {
    #[serde(flatten)]
    pub refund: RefundResponse,
    pub query_time: Option<DateTime<Utc>>,
    pub remaining_amount: Amount,
    pub processed_amount: Amount,
    pub processing_fee: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundCancelRequest {
    pub out_refund_no: String,
    pub refund_no: String,
    pub reason: String,
}

impl RefundCancelRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.out_refund_no.is_empty() && self.refund_no.is_empty() {
            return Err(DomainError::MissingRefundReference);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefundCancelResponse {
    pub out_refund_no: String,
    pub refund_no: String,
    pub status: RefundStatus,
    pub cancel_time: Option<DateTime<Utc>>,
    pub reason: String,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefundStatistics {
    pub total_count: i64,
    pub total_amount: Amount,
    pub success_count: i64,
    pub success_amount: Amount,
    pub failed_count: i64,
    pub failed_amount: Amount,
    pub partial_count: i64,
    pub partial_amount: Amount,
    pub average_refund_amount: Amount,
    pub processing_fee: Amount,
    #[serde(deserialize_with = "nullable")]
    pub statistics_data: Vec<HashMap<String, Value>>,
    pub period: String,
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(with = "nanos")]
    pub query_time: Duration,
}
