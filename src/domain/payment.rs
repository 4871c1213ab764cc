use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::amount::Amount;
use super::currency::Currency;
use super::error::DomainError;
use super::wire::{nanos, nullable, option_nanos};

/// Order lifecycle as reported by the remote side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Failed,
    Cancelled,
    Expired,
    Refunded,
    Partial,
    #[default]
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
            Self::Refunded => "REFUNDED",
            Self::Partial => "PARTIAL",
            Self::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "alipay")]
    Alipay,
    #[serde(rename = "wechat")]
    WeChat,
    #[serde(rename = "bank_card")]
    BankCard,
    #[serde(rename = "unionpay")]
    UnionPay,
    #[serde(rename = "credit")]
    Credit,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alipay => "alipay",
            Self::WeChat => "wechat",
            Self::BankCard => "bank_card",
            Self::UnionPay => "unionpay",
            Self::Credit => "credit",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "alipay" => Ok(Self::Alipay),
            "wechat" => Ok(Self::WeChat),
            "bank_card" => Ok(Self::BankCard),
            "unionpay" => Ok(Self::UnionPay),
            "credit" => Ok(Self::Credit),
            _ => Err(DomainError::UnknownValue {
                field: "payment_method",
                value: s.to_string(),
            }),
        }
    }
}

/// Request to create one payment order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub out_trade_no: String,
    pub total_amount: Amount,
    pub currency: Option<Currency>,
    pub subject: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notify_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub return_url: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attach_data: HashMap<String, Value>,
    #[serde(default, with = "option_nanos", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub custom_fields: HashMap<String, Value>,
}

impl PaymentRequest {
    /// Default order expiry applied when the caller leaves `timeout` unset
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15 * 60);

    pub fn new(
        out_trade_no: impl Into<String>,
        total_amount: Amount,
        currency: Currency,
        subject: impl Into<String>,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            out_trade_no: out_trade_no.into(),
            total_amount,
            currency: Some(currency),
            subject: subject.into(),
            payment_method: Some(payment_method),
            ..Default::default()
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_notify_url(mut self, url: impl Into<String>) -> Self {
        self.notify_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Check required fields; no I/O
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.out_trade_no.trim().is_empty() {
            return Err(DomainError::MissingOutTradeNo);
        }
        if !self.total_amount.is_positive() {
            return Err(DomainError::NonPositiveAmount);
        }
        if self.currency.is_none() {
            return Err(DomainError::MissingCurrency);
        }
        if self.subject.trim().is_empty() {
            return Err(DomainError::MissingSubject);
        }
        if self.payment_method.is_none() {
            return Err(DomainError::MissingPaymentMethod);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentResponse {
    pub out_trade_no: String,
    pub trade_no: String,
    pub status: OrderStatus,
    pub total_amount: Amount,
    pub currency: Option<Currency>,
    pub subject: String,
    pub body: String,
    pub payment_method: Option<PaymentMethod>,
    pub qr_code_url: String,
    pub payment_url: String,
    pub transaction_id: String,
    pub channel_code: String,
    pub channel_msg: String,
    pub order_time: Option<DateTime<Utc>>,
    pub expire_time: Option<DateTime<Utc>>,
    pub paid_time: Option<DateTime<Utc>>,
    pub failed_time: Option<DateTime<Utc>>,
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

impl PaymentResponse {
    pub fn is_paid(&self) -> bool {
        self.status == OrderStatus::Paid
    }

    pub fn is_failed(&self) -> bool {
        self.status == OrderStatus::Failed
    }

    pub fn is_expired(&self) -> bool {
        self.status == OrderStatus::Expired
    }

    /// Failed and expired orders may be resubmitted by the caller
    pub fn can_retry(&self) -> bool {
        matches!(self.status, OrderStatus::Failed | OrderStatus::Expired)
    }
}

/// Lookup by merchant order number or platform order number
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentQueryRequest {
    pub out_trade_no: String,
    pub trade_no: String,
}

impl PaymentQueryRequest {
    pub fn by_out_trade_no(out_trade_no: impl Into<String>) -> Self {
        Self {
            out_trade_no: out_trade_no.into(),
            ..Default::default()
        }
    }

    pub fn by_trade_no(trade_no: impl Into<String>) -> Self {
        Self {
            trade_no: trade_no.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.out_trade_no.is_empty() && self.trade_no.is_empty() {
            return Err(DomainError::MissingOrderReference);
        }
        Ok(())
    }

    /// Merchant order number wins when both are present
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        if !self.out_trade_no.is_empty() {
            vec![("out_trade_no", self.out_trade_no.clone())]
        } else {
            vec![("trade_no", self.trade_no.clone())]
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentQueryResponse {
    #[serde(flatten)]
    pub payment: PaymentResponse,
    pub query_time: Option<DateTime<Utc>>,
    pub original_amount: Amount,
    pub refund_amount: Amount,
    pub fee_amount: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCancelRequest {
    pub out_trade_no: String,
    pub trade_no: String,
    pub reason: String,
}

impl PaymentCancelRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.out_trade_no.is_empty() && self.trade_no.is_empty() {
            return Err(DomainError::MissingOrderReference);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentCancelResponse {
    pub out_trade_no: String,
    pub trade_no: String,
    pub status: OrderStatus,
    pub cancel_time: Option<DateTime<Utc>>,
    pub reason: String,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentStatistics {
    pub total_count: i64,
    pub total_amount: Amount,
    pub success_count: i64,
    pub success_amount: Amount,
    pub failed_count: i64,
    pub failed_amount: Amount,
    pub average_amount: Amount,
    pub refund_count: i64,
    pub refund_amount: Amount,
    pub fee_amount: Amount,
    #[serde(deserialize_with = "nullable")]
    pub statistics_data: Vec<HashMap<String, Value>>,
    pub period: String,
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(with = "nanos")]
    pub query_time: Duration,
}
