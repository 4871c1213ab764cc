use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::amount::Amount;
use super::currency::Currency;
use super::payment::PaymentMethod;
use super::wire::{nanos, nullable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChannelStatus {
    Active,
    Inactive,
    Maintenance,
    Disabled,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ChannelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Maintenance => "MAINTENANCE",
            Self::Disabled => "DISABLED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Channel identifier; unknown codes from the server are kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelCode(pub String);

impl ChannelCode {
    pub const ALIPAY: &'static str = "alipay";
    pub const WECHAT_PAY: &'static str = "wechat_pay";
    pub const UNIONPAY: &'static str = "unionpay";
    pub const CREDIT_CARD: &'static str = "credit_card";
    pub const BANK_TRANSFER: &'static str = "bank_transfer";
    pub const CRYPTOCURRENCY: &'static str = "cryptocurrency";
    pub const PAYPAL: &'static str = "paypal";

    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

/// A payment channel as described by the remote side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Channel {
    pub code: ChannelCode,
    pub name: String,
    pub status: ChannelStatus,
    pub version: String,
    pub description: String,
    #[serde(deserialize_with = "nullable")]
    pub supported_currencies: Vec<Currency>,
    pub min_amount: Amount,
    pub max_amount: Amount,
    pub fee_rate: f64,
    pub fixed_fee: Amount,
    #[serde(with = "nanos")]
    pub timeout: Duration,
    pub success_rate: f64,
    #[serde(with = "nanos")]
    pub average_delay: Duration,
    #[serde(deserialize_with = "nullable")]
    pub feature: HashMap<String, Value>,
    #[serde(deserialize_with = "nullable")]
    pub metadata: HashMap<String, String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Channel {
    /// Minimum success rate for a channel to be considered available
    pub const AVAILABILITY_THRESHOLD: f64 = 0.8;

    pub fn is_active(&self) -> bool {
        self.status == ChannelStatus::Active
    }

    pub fn is_available(&self) -> bool {
        self.is_active() && self.success_rate >= Self::AVAILABILITY_THRESHOLD
    }

    pub fn supports_currency(&self, currency: Currency) -> bool {
        self.supported_currencies.contains(&currency)
    }

    pub fn can_process_amount(&self, amount: Amount) -> bool {
        amount >= self.min_amount && amount <= self.max_amount
    }

    /// `amount * fee_rate + fixed_fee`
    pub fn calculate_fee(&self, amount: Amount) -> Amount {
        amount.scale_by(self.fee_rate) + self.fixed_fee
    }
}

/// Filters for listing channels; unset fields are not sent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelQuery {
    pub status: Option<ChannelStatus>,
    pub currency: Option<Currency>,
    pub min_amount: Option<Amount>,
    pub max_amount: Option<Amount>,
    pub success_rate: Option<f64>,
    pub query: String,
    pub sort_by: String,
    pub sort_order: String,
    pub page: u32,
    pub page_size: u32,
}

impl ChannelQuery {
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(currency) = self.currency {
            params.push(("currency", currency.to_string()));
        }
        if let Some(min) = self.min_amount {
            params.push(("min_amount", format!("{:.6}", min.to_f64())));
        }
        if let Some(max) = self.max_amount {
            params.push(("max_amount", format!("{:.6}", max.to_f64())));
        }
        if let Some(rate) = self.success_rate {
            params.push(("success_rate", format!("{:.6}", rate)));
        }
        if !self.query.is_empty() {
            params.push(("query", self.query.clone()));
        }
        if !self.sort_by.is_empty() {
            params.push(("sort_by", self.sort_by.clone()));
        }
        if !self.sort_order.is_empty() {
            params.push(("sort_order", self.sort_order.clone()));
        }
        if self.page > 0 {
            params.push(("page", self.page.to_string()));
        }
        if self.page_size > 0 {
            params.push(("page_size", self.page_size.to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelList {
    #[serde(deserialize_with = "nullable")]
    pub channels: Vec<Channel>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub has_more: bool,
    #[serde(with = "nanos")]
    pub query_time: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelStats {
    pub code: ChannelCode,
    pub name: String,
    pub transaction_count: i64,
    pub total_amount: Amount,
    pub success_count: i64,
    pub failed_count: i64,
    pub success_rate: f64,
    pub average_amount: Amount,
    pub average_fee: Amount,
    pub total_fee: Amount,
    pub refund_count: i64,
    pub refund_amount: Amount,
    pub peak_tps: f64,
    #[serde(with = "nanos")]
    pub average_delay: Duration,
    #[serde(with = "nanos")]
    pub min_delay: Duration,
    #[serde(with = "nanos")]
    pub max_delay: Duration,
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub amount: Amount,
    pub currency: Option<Currency>,
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub customer_region: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub business_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub priority: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub constraints: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recommendation {
    #[serde(deserialize_with = "nullable")]
    pub channels: Vec<Channel>,
    pub score: f64,
    #[serde(deserialize_with = "nullable")]
    pub reasons: Vec<String>,
    pub risk_level: String,
    #[serde(with = "nanos")]
    pub estimated_delay: Duration,
    pub estimated_fee: Amount,
    #[serde(deserialize_with = "nullable")]
    pub alternatives: Vec<Channel>,
}

/// Body of a comparison request
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CompareRequest<'a> {
    pub channels: &'a [ChannelCode],
    pub criteria: &'a [String],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comparison {
    #[serde(deserialize_with = "nullable")]
    pub channels: Vec<ComparisonItem>,
    #[serde(deserialize_with = "nullable")]
    pub comparison_criteria: Vec<String>,
    pub recommended: String,
    #[serde(deserialize_with = "nullable")]
    pub summary: HashMap<String, Value>,
    pub generated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonItem {
    pub channel: Channel,
    #[serde(deserialize_with = "nullable")]
    pub scores: HashMap<String, f64>,
    #[serde(deserialize_with = "nullable")]
    pub pros: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub cons: Vec<String>,
    pub overall_score: f64,
}
