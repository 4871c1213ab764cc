use std::str::FromStr;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::domain::{Amount, Currency, DomainError, PaymentMethod, PaymentRequest, RefundRequest};

/// A CSV row type that converts into a batch request.
///
/// Conversion never fails: unparseable values are left unset so the
/// request fails validation inside the batch instead of aborting the load.
pub trait BatchRecord: DeserializeOwned + Send + 'static {
    type Request: Send + 'static;

    fn into_request(self, row: usize) -> Self::Request;
}

/// Payment row: `out_trade_no,total_amount,currency,subject,body,payment_method,notify_url,return_url`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawPaymentRecord {
    pub out_trade_no: String,
    pub total_amount: Option<String>,
    pub currency: Option<String>,
    pub subject: String,
    pub body: String,
    pub payment_method: Option<String>,
    pub notify_url: String,
    pub return_url: String,
}

impl BatchRecord for RawPaymentRecord {
    type Request = PaymentRequest;

    fn into_request(self, row: usize) -> PaymentRequest {
        PaymentRequest {
            total_amount: parse_amount(row, "total_amount", self.total_amount),
            currency: parse_field(row, "currency", self.currency),
            payment_method: parse_field::<PaymentMethod>(row, "payment_method", self.payment_method),
            out_trade_no: self.out_trade_no,
            subject: self.subject,
            body: self.body,
            notify_url: self.notify_url,
            return_url: self.return_url,
            ..Default::default()
        }
    }
}

/// Refund row: `out_trade_no,trade_no,refund_amount,currency,refund_reason,notify_url`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawRefundRecord {
    pub out_trade_no: String,
    pub trade_no: String,
    pub refund_amount: Option<String>,
    pub currency: Option<String>,
    pub refund_reason: String,
    pub notify_url: String,
}

impl BatchRecord for RawRefundRecord {
    type Request = RefundRequest;

    fn into_request(self, row: usize) -> RefundRequest {
        RefundRequest {
            refund_amount: parse_amount(row, "refund_amount", self.refund_amount),
            currency: parse_field::<Currency>(row, "currency", self.currency),
            out_trade_no: self.out_trade_no,
            trade_no: self.trade_no,
            refund_reason: self.refund_reason,
            notify_url: self.notify_url,
            ..Default::default()
        }
    }
}

fn parse_amount(row: usize, field: &'static str, value: Option<String>) -> Amount {
    let Some(value) = value else {
        return Amount::zero();
    };
    Amount::from_decimal_str(&value).unwrap_or_else(|e| {
        warn!(row, field, error = %e, "Unparseable amount, item will fail validation");
        Amount::zero()
    })
}

fn parse_field<T>(row: usize, field: &'static str, value: Option<String>) -> Option<T>
where
    T: FromStr<Err = DomainError>,
{
    let value = value?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(row, field, error = %e, "Unparseable value, item will fail validation");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment_record() -> RawPaymentRecord {
        RawPaymentRecord {
            out_trade_no: "ORDER-1".to_string(),
            total_amount: Some("12.50".to_string()),
            currency: Some("cny".to_string()),
            subject: "Coffee".to_string(),
            payment_method: Some("wechat".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn parse_payment_row() {
        let req = payment_record().into_request(0);
        assert_eq!(req.out_trade_no, "ORDER-1");
        assert_eq!(req.total_amount, Amount::from_raw(125_000));
        assert_eq!(req.currency, Some(Currency::Cny));
        assert_eq!(req.payment_method, Some(PaymentMethod::WeChat));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn bad_amount_fails_validation_later() {
        let mut record = payment_record();
        record.total_amount = Some("twelve".to_string());

        let req = record.into_request(3);
        assert_eq!(req.total_amount, Amount::zero());
        assert_eq!(req.validate(), Err(DomainError::NonPositiveAmount));
    }

    #[test]
    fn unknown_method_fails_validation_later() {
        let mut record = payment_record();
        record.payment_method = Some("cheque".to_string());

        let req = record.into_request(1);
        assert_eq!(req.validate(), Err(DomainError::MissingPaymentMethod));
    }

    #[test]
    fn parse_refund_row() {
        let record = RawRefundRecord {
            trade_no: "T-9".to_string(),
            refund_amount: Some("3".to_string()),
            currency: Some("USD".to_string()),
            refund_reason: "duplicate".to_string(),
            ..Default::default()
        };

        let req = record.into_request(0);
        assert_eq!(req.reference(), "T-9");
        assert_eq!(req.refund_amount, Amount::from_units(3));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn refund_with_unknown_currency_fails_validation_later() {
        let record = RawRefundRecord {
            out_trade_no: "ORDER-1".to_string(),
            refund_amount: Some("3".to_string()),
            currency: Some("GBP".to_string()),
            refund_reason: "duplicate".to_string(),
            ..Default::default()
        };

        let req = record.into_request(0);
        assert_eq!(req.validate(), Err(DomainError::MissingCurrency));
    }
}
