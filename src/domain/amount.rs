use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::DomainError;

/// Fixed-point monetary amount using i64 (multiply by 10,000)
///
/// The remote API speaks JSON numbers; amounts are converted at the
/// serde boundary so arithmetic on the client side never touches floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Amount(i64);

impl Amount {
    const SCALE: i64 = 10_000;

    /// Create from raw scaled value
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Get raw scaled value
    pub fn raw(&self) -> i64 {
        self.0
    }

    /// Whole currency units, e.g. `Amount::from_units(12)` is `12.0000`
    pub fn from_units(units: i64) -> Self {
        Self(units.saturating_mul(Self::SCALE))
    }

    /// Zero value
    pub const fn zero() -> Self {
        Self(0)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Parse from decimal string (e.g., "1.5000")
    pub fn from_decimal_str(s: &str) -> Result<Self, DomainError> {
        let s = s.trim();
        let invalid = || DomainError::InvalidAmount(s.to_string());

        let (is_negative, digits) = match s.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, s),
        };

        let (integer_part, decimal_part) = match digits.split_once('.') {
            Some((int, dec)) => (int, dec),
            None => (digits, ""),
        };

        if integer_part.is_empty() || decimal_part.len() > 4 || decimal_part.contains('.') {
            return Err(invalid());
        }

        let integer: i64 = integer_part.parse().map_err(|_| invalid())?;
        let decimal: i64 = format!("{:0<4}", decimal_part)
            .parse()
            .map_err(|_| invalid())?;

        let scaled = integer
            .checked_mul(Self::SCALE)
            .and_then(|v| v.checked_add(decimal))
            .ok_or(DomainError::AmountOverflow)?;

        Ok(Self(if is_negative { -scaled } else { scaled }))
    }

    /// Convert to decimal string with 4 decimal places
    pub fn to_decimal_string(&self) -> String {
        let abs_value = self.0.abs();
        let integer_part = abs_value / Self::SCALE;
        let decimal_part = abs_value % Self::SCALE;

        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:04}", sign, integer_part, decimal_part)
    }

    pub fn checked_add(&self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(&self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Multiply by a rate (fee rates, percentages), rounding to the nearest unit of scale
    pub fn scale_by(&self, rate: f64) -> Self {
        Self((self.0 as f64 * rate).round() as i64)
    }

    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    pub fn from_f64(value: f64) -> Self {
        Self((value * Self::SCALE as f64).round() as i64)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Ok(Self::from_f64(value))
    }
}
