use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::wire::nullable;

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Time window for the statistics endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatisticsRequest {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub group_by: Option<String>,
}

impl StatisticsRequest {
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start_date: Some(start),
            end_date: Some(end),
            group_by: None,
        }
    }

    pub fn grouped_by(mut self, group_by: impl Into<String>) -> Self {
        self.group_by = Some(group_by.into());
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if start <= end => Ok(()),
            _ => Err(DomainError::MissingDateRange),
        }
    }

    /// Dates are rendered as `YYYY-MM-DDTHH:MM:SSZ`
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(start) = self.start_date {
            params.push(("start_date", start.format(DATE_FORMAT).to_string()));
        }
        if let Some(end) = self.end_date {
            params.push(("end_date", end.format(DATE_FORMAT).to_string()));
        }
        if let Some(group_by) = self.group_by.as_deref().filter(|g| !g.is_empty()) {
            params.push(("group_by", group_by.to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "nullable")]
    pub services: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
    pub total_pages: u32,
}

/// Error body returned by the API on non-2xx responses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub details: String,
    pub request_id: String,
}
