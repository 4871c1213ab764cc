use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::error::ItemFailure;
use crate::domain::{PaymentResponse, RefundResponse};

/// Result of one batch item
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<R> {
    Success(R),
    Failure(ItemFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BatchStatus {
    Completed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "COMPLETED",
        }
    }
}

/// Correlation id for logs, derived from the submission time
pub fn new_batch_id(now: DateTime<Utc>) -> String {
    format!("batch_{}", now.timestamp_nanos_opt().unwrap_or_default())
}

/// Aggregate over every item of one batch call.
///
/// Successful responses are kept in input order; [`BatchSummary::indexed_results`]
/// pairs each with its input position.
#[derive(Debug, Clone)]
pub struct BatchSummary<R> {
    pub batch_id: String,
    pub total_count: usize,
    pub success_count: usize,
    pub failed_count: usize,
    pub status: BatchStatus,
    pub results: Vec<R>,
    pub failures: Vec<ItemFailure>,
    pub submit_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: Duration,
    result_indices: Vec<usize>,
}

impl<R> BatchSummary<R> {
    /// Failure messages, one per failed item, in input order
    pub fn errors(&self) -> Vec<String> {
        self.failures.iter().map(ToString::to_string).collect()
    }

    pub fn indexed_results(&self) -> impl Iterator<Item = (usize, &R)> {
        self.result_indices.iter().copied().zip(self.results.iter())
    }

    pub fn has_errors(&self) -> bool {
        self.failed_count > 0
    }

    pub fn is_completed(&self) -> bool {
        self.status == BatchStatus::Completed
    }

    pub fn all_failed(&self) -> bool {
        self.total_count > 0 && self.failed_count == self.total_count
    }
}

impl BatchSummary<PaymentResponse> {
    /// Responses whose order is already paid
    pub fn paid_results(&self) -> impl Iterator<Item = &PaymentResponse> {
        self.results.iter().filter(|r| r.is_paid())
    }
}

impl BatchSummary<RefundResponse> {
    pub fn successful_refunds(&self) -> impl Iterator<Item = &RefundResponse> {
        self.results.iter().filter(|r| r.is_success())
    }
}

/// Collects outcomes into per-item slots and builds the summary once every
/// slot is filled.
pub(crate) struct BatchAggregator<R> {
    batch_id: String,
    submit_time: DateTime<Utc>,
    started: Instant,
    slots: Vec<Option<Outcome<R>>>,
}

impl<R> BatchAggregator<R> {
    pub fn new(batch_id: String, submit_time: DateTime<Utc>, total: usize) -> Self {
        Self {
            batch_id,
            submit_time,
            started: Instant::now(),
            slots: (0..total).map(|_| None).collect(),
        }
    }

    pub fn record(&mut self, index: usize, outcome: Outcome<R>) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Some(outcome);
        }
    }

    pub fn finish(self) -> BatchSummary<R> {
        let total_count = self.slots.len();
        let mut results = Vec::new();
        let mut result_indices = Vec::new();
        let mut failures = Vec::new();

        for (index, slot) in self.slots.into_iter().enumerate() {
            match slot {
                Some(Outcome::Success(response)) => {
                    results.push(response);
                    result_indices.push(index);
                }
                Some(Outcome::Failure(failure)) => failures.push(failure),
                None => failures.push(ItemFailure::execution(index, "no outcome reported")),
            }
        }

        let duration = self.started.elapsed();
        let summary = BatchSummary {
            batch_id: self.batch_id,
            total_count,
            success_count: results.len(),
            failed_count: failures.len(),
            status: BatchStatus::Completed,
            results,
            failures,
            submit_time: self.submit_time,
            end_time: Utc::now(),
            duration,
            result_indices,
        };

        info!(
            batch_id = %summary.batch_id,
            total = summary.total_count,
            success = summary.success_count,
            failed = summary.failed_count,
            ?duration,
            "Batch completed"
        );
        summary
    }
}
