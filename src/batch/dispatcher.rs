use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::error::{BatchError, ItemFailure};
use super::executor::BatchExecutor;
use super::summary::{BatchAggregator, BatchSummary, Outcome, new_batch_id};
use super::task::TaskUnit;
use crate::context::Context;
use crate::ratelimit::SharedGate;

/// Worker budget used when the caller passes 0
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Bounded scheduler: runs one [`TaskUnit`] per item, at most
/// `max_concurrency` of them past slot acquisition at any instant, all
/// sharing the client's rate gate.
pub struct BatchDispatcher<E: BatchExecutor> {
    executor: Arc<E>,
    gate: SharedGate,
    default_concurrency: usize,
}

impl<E: BatchExecutor> Clone for BatchDispatcher<E> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            gate: self.gate.clone(),
            default_concurrency: self.default_concurrency,
        }
    }
}

impl<E: BatchExecutor> BatchDispatcher<E> {
    pub fn new(executor: Arc<E>, gate: SharedGate) -> Self {
        Self {
            executor,
            gate,
            default_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Budget substituted when `dispatch` is called with 0
    pub fn with_default_concurrency(mut self, default_concurrency: usize) -> Self {
        self.default_concurrency = default_concurrency.max(1);
        self
    }

    pub fn executor(&self) -> &Arc<E> {
        &self.executor
    }

    /// Run every item and wait for all of them.
    ///
    /// Only an empty item list is a top-level error. Item failures, including
    /// cancellation through `ctx`, are recorded in the summary.
    pub async fn dispatch(
        &self,
        ctx: &Context,
        items: Vec<E::Item>,
        max_concurrency: usize,
    ) -> Result<BatchSummary<E::Response>, BatchError> {
        if items.is_empty() {
            return Err(BatchError::EmptyBatch);
        }

        let total = items.len();
        let requested = if max_concurrency == 0 {
            self.default_concurrency
        } else {
            max_concurrency
        };
        // Permits beyond one per item are never used
        let max_concurrency = requested.min(total);

        let submit_time = Utc::now();
        let batch_id = new_batch_id(submit_time);
        info!(batch_id = %batch_id, total, max_concurrency, "Dispatching batch");

        let mut aggregator = BatchAggregator::new(batch_id, submit_time, total);
        let slots = Arc::new(Semaphore::new(max_concurrency));

        // Spawn one task per item; only slot holders make progress past validation
        let mut tasks: TaskGroup<_> = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let task = TaskUnit {
                    index,
                    item,
                    executor: self.executor.clone(),
                    gate: self.gate.clone(),
                    slots: slots.clone(),
                };
                tokio::spawn(task.run(ctx.clone()))
            })
            .collect();

        // Await all tasks; each handle is the slot for its item's outcome
        let mut index = 0;
        while let Some(handle) = tasks.handles.front_mut() {
            let outcome = handle.await.unwrap_or_else(|e| {
                debug!(index, error = %e, "Batch task did not complete");
                Outcome::Failure(ItemFailure::execution(index, e))
            });
            tasks.handles.pop_front();
            aggregator.record(index, outcome);
            index += 1;
        }

        Ok(aggregator.finish())
    }
}

/// Spawned item tasks in input order. Tasks still pending when the group is
/// dropped are aborted, so dropping a `dispatch` future stops its batch.
struct TaskGroup<T> {
    handles: VecDeque<JoinHandle<T>>,
}

impl<T> FromIterator<JoinHandle<T>> for TaskGroup<T> {
    fn from_iter<I: IntoIterator<Item = JoinHandle<T>>>(iter: I) -> Self {
        Self {
            handles: iter.into_iter().collect(),
        }
    }
}

impl<T> Drop for TaskGroup<T> {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}
