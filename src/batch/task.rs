use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::error::ItemFailure;
use super::executor::BatchExecutor;
use super::summary::Outcome;
use crate::context::Context;
use crate::ratelimit::SharedGate;

/// Pipeline for exactly one batch item: validate, take a worker slot,
/// pass the rate gate, execute. Produces exactly one [`Outcome`].
pub(crate) struct TaskUnit<E: BatchExecutor> {
    pub index: usize,
    pub item: E::Item,
    pub executor: Arc<E>,
    pub gate: SharedGate,
    pub slots: Arc<Semaphore>,
}

impl<E: BatchExecutor> TaskUnit<E> {
    pub async fn run(self, ctx: Context) -> Outcome<E::Response> {
        let index = self.index;
        let outcome = self.execute_pipeline(&ctx).await;

        if let Outcome::Failure(failure) = &outcome {
            warn!(index, kind = %failure.kind, reason = %failure.reason, "Batch item failed");
        }
        outcome
    }

    async fn execute_pipeline(self, ctx: &Context) -> Outcome<E::Response> {
        let TaskUnit {
            index,
            item,
            executor,
            gate,
            slots,
        } = self;

        if let Err(e) = executor.validate(&item) {
            return Outcome::Failure(ItemFailure::validation(index, e));
        }

        // Held until this function returns, on every path
        let _permit = match ctx.run(slots.acquire_owned()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(closed)) => return Outcome::Failure(ItemFailure::admission(index, closed)),
            Err(e) => return Outcome::Failure(ItemFailure::admission(index, e)),
        };

        if let Err(e) = gate.wait(ctx).await {
            return Outcome::Failure(ItemFailure::admission(index, e));
        }

        debug!(index, "Executing batch item");
        match ctx.run(executor.execute(ctx, &item)).await {
            Ok(Ok(response)) => Outcome::Success(response),
            Ok(Err(e)) => Outcome::Failure(ItemFailure::execution(index, e)),
            Err(e) => Outcome::Failure(ItemFailure::execution(index, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::error::FailureKind;
    use crate::context::ContextError;
    use crate::ratelimit::{Admission, Unthrottled};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct Doubler {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl BatchExecutor for Doubler {
        type Item = i64;
        type Response = i64;
        type Error = String;

        fn validate(&self, item: &i64) -> Result<(), String> {
            if *item < 0 {
                Err("negative".to_string())
            } else {
                Ok(())
            }
        }

        async fn execute(&self, _ctx: &Context, item: &i64) -> Result<i64, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if *item == 13 {
                Err("unlucky".to_string())
            } else {
                Ok(item * 2)
            }
        }
    }

    fn task(executor: &Arc<Doubler>, slots: &Arc<Semaphore>, item: i64) -> TaskUnit<Doubler> {
        TaskUnit {
            index: 4,
            item,
            executor: executor.clone(),
            gate: Unthrottled::shared(),
            slots: slots.clone(),
        }
    }

    #[tokio::test]
    async fn success_releases_slot() {
        let executor = Arc::new(Doubler::default());
        let slots = Arc::new(Semaphore::new(1));

        let outcome = task(&executor, &slots, 21).run(Context::new()).await;
        assert!(matches!(outcome, Outcome::Success(42)));
        assert_eq!(slots.available_permits(), 1);
    }

    #[tokio::test]
    async fn validation_failure_skips_execution() {
        let executor = Arc::new(Doubler::default());
        let slots = Arc::new(Semaphore::new(1));

        let outcome = task(&executor, &slots, -1).run(Context::new()).await;
        match outcome {
            Outcome::Failure(f) => {
                assert_eq!(f.index, 4);
                assert_eq!(f.kind, FailureKind::Validation);
                assert_eq!(f.reason, "negative");
            }
            Outcome::Success(_) => panic!("expected validation failure"),
        }
        assert_eq!(executor.calls.load(Ordering::SeqCst), 0);
    }

    /// Admits everything, counting calls
    #[derive(Debug, Default)]
    struct CountingGate {
        waits: AtomicUsize,
    }

    #[async_trait]
    impl Admission for CountingGate {
        async fn wait(&self, _ctx: &Context) -> Result<(), ContextError> {
            self.waits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn validation_failure_consumes_no_gate_budget() {
        let executor = Arc::new(Doubler::default());
        let slots = Arc::new(Semaphore::new(1));
        let gate = Arc::new(CountingGate::default());
        let shared: SharedGate = gate.clone();

        let mut invalid = task(&executor, &slots, -1);
        invalid.gate = shared.clone();
        let outcome = invalid.run(Context::new()).await;
        assert!(matches!(
            outcome,
            Outcome::Failure(ItemFailure { kind: FailureKind::Validation, .. })
        ));
        assert_eq!(gate.waits.load(Ordering::SeqCst), 0);
        assert_eq!(slots.available_permits(), 1);

        let mut valid = task(&executor, &slots, 2);
        valid.gate = shared;
        valid.run(Context::new()).await;
        assert_eq!(gate.waits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn execution_failure_releases_slot() {
        let executor = Arc::new(Doubler::default());
        let slots = Arc::new(Semaphore::new(1));

        let outcome = task(&executor, &slots, 13).run(Context::new()).await;
        assert!(matches!(
            outcome,
            Outcome::Failure(ItemFailure { kind: FailureKind::Execution, .. })
        ));
        assert_eq!(slots.available_permits(), 1);
    }

    #[tokio::test]
    async fn cancelled_while_waiting_for_slot() {
        let executor = Arc::new(Doubler::default());
        let slots = Arc::new(Semaphore::new(0));
        let ctx = Context::new();
        ctx.cancel();

        let outcome = task(&executor, &slots, 1).run(ctx).await;
        assert!(matches!(
            outcome,
            Outcome::Failure(ItemFailure { kind: FailureKind::Admission, .. })
        ));
        assert_eq!(executor.calls.load(Ordering::SeqCst), 0);
    }
}
