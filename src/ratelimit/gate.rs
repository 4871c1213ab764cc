use std::fmt::Debug;
use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use tracing::trace;

use crate::context::{Context, ContextError};

/// Blocking admission control shared by every request path of a client.
///
/// `wait` returns once one unit of work may proceed, consuming that unit.
/// When the context finishes first it returns the context's error and
/// consumes nothing.
#[async_trait]
pub trait Admission: Send + Sync + Debug {
    async fn wait(&self, ctx: &Context) -> Result<(), ContextError>;
}

/// Handle to the single gate owned by a client
pub type SharedGate = Arc<dyn Admission>;

/// Token bucket gate: `rate` admissions per second with bursts of up to `burst`
#[derive(Debug)]
pub struct RateGate {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    rate: NonZeroU32,
    burst: NonZeroU32,
}

impl RateGate {
    pub fn new(rate: NonZeroU32, burst: NonZeroU32) -> Self {
        let quota = Quota::per_second(rate).allow_burst(burst);
        Self {
            limiter: RateLimiter::direct(quota),
            rate,
            burst,
        }
    }

    pub fn shared(rate: NonZeroU32, burst: NonZeroU32) -> SharedGate {
        Arc::new(Self::new(rate, burst))
    }

    pub fn rate(&self) -> NonZeroU32 {
        self.rate
    }

    pub fn burst(&self) -> NonZeroU32 {
        self.burst
    }
}

#[async_trait]
impl Admission for RateGate {
    async fn wait(&self, ctx: &Context) -> Result<(), ContextError> {
        ctx.run(self.limiter.until_ready()).await?;
        trace!(rate = self.rate.get(), "Admitted by rate gate");
        Ok(())
    }
}

/// Gate that admits immediately; still honours cancellation
#[derive(Debug, Default, Clone, Copy)]
pub struct Unthrottled;

impl Unthrottled {
    pub fn shared() -> SharedGate {
        Arc::new(Self)
    }
}

#[async_trait]
impl Admission for Unthrottled {
    async fn wait(&self, ctx: &Context) -> Result<(), ContextError> {
        match ctx.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn nz(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[tokio::test]
    async fn burst_is_admitted_immediately() {
        let gate = RateGate::new(nz(1), nz(5));
        let ctx = Context::new();

        let start = Instant::now();
        for _ in 0..5 {
            gate.wait(&ctx).await.unwrap();
        }
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn admissions_beyond_burst_are_paced() {
        let gate = RateGate::new(nz(20), nz(2));
        let ctx = Context::new();

        let start = Instant::now();
        for _ in 0..6 {
            gate.wait(&ctx).await.unwrap();
        }
        // four admissions past the burst at 50ms each
        assert!(start.elapsed() >= Duration::from_millis(180));
    }

    #[tokio::test]
    async fn cancellation_fails_pending_wait() {
        let gate = RateGate::new(nz(1), nz(1));
        let ctx = Context::new();
        gate.wait(&ctx).await.unwrap();

        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        assert_eq!(gate.wait(&ctx).await, Err(ContextError::Cancelled));
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn failed_wait_consumes_nothing() {
        let gate = RateGate::new(nz(1), nz(1));
        let cancelled = Context::new();
        cancelled.cancel();

        assert_eq!(gate.wait(&cancelled).await, Err(ContextError::Cancelled));

        let start = Instant::now();
        gate.wait(&Context::new()).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn unthrottled_honours_cancellation() {
        let gate = Unthrottled;
        let ctx = Context::new();
        assert!(gate.wait(&ctx).await.is_ok());
        ctx.cancel();
        assert_eq!(gate.wait(&ctx).await, Err(ContextError::Cancelled));
    }
}
