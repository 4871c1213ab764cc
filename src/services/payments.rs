use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use crate::batch::{BatchDispatcher, BatchError, BatchExecutor, BatchSummary};
use crate::context::Context;
use crate::domain::{
    PaymentCancelRequest, PaymentCancelResponse, PaymentQueryRequest, PaymentQueryResponse,
    PaymentRequest, PaymentResponse, PaymentStatistics, StatisticsRequest,
};
use crate::http::{ClientError, HttpTransport};
use crate::ratelimit::SharedGate;

/// Payment order operations
#[derive(Debug, Clone)]
pub struct PaymentService {
    transport: HttpTransport,
    gate: SharedGate,
    max_workers: usize,
}

impl PaymentService {
    pub(crate) fn new(transport: HttpTransport, gate: SharedGate, max_workers: usize) -> Self {
        Self {
            transport,
            gate,
            max_workers,
        }
    }

    pub async fn create(
        &self,
        ctx: &Context,
        req: &PaymentRequest,
    ) -> Result<PaymentResponse, ClientError> {
        req.validate()?;
        self.gate.wait(ctx).await?;
        self.submit(ctx, req).await
    }

    pub async fn query(
        &self,
        ctx: &Context,
        req: &PaymentQueryRequest,
    ) -> Result<PaymentQueryResponse, ClientError> {
        req.validate()?;
        self.gate.wait(ctx).await?;

        debug!(out_trade_no = %req.out_trade_no, trade_no = %req.trade_no, "Querying payment");
        let mut resp: PaymentQueryResponse = self
            .transport
            .get(ctx, "/v1/payments/query", &req.query_params())
            .await?;
        resp.query_time = Some(Utc::now());
        Ok(resp)
    }

    pub async fn cancel(
        &self,
        ctx: &Context,
        req: &PaymentCancelRequest,
    ) -> Result<PaymentCancelResponse, ClientError> {
        req.validate()?;
        self.gate.wait(ctx).await?;

        let resp: PaymentCancelResponse = self.transport.post(ctx, "/v1/payments/cancel", req).await?;
        info!(out_trade_no = %req.out_trade_no, trade_no = %req.trade_no, success = resp.success, "Payment cancel processed");
        Ok(resp)
    }

    pub async fn statistics(
        &self,
        ctx: &Context,
        req: &StatisticsRequest,
    ) -> Result<PaymentStatistics, ClientError> {
        req.validate()?;
        self.gate.wait(ctx).await?;

        let started = Instant::now();
        let mut stats: PaymentStatistics = self
            .transport
            .get(ctx, "/v1/payments/statistics", &req.query_params())
            .await?;
        stats.query_time = started.elapsed();
        Ok(stats)
    }

    /// Create every payment concurrently, at most `max_workers` in flight
    /// (0 uses the configured default).
    pub async fn batch_create(
        &self,
        ctx: &Context,
        requests: Vec<PaymentRequest>,
        max_workers: usize,
    ) -> Result<BatchSummary<PaymentResponse>, BatchError> {
        BatchDispatcher::new(Arc::new(self.clone()), self.gate.clone())
            .with_default_concurrency(self.max_workers)
            .dispatch(ctx, requests, max_workers)
            .await
    }

    /// The network call alone; callers have validated and passed the gate
    async fn submit(
        &self,
        ctx: &Context,
        req: &PaymentRequest,
    ) -> Result<PaymentResponse, ClientError> {
        let body = match req.timeout {
            Some(_) => Cow::Borrowed(req),
            None => Cow::Owned(req.clone().with_timeout(PaymentRequest::DEFAULT_TIMEOUT)),
        };

        let started = Instant::now();
        let resp: PaymentResponse = self.transport.post(ctx, "/v1/payments", body.as_ref()).await?;
        info!(
            out_trade_no = %req.out_trade_no,
            amount = %req.total_amount,
            duration = ?started.elapsed(),
            "Payment created"
        );
        Ok(resp)
    }
}

#[async_trait]
impl BatchExecutor for PaymentService {
    type Item = PaymentRequest;
    type Response = PaymentResponse;
    type Error = ClientError;

    fn validate(&self, item: &PaymentRequest) -> Result<(), ClientError> {
        Ok(item.validate()?)
    }

    async fn execute(
        &self,
        ctx: &Context,
        item: &PaymentRequest,
    ) -> Result<PaymentResponse, ClientError> {
        self.submit(ctx, item).await
    }
}
