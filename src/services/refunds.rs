use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use crate::batch::{BatchDispatcher, BatchError, BatchExecutor, BatchSummary};
use crate::context::Context;
use crate::domain::{
    RefundCancelRequest, RefundCancelResponse, RefundQueryRequest, RefundQueryResponse,
    RefundRequest, RefundResponse, RefundStatistics, StatisticsRequest,
};
use crate::http::{ClientError, HttpTransport};
use crate::ratelimit::SharedGate;

/// Refund operations
#[derive(Debug, Clone)]
pub struct RefundService {
    transport: HttpTransport,
    gate: SharedGate,
    max_workers: usize,
}

impl RefundService {
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
        req: &RefundRequest,
    ) -> Result<RefundResponse, ClientError> {
        req.validate()?;
        self.gate.wait(ctx).await?;
        self.submit(ctx, req).await
    }

    pub async fn query(
        &self,
        ctx: &Context,
        req: &RefundQueryRequest,
    ) -> Result<RefundQueryResponse, ClientError> {
        req.validate()?;
        self.gate.wait(ctx).await?;

        let params = req.query_params();
        debug!(params = params.len(), "Querying refund");
        let mut resp: RefundQueryResponse =
            self.transport.get(ctx, "/v1/refunds/query", &params).await?;
        resp.query_time = Some(Utc::now());
        Ok(resp)
    }

    pub async fn cancel(
        &self,
        ctx: &Context,
        req: &RefundCancelRequest,
    ) -> Result<RefundCancelResponse, ClientError> {
        req.validate()?;
        self.gate.wait(ctx).await?;

        let resp: RefundCancelResponse = self.transport.post(ctx, "/v1/refunds/cancel", req).await?;
        info!(out_refund_no = %req.out_refund_no, refund_no = %req.refund_no, success = resp.success, "Refund cancel processed");
        Ok(resp)
    }

    pub async fn statistics(
        &self,
        ctx: &Context,
        req: &StatisticsRequest,
    ) -> Result<RefundStatistics, ClientError> {
        req.validate()?;
        self.gate.wait(ctx).await?;

        let started = Instant::now();
        let mut stats: RefundStatistics = self
            .transport
            .get(ctx, "/v1/refunds/statistics", &req.query_params())
            .await?;
        stats.query_time = started.elapsed();
        Ok(stats)
    }

    pub async fn batch_create(
        &self,
        ctx: &Context,
        requests: Vec<RefundRequest>,
        max_workers: usize,
    ) -> Result<BatchSummary<RefundResponse>, BatchError> {
        BatchDispatcher::new(Arc::new(self.clone()), self.gate.clone())
            .with_default_concurrency(self.max_workers)
            .dispatch(ctx, requests, max_workers)
            .await
    }

    async fn submit(&self, ctx: &Context, req: &RefundRequest) -> Result<RefundResponse, ClientError> {
        let body = match req.timeout {
            Some(_) => Cow::Borrowed(req),
            None => Cow::Owned(req.clone().with_timeout(RefundRequest::DEFAULT_TIMEOUT)),
        };

        let started = Instant::now();
        let resp: RefundResponse = self.transport.post(ctx, "/v1/refunds", body.as_ref()).await?;
        info!(
            reference = %req.reference(),
            refund_amount = %req.refund_amount,
            duration = ?started.elapsed(),
            "Refund created"
        );
        Ok(resp)
    }
}

#[async_trait]
impl BatchExecutor for RefundService {
    type Item = RefundRequest;
    type Response = RefundResponse;
    type Error = ClientError;

    fn validate(&self, item: &RefundRequest) -> Result<(), ClientError> {
        Ok(item.validate()?)
    }

    async fn execute(&self, ctx: &Context, item: &RefundRequest) -> Result<RefundResponse, ClientError> {
        self.submit(ctx, item).await
    }
}
