use std::fmt;

use tracing::{debug, info};

use crate::batch::{BatchError, BatchSummary};
use crate::config::Config;
use crate::context::Context;
use crate::domain::{HealthResponse, PaymentRequest, PaymentResponse, RefundRequest, RefundResponse};
use crate::http::{ClientError, HttpTransport, StatsSnapshot};
use crate::ratelimit::{RateGate, SharedGate};
use crate::services::{ChannelService, PaymentService, RefundService};

/// A batch of homogeneous requests for [`AutoPayClient::batch_process`]
#[derive(Debug, Clone)]
pub enum BatchRequest {
    Payments(Vec<PaymentRequest>),
    Refunds(Vec<RefundRequest>),
}

impl BatchRequest {
    pub fn len(&self) -> usize {
        match self {
            Self::Payments(items) => items.len(),
            Self::Refunds(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Summary matching the variant of the submitted [`BatchRequest`]
#[derive(Debug, Clone)]
pub enum BatchResult {
    Payments(BatchSummary<PaymentResponse>),
    Refunds(BatchSummary<RefundResponse>),
}

/// Entry point to the payment API.
///
/// Every service handed out by one client shares its connection pool,
/// request counters and a single rate gate, so the configured rate bounds
/// the client as a whole.
pub struct AutoPayClient {
    config: Config,
    transport: HttpTransport,
    gate: SharedGate,
}

impl fmt::Debug for AutoPayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoPayClient")
            .field("base_url", &self.transport.base_url())
            .field("environment", &self.config.environment)
            .field("gate", &self.gate)
            .finish()
    }
}

impl AutoPayClient {
    pub fn new(config: Config) -> Result<Self, ClientError> {
        config.validate()?;
        let (rate, burst) = config.rate_quota()?;
        let transport = HttpTransport::new(&config)?;

        info!(
            base_url = transport.base_url(),
            environment = %config.environment,
            rate = rate.get(),
            burst = burst.get(),
            "AutoPay client initialised"
        );

        Ok(Self {
            config,
            transport,
            gate: RateGate::shared(rate, burst),
        })
    }

    pub fn sandbox(
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Self::new(Config::sandbox(api_key, secret_key))
    }

    pub fn production(
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Self::new(Config::production(api_key, secret_key))
    }

    pub fn payments(&self) -> PaymentService {
        PaymentService::new(
            self.transport.clone(),
            self.gate.clone(),
            self.config.max_workers,
        )
    }

    pub fn refunds(&self) -> RefundService {
        RefundService::new(
            self.transport.clone(),
            self.gate.clone(),
            self.config.max_workers,
        )
    }

    pub fn channels(&self) -> ChannelService {
        ChannelService::new(self.transport.clone(), self.gate.clone())
    }

    /// Probe `/v1/health`; anything but `200 OK` is an error
    pub async fn health_check(&self, ctx: &Context) -> Result<HealthResponse, ClientError> {
        debug!("Running health check");
        self.transport.get_exact(ctx, "/v1/health").await
    }

    /// Dispatch a payment or refund batch; `max_workers` of 0 uses the configured default
    pub async fn batch_process(
        &self,
        ctx: &Context,
        request: BatchRequest,
        max_workers: usize,
    ) -> Result<BatchResult, BatchError> {
        match request {
            BatchRequest::Payments(items) => self
                .payments()
                .batch_create(ctx, items, max_workers)
                .await
                .map(BatchResult::Payments),
            BatchRequest::Refunds(items) => self
                .refunds()
                .batch_create(ctx, items, max_workers)
                .await
                .map(BatchResult::Refunds),
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.transport.stats()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Release the client; pooled connections close once every service clone is gone
    pub fn close(self) {
        debug!(stats = ?self.stats(), "Closing AutoPay client");
    }
}
