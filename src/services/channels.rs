use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::context::Context;
use crate::domain::channel::CompareRequest;
use crate::domain::{
    Amount, Channel, ChannelCode, ChannelList, ChannelQuery, ChannelStats, Comparison, Currency,
    DomainError, Recommendation, RecommendationRequest, StatisticsRequest,
};
use crate::http::{ClientError, HttpTransport};
use crate::ratelimit::SharedGate;

/// Payment channel lookup and comparison
#[derive(Debug, Clone)]
pub struct ChannelService {
    transport: HttpTransport,
    gate: SharedGate,
}

impl ChannelService {
    pub(crate) fn new(transport: HttpTransport, gate: SharedGate) -> Self {
        Self { transport, gate }
    }

    pub async fn list(
        &self,
        ctx: &Context,
        query: Option<&ChannelQuery>,
    ) -> Result<ChannelList, ClientError> {
        self.gate.wait(ctx).await?;

        let params = query.map(ChannelQuery::query_params).unwrap_or_default();
        let started = Instant::now();
        let mut list: ChannelList = self.transport.get(ctx, "/v1/channels", &params).await?;
        list.query_time = started.elapsed();
        debug!(count = list.channels.len(), "Listed channels");
        Ok(list)
    }

    pub async fn get(&self, ctx: &Context, code: &ChannelCode) -> Result<Channel, ClientError> {
        self.gate.wait(ctx).await?;
        self.transport
            .get(ctx, &format!("/v1/channels/{code}"), &[])
            .await
    }

    pub async fn active(
        &self,
        ctx: &Context,
        currency: Option<Currency>,
    ) -> Result<Vec<Channel>, ClientError> {
        self.gate.wait(ctx).await?;
        let params = currency_param(currency);
        self.transport.get(ctx, "/v1/channels/active", &params).await
    }

    /// Channels able to process `amount`
    pub async fn for_amount(
        &self,
        ctx: &Context,
        amount: Amount,
        currency: Option<Currency>,
    ) -> Result<Vec<Channel>, ClientError> {
        self.gate.wait(ctx).await?;
        let path = format!("/v1/channels/amount/{:.6}", amount.to_f64());
        let params = currency_param(currency);
        self.transport.get(ctx, &path, &params).await
    }

    pub async fn recommend(
        &self,
        ctx: &Context,
        req: &RecommendationRequest,
    ) -> Result<Recommendation, ClientError> {
        self.gate.wait(ctx).await?;
        let recommendation: Recommendation =
            self.transport.post(ctx, "/v1/channels/recommend", req).await?;
        info!(score = recommendation.score, risk_level = %recommendation.risk_level, "Channel recommendation received");
        Ok(recommendation)
    }

    pub async fn compare(
        &self,
        ctx: &Context,
        codes: &[ChannelCode],
        criteria: &[String],
    ) -> Result<Comparison, ClientError> {
        if codes.is_empty() {
            return Err(DomainError::EmptyChannelList.into());
        }
        self.gate.wait(ctx).await?;

        let body = CompareRequest {
            channels: codes,
            criteria,
        };
        let mut comparison: Comparison =
            self.transport.post(ctx, "/v1/channels/compare", &body).await?;
        comparison.generated_at = Some(Utc::now());
        Ok(comparison)
    }

    pub async fn stats(
        &self,
        ctx: &Context,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ChannelStats>, ClientError> {
        let window = StatisticsRequest::between(start, end);
        window.validate()?;
        self.gate.wait(ctx).await?;
        self.transport
            .get(ctx, "/v1/channels/stats", &window.query_params())
            .await
    }
}

fn currency_param(currency: Option<Currency>) -> Vec<(&'static str, String)> {
    currency
        .map(|c| vec![("currency", c.to_string())])
        .unwrap_or_default()
}
