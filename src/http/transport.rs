use std::sync::Arc;
use std::time::Instant;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::ClientError;
use super::stats::{ClientStats, StatsSnapshot};
use crate::config::{Config, ConfigError};
use crate::context::Context;
use crate::domain::ErrorResponse;

pub const USER_AGENT: &str = concat!("autopay-rust-sdk/", env!("CARGO_PKG_VERSION"));

/// JSON-over-HTTP transport to the payment API.
///
/// Cloning is cheap: clones share the connection pool and counters.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Arc<str>,
    stats: Arc<ClientStats>,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| ConfigError::InvalidHeader("Authorization"))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .pool_idle_timeout(config.idle_conn_timeout)
            .pool_max_idle_per_host(config.max_idle_conns_per_host)
            .danger_accept_invalid_certs(config.skip_tls_verify);

        if let Some(proxy_url) = &config.proxy_url {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: Arc::from(config.effective_base_url()),
            stats: Arc::new(ClientStats::default()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub async fn get<T>(
        &self,
        ctx: &Context,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let request = self.request(Method::GET, path).query(query);
        self.send(ctx, request, StatusCode::is_success).await
    }

    pub async fn post<B, T>(&self, ctx: &Context, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path).json(body);
        self.send(ctx, request, StatusCode::is_success).await
    }

    /// GET that only accepts `200 OK`
    pub async fn get_exact<T>(&self, ctx: &Context, path: &str) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let request = self.request(Method::GET, path);
        self.send(ctx, request, |status| *status == StatusCode::OK)
            .await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path))
    }

    async fn send<T>(
        &self,
        ctx: &Context,
        request: RequestBuilder,
        accept: fn(&StatusCode) -> bool,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let guard = self.stats.begin();
        let started = Instant::now();

        let (status, body) = ctx
            .run(async {
                let response = request.send().await?;
                let status = response.status();
                let body = response.bytes().await?;
                Ok::<_, ClientError>((status, body))
            })
            .await
            .map_err(ClientError::Interrupted)??;

        debug!(
            status = status.as_u16(),
            elapsed = ?started.elapsed(),
            bytes = body.len(),
            "Received response"
        );

        if !accept(&status) {
            let message = api_error_message(status, &body);
            warn!(status = status.as_u16(), %message, "API request failed");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let decoded = serde_json::from_slice(&body)?;
        guard.succeed();
        Ok(decoded)
    }
}

/// Prefer the server's error body; fall back to the status text
fn api_error_message(status: StatusCode, body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorResponse>(body) {
        Ok(err) if !err.message.is_empty() => err.message,
        _ => status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string(),
    }
}
