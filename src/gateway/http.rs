// REST implementation of the gateway
// Issues authenticated JSON calls against the supplier API.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::{
    Ack, CustomerInsightsPayload, Gateway, GatewayError, GatewayResult, KeywordAnalyticsPayload,
    MarkReadRequest, PerformanceMetricsPayload, RawChartSeries, RawInbox, RecommendationsPayload,
    ReplyRequest, SendMessageRequest,
};
use crate::models::SeriesName;

/// Source of the bearer token. Session handling lives outside the dashboard,
/// this is only the hand-off point.
pub trait TokenStore: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// A token fixed at startup (from config or environment)
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: Option<String>) -> Self {
        StaticToken(token.filter(|t| !t.trim().is_empty()))
    }
}

impl TokenStore for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}

pub struct HttpGateway {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl HttpGateway {
    pub fn new(base_url: &str, tokens: Arc<dyn TokenStore>, timeout: Duration) -> GatewayResult<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(GatewayError::InvalidRequest(format!("Base URL must be http(s): '{}'", base_url)));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url, tokens })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request_id = Uuid::new_v4().to_string();
        debug!("{} {} (request {})", method, path, request_id);

        let mut builder = self
            .client
            .request(method, self.url(path))
            .header("X-Request-Id", request_id)
            .header("Accept", "application/json");
        if let Some(token) = self.tokens.token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder, path: &str) -> GatewayResult<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::Transport(format!("{}: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("{} failed with status {}", path, status);
            return Err(status_error(status, message));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Transport(format!("{}: {}", path, e)))?;
        decode_body(&bytes)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> GatewayResult<T> {
        let builder = self.request(Method::GET, path).query(query);
        self.execute(builder, path).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(&self, path: &str, body: &B) -> GatewayResult<T> {
        let builder = self.request(Method::POST, path).json(body);
        self.execute(builder, path).await
    }
}

fn status_error(status: StatusCode, body: String) -> GatewayError {
    // Prefer the API's own message field when the body is JSON
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(body);
    GatewayError::Status {
        status: status.as_u16(),
        message,
    }
}

/// Empty bodies decode as `{}`, so 204 responses still produce an ack.
fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> GatewayResult<T> {
    let trimmed = std::str::from_utf8(bytes).map(str::trim).unwrap_or("");
    let source = if trimmed.is_empty() { "{}" } else { trimmed };
    serde_json::from_str(source).map_err(|e| GatewayError::Decode(e.to_string()))
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn get_inbox(&self) -> GatewayResult<RawInbox> {
        self.get("supplier/inbox", &[]).await
    }

    async fn mark_as_read(&self, request: MarkReadRequest) -> GatewayResult<Ack> {
        self.post("supplier/inbox/read", &request).await
    }

    async fn reply_to_item(&self, request: ReplyRequest) -> GatewayResult<Ack> {
        self.post("supplier/inbox/reply", &request).await
    }

    async fn send_message(&self, request: SendMessageRequest) -> GatewayResult<Ack> {
        self.post("supplier/messages", &request).await
    }

    async fn get_chart_series(&self, window_days: u32, series: SeriesName) -> GatewayResult<RawChartSeries> {
        let query = [("days", window_days.to_string()), ("series", series.as_str().to_string())];
        self.get("supplier/analytics/chart", &query).await
    }

    async fn get_performance_metrics(&self) -> GatewayResult<PerformanceMetricsPayload> {
        self.get("supplier/analytics/performance", &[]).await
    }

    async fn get_keyword_analytics(&self, window_days: u32) -> GatewayResult<KeywordAnalyticsPayload> {
        self.get("supplier/analytics/keywords", &[("days", window_days.to_string())]).await
    }

    async fn get_customer_insights(&self, window_days: u32) -> GatewayResult<CustomerInsightsPayload> {
        self.get("supplier/analytics/customers", &[("days", window_days.to_string())]).await
    }

    async fn get_recommendations(&self) -> GatewayResult<RecommendationsPayload> {
        self.get("supplier/analytics/recommendations", &[]).await
    }
}
