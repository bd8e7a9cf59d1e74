// Remote data gateway
// The boundary the dashboard core talks to. Everything behind the trait is the
// authenticated REST API; the core only sees decoded payloads or a GatewayError.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::{MessageId, SeriesName};

pub mod http;
pub mod payloads;

pub use http::{HttpGateway, StaticToken, TokenStore};
pub use payloads::*;

/// Errors returned by gateway calls
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No response reached us
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status
    #[error("Server rejected request with status {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded
    #[error("Decoding error: {0}")]
    Decode(String),

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    pub fn is_transport(&self) -> bool {
        matches!(self, GatewayError::Transport(_))
    }
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Request body for marking an inbox item read
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkReadRequest {
    pub category: String,
    pub id: MessageId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyRequest {
    pub category: String,
    pub id: MessageId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendMessageRequest {
    #[serde(rename = "toEmail")]
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

/// Generic acknowledgement. Servers answer with anything from `{}` to a full
/// object; only success matters to the core.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

#[async_trait]
pub trait Gateway: Send + Sync {
    async fn get_inbox(&self) -> GatewayResult<RawInbox>;

    async fn mark_as_read(&self, request: MarkReadRequest) -> GatewayResult<Ack>;

    async fn reply_to_item(&self, request: ReplyRequest) -> GatewayResult<Ack>;

    async fn send_message(&self, request: SendMessageRequest) -> GatewayResult<Ack>;

    async fn get_chart_series(&self, window_days: u32, series: SeriesName) -> GatewayResult<RawChartSeries>;

    async fn get_performance_metrics(&self) -> GatewayResult<PerformanceMetricsPayload>;

    async fn get_keyword_analytics(&self, window_days: u32) -> GatewayResult<KeywordAnalyticsPayload>;

    async fn get_customer_insights(&self, window_days: u32) -> GatewayResult<CustomerInsightsPayload>;

    async fn get_recommendations(&self) -> GatewayResult<RecommendationsPayload>;
}

// Lenient field decoders shared by the payload types.

pub(crate) fn de_id<'de, D>(deserializer: D) -> Result<MessageId, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom(format!("invalid message id {}", n))),
        Value::String(s) => s
            .trim()
            .parse::<MessageId>()
            .map_err(|_| serde::de::Error::custom(format!("invalid message id '{}'", s))),
        other => Err(serde::de::Error::custom(format!("invalid message id {}", other))),
    }
}

/// Accepts numbers, numeric strings, or null/absent (0).
pub(crate) fn de_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(coerce_sample).unwrap_or(0.0))
}

/// Accepts strings or numbers and renders them for display.
pub(crate) fn de_display<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

/// Coerce a raw sample to a finite, non-negative number. Anything that is not
/// a number (or a numeric string) becomes 0.
pub fn coerce_sample(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() && n > 0.0 {
        n
    } else {
        0.0
    }
}
