// Common test utilities for integration tests
// A scripted in-memory gateway plus logging setup shared by every test file.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use log::LevelFilter;
use serde_json::{json, Value};
use tokio::sync::Barrier;

use supplier_dashboard::gateway::{
    Ack, CustomerInsightsPayload, Gateway, GatewayError, GatewayResult, KeywordAnalyticsPayload, MarkReadRequest,
    PerformanceMetricsPayload, RawChartSeries, RawInbox, RecommendationsPayload, ReplyRequest, SendMessageRequest,
};
use supplier_dashboard::models::SeriesName;

static INIT_LOGGER: Once = Once::new();

/// Set up the logger for the tests
pub fn setup_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();
    });
}

/// Every gateway call the mock saw, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetInbox,
    MarkRead(MarkReadRequest),
    Reply(ReplyRequest),
    Send(SendMessageRequest),
    Chart(u32, SeriesName),
    Performance,
    Keywords(u32),
    Customers(u32),
    Recommendations,
}

/// Operation names accepted by `MockGateway::fail`
pub const OPS: [&str; 9] = [
    "inbox",
    "mark_read",
    "reply",
    "send",
    "chart",
    "performance",
    "keywords",
    "customers",
    "recommendations",
];

#[derive(Default)]
pub struct MockGateway {
    inbox: Mutex<Value>,
    charts: Mutex<HashMap<SeriesName, Value>>,
    performance: Mutex<Value>,
    keywords: Mutex<Value>,
    customers: Mutex<Value>,
    recommendations: Mutex<Value>,
    failing: Mutex<HashSet<&'static str>>,
    hanging: Mutex<HashSet<&'static str>>,
    calls: Mutex<Vec<Call>>,
    analytics_barrier: Option<Arc<Barrier>>,
}

impl MockGateway {
    pub fn new() -> Self {
        let gateway = MockGateway::default();
        *gateway.inbox.lock().unwrap() = json!({"received": [], "sent": []});
        gateway
    }

    /// Every analytics call waits on a shared barrier sized for the four
    /// calls, so sequential issuing would never get past the first one.
    pub fn with_analytics_barrier() -> Self {
        MockGateway {
            analytics_barrier: Some(Arc::new(Barrier::new(4))),
            ..MockGateway::new()
        }
    }

    pub fn set_inbox(&self, payload: Value) {
        *self.inbox.lock().unwrap() = payload;
    }

    pub fn set_chart(&self, series: SeriesName, payload: Value) {
        self.charts.lock().unwrap().insert(series, payload);
    }

    pub fn set_performance(&self, payload: Value) {
        *self.performance.lock().unwrap() = payload;
    }

    pub fn set_keywords(&self, payload: Value) {
        *self.keywords.lock().unwrap() = payload;
    }

    pub fn set_customers(&self, payload: Value) {
        *self.customers.lock().unwrap() = payload;
    }

    pub fn set_recommendations(&self, payload: Value) {
        *self.recommendations.lock().unwrap() = payload;
    }

    pub fn fail(&self, op: &'static str) {
        assert!(OPS.contains(&op), "unknown op {}", op);
        self.failing.lock().unwrap().insert(op);
    }

    /// Calls to `op` never return
    pub fn hang(&self, op: &'static str) {
        assert!(OPS.contains(&op), "unknown op {}", op);
        self.hanging.lock().unwrap().insert(op);
    }

    pub fn recover(&self, op: &'static str) {
        self.failing.lock().unwrap().remove(op);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, op: &'static str) -> GatewayResult<()> {
        if self.failing.lock().unwrap().contains(op) {
            return Err(GatewayError::Status {
                status: 500,
                message: format!("{} failed", op),
            });
        }
        Ok(())
    }

    fn decode<T: serde::de::DeserializeOwned>(value: Value) -> GatewayResult<T> {
        let value = if value.is_null() { json!({}) } else { value };
        serde_json::from_value(value).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    async fn analytics_gate(&self, op: &'static str) {
        if let Some(barrier) = &self.analytics_barrier {
            barrier.wait().await;
        }
        let hang = self.hanging.lock().unwrap().contains(op);
        if hang {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn get_inbox(&self) -> GatewayResult<RawInbox> {
        self.record(Call::GetInbox);
        self.check("inbox")?;
        let payload = self.inbox.lock().unwrap().clone();
        Self::decode(payload)
    }

    async fn mark_as_read(&self, request: MarkReadRequest) -> GatewayResult<Ack> {
        self.record(Call::MarkRead(request));
        self.check("mark_read")?;
        Ok(Ack::default())
    }

    async fn reply_to_item(&self, request: ReplyRequest) -> GatewayResult<Ack> {
        self.record(Call::Reply(request));
        self.check("reply")?;
        Ok(Ack::default())
    }

    async fn send_message(&self, request: SendMessageRequest) -> GatewayResult<Ack> {
        self.record(Call::Send(request));
        self.check("send")?;
        Ok(Ack::default())
    }

    async fn get_chart_series(&self, window_days: u32, series: SeriesName) -> GatewayResult<RawChartSeries> {
        self.record(Call::Chart(window_days, series));
        self.check("chart")?;
        let payload = self.charts.lock().unwrap().get(&series).cloned().unwrap_or(Value::Null);
        Self::decode(payload)
    }

    async fn get_performance_metrics(&self) -> GatewayResult<PerformanceMetricsPayload> {
        self.record(Call::Performance);
        self.analytics_gate("performance").await;
        self.check("performance")?;
        let payload = self.performance.lock().unwrap().clone();
        Self::decode(payload)
    }

    async fn get_keyword_analytics(&self, window_days: u32) -> GatewayResult<KeywordAnalyticsPayload> {
        self.record(Call::Keywords(window_days));
        self.analytics_gate("keywords").await;
        self.check("keywords")?;
        let payload = self.keywords.lock().unwrap().clone();
        Self::decode(payload)
    }

    async fn get_customer_insights(&self, window_days: u32) -> GatewayResult<CustomerInsightsPayload> {
        self.record(Call::Customers(window_days));
        self.analytics_gate("customers").await;
        self.check("customers")?;
        let payload = self.customers.lock().unwrap().clone();
        Self::decode(payload)
    }

    async fn get_recommendations(&self) -> GatewayResult<RecommendationsPayload> {
        self.record(Call::Recommendations);
        self.analytics_gate("recommendations").await;
        self.check("recommendations")?;
        let payload = self.recommendations.lock().unwrap().clone();
        Self::decode(payload)
    }
}

/// A small inbox: two unread received, one read received, two sent.
/// Sent id 7 collides with nothing received; sent id 1 shares an id with a
/// received message.
pub fn sample_inbox() -> Value {
    json!({
        "received": [
            {"id": 1, "type": "supplier_to_supplier_inquiry", "senderName": "Acme Steel", "senderCompany": "Acme",
             "subject": "Bulk order", "message": "Can you quote 500 units?", "timeAgo": "2h", "isUnread": true,
             "senderEmail": "buyer@acme.test"},
            {"id": 2, "type": "supplier_rating", "senderName": "Platform", "subject": "New rating",
             "message": "You received 5 stars", "timeAgo": "1d", "isUnread": true},
            {"id": 3, "type": "supplier_rating", "senderName": "Platform", "subject": "Old rating",
             "message": "You received 4 stars", "timeAgo": "3d", "isUnread": false}
        ],
        "sent": [
            {"id": 1, "recipientName": "Bolt Ltd", "subject": "Re: pricing", "message": "Attached", "timeAgo": "5h"},
            {"id": 7, "recipientName": "Corp", "subject": "Catalogue", "message": "See catalogue", "timeAgo": "2d"}
        ],
        "unreadCount": 2,
        "avgResponseTime": "3h",
        "responseRate": "92%"
    })
}

/// Wrap the mock as the trait object the models expect
pub fn shared(gateway: &Arc<MockGateway>) -> Arc<dyn Gateway> {
    gateway.clone()
}
