// Raw payloads as the REST API returns them. Decoding is lenient: the API is
// not strict about numbers vs numeric strings, and optional fields go missing.

use serde::Deserialize;
use serde_json::Value;

use super::{de_display, de_id, de_number};
use crate::models::MessageId;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawInbox {
    #[serde(alias = "receivedRaw", alias = "inbox")]
    pub received: Vec<RawInboundRecord>,
    #[serde(alias = "sentRaw", alias = "outbox")]
    pub sent: Vec<RawOutboundRecord>,
    #[serde(alias = "unread_count")]
    pub unread_count: Option<u64>,
    #[serde(alias = "avg_response_time", alias = "averageResponseTime", deserialize_with = "de_display")]
    pub avg_response_time: String,
    #[serde(alias = "response_rate", deserialize_with = "de_display")]
    pub response_rate: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInboundRecord {
    #[serde(deserialize_with = "de_id")]
    pub id: MessageId,
    /// Server-side type tag, mapped to a UI category by the inbox model.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(alias = "sender_name", alias = "fromName", default)]
    pub sender_name: String,
    #[serde(alias = "sender_company", alias = "senderOrg", default)]
    pub sender_company: Option<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(alias = "body", alias = "content", default)]
    pub message: String,
    #[serde(alias = "time_ago", alias = "relativeTime", default)]
    pub time_ago: String,
    #[serde(alias = "is_unread", alias = "unread", default)]
    pub is_unread: Option<bool>,
    #[serde(alias = "is_read", alias = "read", default)]
    pub is_read: Option<bool>,
    #[serde(alias = "sender_email", alias = "email", default)]
    pub sender_email: Option<String>,
    #[serde(alias = "sender_phone", alias = "phone", default)]
    pub sender_phone: Option<String>,
}

impl RawInboundRecord {
    /// An explicit unread flag wins; otherwise unread is the negation of read.
    /// A record carrying neither is treated as read.
    pub fn unread(&self) -> bool {
        match (self.is_unread, self.is_read) {
            (Some(unread), _) => unread,
            (None, Some(read)) => !read,
            (None, None) => false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOutboundRecord {
    #[serde(deserialize_with = "de_id")]
    pub id: MessageId,
    #[serde(alias = "recipient_name", alias = "toName", default)]
    pub recipient_name: String,
    #[serde(alias = "recipient_company", alias = "recipientOrg", default)]
    pub recipient_company: Option<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(alias = "body", alias = "content", default)]
    pub message: String,
    #[serde(alias = "time_ago", alias = "relativeTime", default)]
    pub time_ago: String,
    #[serde(alias = "recipient_email", alias = "email", default)]
    pub recipient_email: Option<String>,
    #[serde(alias = "recipient_phone", alias = "phone", default)]
    pub recipient_phone: Option<String>,
}

/// Samples stay as raw JSON values; the chart pipeline coerces them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawChartSeries {
    #[serde(alias = "data")]
    pub values: Vec<Value>,
    pub labels: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PerformanceMetricsPayload {
    pub metrics: Vec<RawMetric>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetric {
    pub name: String,
    #[serde(default, deserialize_with = "de_number")]
    pub value: f64,
    #[serde(default, deserialize_with = "de_number")]
    pub target: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(alias = "is_rating", default)]
    pub is_rating: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KeywordAnalyticsPayload {
    pub keywords: Vec<KeywordStat>,
    #[serde(alias = "total_searches", deserialize_with = "de_number")]
    pub total_searches: f64,
    #[serde(alias = "average_change", deserialize_with = "de_display")]
    pub average_change: String,
    #[serde(deserialize_with = "de_display")]
    pub period: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordStat {
    pub keyword: String,
    #[serde(default, deserialize_with = "de_number")]
    pub searches: f64,
    #[serde(default, deserialize_with = "de_display")]
    pub change: String,
    #[serde(default, deserialize_with = "de_number")]
    pub contacts: f64,
    #[serde(alias = "last_searched_at", default)]
    pub last_searched_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomerInsightsPayload {
    pub demographics: Vec<Demographic>,
    #[serde(alias = "top_locations")]
    pub top_locations: Vec<LocationStat>,
    #[serde(alias = "total_visitors", deserialize_with = "de_number")]
    pub total_visitors: f64,
    #[serde(alias = "total_customers", deserialize_with = "de_number")]
    pub total_customers: f64,
    #[serde(deserialize_with = "de_display")]
    pub period: String,
}

impl CustomerInsightsPayload {
    pub fn is_empty(&self) -> bool {
        self.demographics.is_empty() && self.top_locations.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Demographic {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "de_number")]
    pub percentage: f64,
    #[serde(default, deserialize_with = "de_number")]
    pub count: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocationStat {
    pub city: String,
    #[serde(default, deserialize_with = "de_number")]
    pub visitors: f64,
    #[serde(default, deserialize_with = "de_number")]
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecommendationsPayload {
    pub recommendations: Vec<String>,
    #[serde(deserialize_with = "de_display")]
    pub priority: String,
    #[serde(alias = "generated_at", deserialize_with = "de_display")]
    pub generated_at: String,
    #[serde(alias = "based_on", deserialize_with = "de_display")]
    pub based_on: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inbox_payload_decodes_mixed_shapes() {
        let raw: RawInbox = serde_json::from_value(json!({
            "received": [
                {"id": "12", "type": "supplier_rating", "sender_name": "Acme", "message": "Great", "is_read": false},
                {"id": 13, "senderName": "Bolt", "isUnread": false}
            ],
            "sent": [{"id": 12, "recipientName": "Corp", "subject": "Re: quote"}],
            "unreadCount": 1,
            "avgResponseTime": "2h",
            "responseRate": 95
        }))
        .unwrap();

        assert_eq!(raw.received.len(), 2);
        assert_eq!(raw.received[0].id, 12);
        assert!(raw.received[0].unread());
        assert!(!raw.received[1].unread());
        assert_eq!(raw.sent[0].recipient_name, "Corp");
        assert_eq!(raw.response_rate, "95");
        assert_eq!(raw.avg_response_time, "2h");
    }

    #[test]
    fn test_missing_numbers_default_to_zero() {
        let raw: KeywordAnalyticsPayload = serde_json::from_value(json!({
            "keywords": [{"keyword": "steel", "searches": null}, {"keyword": "pipe", "searches": "40"}]
        }))
        .unwrap();
        assert_eq!(raw.keywords[0].searches, 0.0);
        assert_eq!(raw.keywords[1].searches, 40.0);
        assert_eq!(raw.total_searches, 0.0);
    }
}
