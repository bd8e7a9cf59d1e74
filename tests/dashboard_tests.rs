mod common;

use std::sync::Arc;

use serde_json::json;
use supplier_dashboard::config::Config;
use supplier_dashboard::inbox::UnreadNotifier;
use supplier_dashboard::models::{SeriesName, TimeWindow};
use supplier_dashboard::Dashboard;

use common::{sample_inbox, setup_logging, shared, MockGateway};

#[tokio::test]
async fn test_load_all_and_summary() {
    setup_logging();
    let gateway = Arc::new(MockGateway::new());
    gateway.set_inbox(sample_inbox());
    gateway.set_chart(SeriesName::Inquiries, json!({"values": [0, 3]}));
    gateway.set_recommendations(json!({"recommendations": ["Add photos"], "priority": "medium"}));
    let mut dashboard = Dashboard::new(shared(&gateway), UnreadNotifier::new(), &Config::default());

    dashboard.load_all(TimeWindow::Week, SeriesName::Inquiries).await;
    let summary = dashboard.summary(SeriesName::Inquiries);

    assert_eq!(summary.received, 3);
    assert_eq!(summary.sent, 2);
    assert_eq!(summary.unread, 2);
    assert_eq!(summary.response_rate, "92%");
    assert_eq!(summary.chart_state, "data");
    assert_eq!(summary.heights, vec![1.0, 10.0]);
    assert!(summary.metrics.is_empty());

    let printed = serde_json::to_value(&summary).expect("summary serializes");
    assert_eq!(printed["recommendation_priority"], "medium");
}

#[tokio::test]
async fn test_inbox_failure_does_not_block_the_rest() {
    setup_logging();
    let gateway = Arc::new(MockGateway::new());
    gateway.fail("inbox");
    gateway.set_chart(SeriesName::Views, json!({"values": [1]}));
    let mut dashboard = Dashboard::new(shared(&gateway), UnreadNotifier::new(), &Config::default());

    dashboard.load_all(TimeWindow::Week, SeriesName::Views).await;
    assert!(!dashboard.inbox.is_loaded());
    assert_eq!(dashboard.summary(SeriesName::Views).chart_state, "data");
    assert!(dashboard.insights.performance.is_loaded());
}
