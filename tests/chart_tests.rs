mod common;

use std::sync::Arc;

use serde_json::json;
use supplier_dashboard::chart::{height_percent, ChartPipeline, ChartView};
use supplier_dashboard::models::{SeriesName, TimeWindow};

use common::{setup_logging, shared, Call, MockGateway};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 0.01
}

#[tokio::test]
async fn test_views_for_a_week() {
    setup_logging();
    let gateway = Arc::new(MockGateway::new());
    gateway.set_chart(SeriesName::Views, json!({"values": [0, 0, 5]}));
    let mut charts = ChartPipeline::new(shared(&gateway));

    let view = charts.fetch_series(TimeWindow::Week, SeriesName::Views).await;
    assert_eq!(view, ChartView::HasData);

    let heights = charts.heights(SeriesName::Views);
    assert_eq!(heights.len(), 3);
    assert_eq!(heights[0], 1.0);
    assert_eq!(heights[1], 1.0);
    assert!(approx(heights[2], 12.92), "got {}", heights[2]);
    assert_eq!(gateway.calls(), vec![Call::Chart(7, SeriesName::Views)]);
}

#[tokio::test]
async fn test_heights_are_bounded_and_monotonic() {
    setup_logging();
    let gateway = Arc::new(MockGateway::new());
    gateway.set_chart(
        SeriesName::Contacts,
        json!({"values": [0, 1, 3, "10", 100, 1000000000, -4, "n/a", null]}),
    );
    let mut charts = ChartPipeline::new(shared(&gateway));
    charts.fetch_series(TimeWindow::Month, SeriesName::Contacts).await;

    let heights = charts.heights(SeriesName::Contacts);
    assert_eq!(heights.len(), 9);
    assert!(heights.iter().all(|h| (1.0..=100.0).contains(h)));
    assert!(heights[1] >= 2.0);
    assert!(heights[0] <= heights[1] && heights[1] <= heights[2] && heights[2] <= heights[3]);
    assert_eq!(heights[5], 100.0);
    // Negative and non-numeric samples count as zero
    assert_eq!(&heights[6..], &[1.0, 1.0, 1.0]);
    assert!(approx(height_percent(10.0), heights[3]));
}

#[tokio::test]
async fn test_cached_series_is_not_refetched() {
    setup_logging();
    let gateway = Arc::new(MockGateway::new());
    gateway.set_chart(SeriesName::Views, json!({"values": [1, 2]}));
    gateway.set_chart(SeriesName::Inquiries, json!({"values": [3]}));
    let mut charts = ChartPipeline::new(shared(&gateway));

    charts.fetch_series(TimeWindow::Week, SeriesName::Views).await;
    charts.fetch_series(TimeWindow::Week, SeriesName::Inquiries).await;
    charts.fetch_series(TimeWindow::Week, SeriesName::Views).await;

    assert_eq!(gateway.count(|c| matches!(c, Call::Chart(_, _))), 2);
    assert_eq!(charts.view_state(SeriesName::Views), ChartView::HasData);
}

#[tokio::test]
async fn test_window_change_refetches() {
    setup_logging();
    let gateway = Arc::new(MockGateway::new());
    gateway.set_chart(SeriesName::Views, json!({"values": [1, 2, 3]}));
    let mut charts = ChartPipeline::new(shared(&gateway));

    charts.fetch_series(TimeWindow::Week, SeriesName::Views).await;
    charts.fetch_series_for_token("90days", SeriesName::Views).await;

    assert_eq!(
        gateway.calls(),
        vec![Call::Chart(7, SeriesName::Views), Call::Chart(90, SeriesName::Views)]
    );
    assert_eq!(charts.window_of(SeriesName::Views), Some(TimeWindow::Quarter));
}

#[tokio::test]
async fn test_unknown_window_token_uses_default() {
    setup_logging();
    let gateway = Arc::new(MockGateway::new());
    let mut charts = ChartPipeline::new(shared(&gateway));

    charts.fetch_series_for_token("yesterday", SeriesName::Views).await;
    assert_eq!(gateway.calls(), vec![Call::Chart(7, SeriesName::Views)]);
}

#[tokio::test]
async fn test_failed_fetch_shows_empty() {
    setup_logging();
    let gateway = Arc::new(MockGateway::new());
    gateway.set_chart(SeriesName::Views, json!({"values": [5, 6]}));
    let mut charts = ChartPipeline::new(shared(&gateway));
    charts.fetch_series(TimeWindow::Week, SeriesName::Views).await;
    assert_eq!(charts.view_state(SeriesName::Views), ChartView::HasData);

    gateway.fail("chart");
    let view = charts.fetch_series(TimeWindow::Month, SeriesName::Views).await;
    assert_eq!(view, ChartView::Empty);
    assert!(charts.heights(SeriesName::Views).is_empty());
    assert!(charts.last_error(SeriesName::Views).is_some());

    // Invalidate drops the failure and lets a retry through
    gateway.recover("chart");
    charts.invalidate();
    let view = charts.fetch_series(TimeWindow::Month, SeriesName::Views).await;
    assert_eq!(view, ChartView::HasData);
    assert!(charts.last_error(SeriesName::Views).is_none());
}

#[tokio::test]
async fn test_empty_payload_is_empty_not_loading() {
    setup_logging();
    let gateway = Arc::new(MockGateway::new());
    let mut charts = ChartPipeline::new(shared(&gateway));

    assert_eq!(charts.view_state(SeriesName::Contacts), ChartView::Loading);
    let view = charts.fetch_series(TimeWindow::Week, SeriesName::Contacts).await;
    assert_eq!(view, ChartView::Empty);
}

#[tokio::test]
async fn test_stale_completion_is_dropped() {
    setup_logging();
    let gateway = Arc::new(MockGateway::new());
    gateway.set_chart(SeriesName::Views, json!({"values": [1, 1, 1]}));
    let mut charts = ChartPipeline::new(shared(&gateway));

    let week = charts.begin_fetch(TimeWindow::Week, SeriesName::Views).expect("first fetch starts");
    assert!(charts.begin_fetch(TimeWindow::Week, SeriesName::Views).is_none());
    assert_eq!(charts.view_state(SeriesName::Views), ChartView::Loading);

    let month = charts.begin_fetch(TimeWindow::Month, SeriesName::Views).expect("window change starts");

    let gw = charts.gateway();
    let month_outcome = month.run(gw.as_ref()).await;
    gateway.set_chart(SeriesName::Views, json!({"values": [9]}));
    let week_outcome = week.run(gw.as_ref()).await;

    assert!(charts.complete(month_outcome));
    assert!(!charts.complete(week_outcome));
    assert_eq!(charts.window_of(SeriesName::Views), Some(TimeWindow::Month));
    assert_eq!(charts.heights(SeriesName::Views).len(), 3);
}

#[tokio::test]
async fn test_bars_use_matching_labels_only() {
    setup_logging();
    let gateway = Arc::new(MockGateway::new());
    gateway.set_chart(SeriesName::Views, json!({"values": [1, 2], "labels": ["Mon", "Tue"]}));
    gateway.set_chart(SeriesName::Contacts, json!({"values": [1, 2], "labels": ["Mon"]}));
    let mut charts = ChartPipeline::new(shared(&gateway));
    charts.fetch_series(TimeWindow::Week, SeriesName::Views).await;
    charts.fetch_series(TimeWindow::Week, SeriesName::Contacts).await;

    let labels: Vec<String> = charts.bars(SeriesName::Views).into_iter().map(|b| b.label).collect();
    assert_eq!(labels, vec!["Mon", "Tue"]);
    let labels: Vec<String> = charts.bars(SeriesName::Contacts).into_iter().map(|b| b.label).collect();
    assert_eq!(labels, vec!["1", "2"]);
}

#[tokio::test]
async fn test_failed_series_is_fetched_again_for_same_window() {
    setup_logging();
    let gateway = Arc::new(MockGateway::new());
    gateway.set_chart(SeriesName::Views, json!({"values": [2, 4]}));
    gateway.fail("chart");
    let mut charts = ChartPipeline::new(shared(&gateway));

    let view = charts.fetch_series(TimeWindow::Week, SeriesName::Views).await;
    assert_eq!(view, ChartView::Empty);

    gateway.recover("chart");
    let view = charts.fetch_series(TimeWindow::Week, SeriesName::Views).await;
    assert_eq!(view, ChartView::HasData);
    assert!(charts.last_error(SeriesName::Views).is_none());
    assert_eq!(gateway.count(|c| matches!(c, Call::Chart(7, SeriesName::Views))), 2);

    // Once loaded it is cached again
    charts.fetch_series(TimeWindow::Week, SeriesName::Views).await;
    assert_eq!(gateway.count(|c| matches!(c, Call::Chart(_, _))), 2);
}
