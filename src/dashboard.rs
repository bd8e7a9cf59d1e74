// Parent composition of the three independent models

use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;

use crate::chart::{ChartPipeline, ChartView};
use crate::config::Config;
use crate::gateway::Gateway;
use crate::inbox::{InboxModel, UnreadNotifier};
use crate::insights::{InsightsAggregator, Slot};
use crate::models::{PriorityBand, SeriesName, TimeWindow};

pub struct Dashboard {
    pub inbox: InboxModel,
    pub charts: ChartPipeline,
    pub insights: InsightsAggregator,
}

impl Dashboard {
    pub fn new(gateway: Arc<dyn Gateway>, notifier: UnreadNotifier, config: &Config) -> Self {
        Self {
            inbox: InboxModel::with_notifier(gateway.clone(), notifier)
                .reconcile_on_mark_read_failure(config.reconcile_on_mark_read_failure),
            charts: ChartPipeline::new(gateway.clone()),
            insights: InsightsAggregator::new(gateway),
        }
    }

    /// Initial mount: inbox, one chart series and the insights run side by side.
    pub async fn load_all(&mut self, window: TimeWindow, series: SeriesName) {
        let (inbox, _chart, _) = tokio::join!(
            self.inbox.load(),
            self.charts.fetch_series(window, series),
            self.insights.refresh(window),
        );
        if let Err(e) = inbox {
            warn!("Dashboard mounted without inbox: {}", e);
        }
        info!("Dashboard loaded for {}", window.token());
    }

    pub fn summary(&self, series: SeriesName) -> DashboardSummary {
        let snapshot = self.inbox.snapshot();
        DashboardSummary {
            received: snapshot.received.len(),
            sent: snapshot.sent.len(),
            unread: snapshot.unread_count,
            average_response_time: snapshot.average_response_time.clone(),
            response_rate: snapshot.response_rate.clone(),
            series: series.as_str(),
            chart_state: match self.charts.view_state(series) {
                ChartView::Loading => "loading",
                ChartView::HasData => "data",
                ChartView::Empty => "empty",
            },
            heights: self.charts.heights(series),
            metrics: match &self.insights.performance {
                Slot::Loaded(samples) => samples.iter().map(|m| (m.name.clone(), m.display_value())).collect(),
                _ => Vec::new(),
            },
            top_keywords: self.insights.keyword_shares(),
            recommendation_priority: self.insights.recommendations.data().map(|r| r.priority),
        }
    }
}

/// Flat, printable view of the whole dashboard
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub received: usize,
    pub sent: usize,
    pub unread: usize,
    pub average_response_time: String,
    pub response_rate: String,
    pub series: &'static str,
    pub chart_state: &'static str,
    pub heights: Vec<f64>,
    pub metrics: Vec<(String, String)>,
    pub top_keywords: Vec<(String, f64)>,
    pub recommendation_priority: Option<PriorityBand>,
}
