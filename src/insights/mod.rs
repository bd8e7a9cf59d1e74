// Metrics & recommendation aggregator
// Four independent analytics sources, each loaded into its own slot. A slot
// failing leaves its siblings alone.

use log::{debug, error, info};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::gateway::{
    CustomerInsightsPayload, Gateway, GatewayResult, KeywordAnalyticsPayload, KeywordStat,
    PerformanceMetricsPayload, RawMetric, RecommendationsPayload,
};
use crate::models::{DisplayUnit, MetricColor, MetricSample, PriorityBand, TimeWindow};

/// Lifecycle of one asynchronously loaded piece of state
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<T> {
    NotLoaded,
    LoadedEmpty,
    Loaded(T),
}

impl<T> Slot<T> {
    pub fn is_loaded(&self) -> bool {
        !matches!(self, Slot::NotLoaded)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Slot::Loaded(data) => Some(data),
            _ => None,
        }
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot::NotLoaded
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Performance,
    Keywords,
    Customers,
    Recommendations,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SlotKind::Performance => "performance metrics",
            SlotKind::Keywords => "keyword analytics",
            SlotKind::Customers => "customer insights",
            SlotKind::Recommendations => "recommendations",
        };
        f.write_str(name)
    }
}

/// Keyword fragments and the color a metric whose name contains them gets.
/// First match wins.
const METRIC_COLORS: &[(&str, MetricColor)] = &[
    ("response", MetricColor::Green),
    ("rating", MetricColor::Yellow),
    ("satisfaction", MetricColor::Yellow),
    ("view", MetricColor::Blue),
    ("conversion", MetricColor::Purple),
    ("inquir", MetricColor::Purple),
    ("contact", MetricColor::Orange),
];

pub fn metric_color(name: &str) -> MetricColor {
    let lower = name.to_lowercase();
    METRIC_COLORS
        .iter()
        .find(|(fragment, _)| lower.contains(fragment))
        .map(|(_, color)| *color)
        .unwrap_or(MetricColor::Gray)
}

impl MetricSample {
    pub fn from_raw(raw: RawMetric) -> Self {
        let unit = if raw.is_rating {
            DisplayUnit::Rating
        } else if matches!(raw.unit.as_deref().map(str::trim), Some("%") | Some("percent")) {
            DisplayUnit::Percent
        } else {
            DisplayUnit::None
        };
        let color = metric_color(&raw.name);
        MetricSample {
            name: raw.name,
            value: raw.value,
            target: raw.target,
            unit,
            color,
        }
    }

    pub fn display_value(&self) -> String {
        match self.unit {
            DisplayUnit::Percent => format!("{}%", trim_number(self.value)),
            DisplayUnit::Rating => format!("{}/5", trim_number(self.value)),
            DisplayUnit::None => trim_number(self.value),
        }
    }

    /// Progress toward target, clamped to [0, 1]. A zero target counts as met.
    pub fn progress(&self) -> f64 {
        if self.target <= 0.0 {
            return 1.0;
        }
        (self.value / self.target).clamp(0.0, 1.0)
    }
}

fn trim_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

impl PriorityBand {
    pub fn from_raw(priority: &str) -> PriorityBand {
        match priority.trim().to_lowercase().as_str() {
            "high" => PriorityBand::High,
            "medium" => PriorityBand::Medium,
            _ => PriorityBand::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendations {
    pub items: Vec<String>,
    pub priority: PriorityBand,
    pub generated_at: String,
    pub based_on: String,
}

/// Result of one analytics call, tagged with the slot it belongs to
#[derive(Debug)]
pub enum SlotResult {
    Performance(GatewayResult<PerformanceMetricsPayload>),
    Keywords(GatewayResult<KeywordAnalyticsPayload>),
    Customers(GatewayResult<CustomerInsightsPayload>),
    Recommendations(GatewayResult<RecommendationsPayload>),
}

impl SlotResult {
    pub fn kind(&self) -> SlotKind {
        match self {
            SlotResult::Performance(_) => SlotKind::Performance,
            SlotResult::Keywords(_) => SlotKind::Keywords,
            SlotResult::Customers(_) => SlotKind::Customers,
            SlotResult::Recommendations(_) => SlotKind::Recommendations,
        }
    }
}

/// A finished call from a refresh started by `start_refresh`.
#[derive(Debug)]
pub struct SlotUpdate {
    generation: u64,
    pub result: SlotResult,
}

fn spawn_slot<F>(tx: &mpsc::Sender<SlotUpdate>, generation: u64, fetch: F)
where
    F: Future<Output = SlotResult> + Send + 'static,
{
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = fetch.await;
        let kind = result.kind();
        if tx.send(SlotUpdate { generation, result }).await.is_err() {
            debug!("Nobody waiting for {}, dropping result", kind);
        }
    });
}

pub struct InsightsAggregator {
    gateway: Arc<dyn Gateway>,
    pub performance: Slot<Vec<MetricSample>>,
    pub keywords: Slot<KeywordAnalyticsPayload>,
    pub customers: Slot<CustomerInsightsPayload>,
    pub recommendations: Slot<Recommendations>,
    failed: Vec<SlotKind>,
    generation: u64,
}

impl InsightsAggregator {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            performance: Slot::NotLoaded,
            keywords: Slot::NotLoaded,
            customers: Slot::NotLoaded,
            recommendations: Slot::NotLoaded,
            failed: Vec::new(),
            generation: 0,
        }
    }

    /// Issue all four calls on their own tasks. Each result arrives on the
    /// returned channel as soon as its call finishes; hand it to `apply`.
    /// The aggregator does not need to stay borrowed while the calls run.
    pub fn start_refresh(&mut self, window: TimeWindow) -> mpsc::Receiver<SlotUpdate> {
        self.generation += 1;
        let generation = self.generation;
        let days = window.days();
        let (tx, rx) = mpsc::channel(4);

        let gateway = self.gateway.clone();
        spawn_slot(&tx, generation, async move {
            SlotResult::Performance(gateway.get_performance_metrics().await)
        });
        let gateway = self.gateway.clone();
        spawn_slot(&tx, generation, async move {
            SlotResult::Keywords(gateway.get_keyword_analytics(days).await)
        });
        let gateway = self.gateway.clone();
        spawn_slot(&tx, generation, async move {
            SlotResult::Customers(gateway.get_customer_insights(days).await)
        });
        let gateway = self.gateway.clone();
        spawn_slot(&tx, generation, async move {
            SlotResult::Recommendations(gateway.get_recommendations().await)
        });

        debug!("Insights refresh {} started for {}", generation, window.token());
        rx
    }

    /// Apply one finished call to its slot. Results from a refresh that a
    /// newer one replaced are dropped; returns whether it was applied.
    pub fn apply(&mut self, update: SlotUpdate) -> bool {
        if update.generation != self.generation {
            debug!("Dropping stale {} result", update.result.kind());
            return false;
        }
        match update.result {
            SlotResult::Performance(result) => self.apply_performance(result),
            SlotResult::Keywords(result) => self.apply_keywords(result),
            SlotResult::Customers(result) => self.apply_customers(result),
            SlotResult::Recommendations(result) => self.apply_recommendations(result),
        }
        true
    }

    /// Refresh all four slots, filling each one as its call returns.
    pub async fn refresh(&mut self, window: TimeWindow) {
        let mut updates = self.start_refresh(window);
        while let Some(update) = updates.recv().await {
            self.apply(update);
        }
        info!("Insights refreshed for {} ({} slot(s) failed)", window.token(), self.failed.len());
    }

    pub fn has_failed(&self, kind: SlotKind) -> bool {
        self.failed.contains(&kind)
    }

    fn record(&mut self, kind: SlotKind, ok: bool) {
        self.failed.retain(|k| *k != kind);
        if !ok {
            self.failed.push(kind);
        }
    }

    fn apply_performance(&mut self, result: GatewayResult<PerformanceMetricsPayload>) {
        match result {
            Ok(payload) => {
                let samples: Vec<MetricSample> = payload.metrics.into_iter().map(MetricSample::from_raw).collect();
                self.performance = if samples.is_empty() {
                    Slot::LoadedEmpty
                } else {
                    Slot::Loaded(samples)
                };
                self.record(SlotKind::Performance, true);
            }
            Err(e) => {
                error!("Failed to load {}: {}", SlotKind::Performance, e);
                self.performance = Slot::LoadedEmpty;
                self.record(SlotKind::Performance, false);
            }
        }
    }

    fn apply_keywords(&mut self, result: GatewayResult<KeywordAnalyticsPayload>) {
        match result {
            Ok(payload) => {
                self.keywords = if payload.keywords.is_empty() {
                    Slot::LoadedEmpty
                } else {
                    Slot::Loaded(payload)
                };
                self.record(SlotKind::Keywords, true);
            }
            Err(e) => {
                error!("Failed to load {}: {}", SlotKind::Keywords, e);
                self.keywords = Slot::LoadedEmpty;
                self.record(SlotKind::Keywords, false);
            }
        }
    }

    fn apply_customers(&mut self, result: GatewayResult<CustomerInsightsPayload>) {
        match result {
            Ok(payload) => {
                self.customers = if payload.is_empty() {
                    Slot::LoadedEmpty
                } else {
                    Slot::Loaded(payload)
                };
                self.record(SlotKind::Customers, true);
            }
            Err(e) => {
                error!("Failed to load {}: {}", SlotKind::Customers, e);
                self.customers = Slot::LoadedEmpty;
                self.record(SlotKind::Customers, false);
            }
        }
    }

    fn apply_recommendations(&mut self, result: GatewayResult<RecommendationsPayload>) {
        match result {
            Ok(payload) => {
                self.recommendations = if payload.recommendations.is_empty() {
                    Slot::LoadedEmpty
                } else {
                    Slot::Loaded(Recommendations {
                        priority: PriorityBand::from_raw(&payload.priority),
                        items: payload.recommendations,
                        generated_at: payload.generated_at,
                        based_on: payload.based_on,
                    })
                };
                self.record(SlotKind::Recommendations, true);
            }
            Err(e) => {
                error!("Failed to load {}: {}", SlotKind::Recommendations, e);
                self.recommendations = Slot::LoadedEmpty;
                self.record(SlotKind::Recommendations, false);
            }
        }
    }

    /// Searches for `keyword` relative to the busiest keyword in the current
    /// set. The maximum is taken from the set as it is now, on every call.
    pub fn keyword_share(&self, keyword: &str) -> Option<f64> {
        let keywords = &self.keywords.data()?.keywords;
        let stat = keywords.iter().find(|k| k.keyword == keyword)?;
        Some(share_of(stat, max_searches(keywords)))
    }

    pub fn keyword_shares(&self) -> Vec<(String, f64)> {
        let Some(payload) = self.keywords.data() else {
            return Vec::new();
        };
        let max = max_searches(&payload.keywords);
        payload
            .keywords
            .iter()
            .map(|k| (k.keyword.clone(), share_of(k, max)))
            .collect()
    }
}

fn max_searches(keywords: &[KeywordStat]) -> f64 {
    keywords.iter().map(|k| k.searches).fold(0.0, f64::max)
}

fn share_of(stat: &KeywordStat, max: f64) -> f64 {
    if max > 0.0 {
        stat.searches / max
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, unit: Option<&str>, is_rating: bool) -> RawMetric {
        RawMetric {
            name: name.to_string(),
            value: 4.5,
            target: 5.0,
            unit: unit.map(str::to_string),
            is_rating,
        }
    }

    #[test]
    fn test_metric_color_table() {
        assert_eq!(metric_color("Response Rate"), MetricColor::Green);
        assert_eq!(metric_color("Customer Rating"), MetricColor::Yellow);
        assert_eq!(metric_color("Profile Views"), MetricColor::Blue);
        assert_eq!(metric_color("Uptime"), MetricColor::Gray);
    }

    #[test]
    fn test_metric_units_and_display() {
        let rating = MetricSample::from_raw(raw("Customer Rating", None, true));
        assert_eq!(rating.unit, DisplayUnit::Rating);
        assert_eq!(rating.display_value(), "4.5/5");
        assert!((rating.progress() - 0.9).abs() < 1e-9);

        let mut percent = MetricSample::from_raw(raw("Response Rate", Some("%"), false));
        percent.value = 85.0;
        assert_eq!(percent.display_value(), "85%");
        assert_eq!(percent.progress(), 1.0);

        let plain = MetricSample::from_raw(raw("Orders", Some("count"), false));
        assert_eq!(plain.unit, DisplayUnit::None);
    }

    #[test]
    fn test_priority_bands() {
        assert_eq!(PriorityBand::from_raw("HIGH"), PriorityBand::High);
        assert_eq!(PriorityBand::from_raw("medium"), PriorityBand::Medium);
        assert_eq!(PriorityBand::from_raw("urgent"), PriorityBand::Low);
        assert_eq!(PriorityBand::from_raw(""), PriorityBand::Low);
    }

    #[test]
    fn test_slot_accessors() {
        let slot: Slot<Vec<u8>> = Slot::default();
        assert!(!slot.is_loaded());
        assert!(Slot::<Vec<u8>>::LoadedEmpty.is_loaded());
        assert_eq!(Slot::Loaded(vec![1u8]).data(), Some(&vec![1u8]));
    }
}
