// Chart normalization pipeline
// Turns raw per-day counts into bar heights. Heights use log2 compression so a
// rare spike does not flatten the common small counts next to it.

use log::{debug, error, info, warn};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;

use crate::gateway::{coerce_sample, Gateway, GatewayResult, RawChartSeries};
use crate::models::{ChartSeries, SeriesName, TimeWindow};

/// Multiplier applied to log2(v + 1)
pub const SCALE_FACTOR: f64 = 5.0;
/// Height of a zero sample, so empty periods stay visible
pub const ZERO_HEIGHT: f64 = 1.0;
/// Floor for any positive sample
pub const MIN_POSITIVE_HEIGHT: f64 = 2.0;
pub const MAX_HEIGHT: f64 = 100.0;

/// Bar height, in percent of the track, for a single sample.
pub fn height_percent(sample: f64) -> f64 {
    if !(sample.is_finite() && sample > 0.0) {
        return ZERO_HEIGHT;
    }
    ((sample + 1.0).log2() * SCALE_FACTOR)
        .min(MAX_HEIGHT)
        .max(MIN_POSITIVE_HEIGHT)
}

/// Coerce samples and settle labels. Server labels are used as given when
/// they line up with the samples, otherwise bars get 1-based positions.
pub fn normalize(raw: RawChartSeries) -> ChartSeries {
    let values: Vec<f64> = raw.values.iter().map(coerce_sample).collect();
    let labels = match raw.labels {
        Some(labels) if labels.len() == values.len() => labels,
        Some(labels) => {
            warn!(
                "Chart labels ({}) do not match samples ({}), using positions",
                labels.len(),
                values.len()
            );
            positional_labels(values.len())
        }
        None => positional_labels(values.len()),
    };
    ChartSeries { values, labels }
}

fn positional_labels(len: usize) -> Vec<String> {
    (1..=len).map(|i| i.to_string()).collect()
}

/// Random placeholder heights for skeleton bars while a series loads
pub fn skeleton_heights(count: usize) -> Vec<f64> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| rng.gen_range(20.0..80.0)).collect()
}

/// What the view should show for a series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartView {
    Loading,
    HasData,
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartBar {
    pub label: String,
    pub value: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
enum SeriesState {
    Loading,
    Loaded(ChartSeries),
}

#[derive(Debug, Clone)]
struct CachedSeries {
    window: TimeWindow,
    generation: u64,
    state: SeriesState,
}

/// An in-flight fetch. Produced by `begin_fetch`, handed back to `complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub series: SeriesName,
    pub window: TimeWindow,
    generation: u64,
}

impl FetchTicket {
    /// Perform the gateway call. Needs no access to the pipeline, so callers
    /// can run it without holding a lock on it.
    pub async fn run(self, gateway: &dyn Gateway) -> FetchOutcome {
        let result = gateway.get_chart_series(self.window.days(), self.series).await;
        FetchOutcome { ticket: self, result }
    }
}

pub struct FetchOutcome {
    pub ticket: FetchTicket,
    pub result: GatewayResult<RawChartSeries>,
}

pub struct ChartPipeline {
    gateway: Arc<dyn Gateway>,
    cache: HashMap<SeriesName, CachedSeries>,
    last_errors: HashMap<SeriesName, String>,
    next_generation: u64,
}

impl ChartPipeline {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            cache: HashMap::new(),
            last_errors: HashMap::new(),
            next_generation: 0,
        }
    }

    pub fn gateway(&self) -> Arc<dyn Gateway> {
        self.gateway.clone()
    }

    /// Start fetching `series` for `window`. Returns `None` when the series is
    /// already cached, or already in flight, for that window. A series whose
    /// last fetch failed is never cached and is requested again.
    pub fn begin_fetch(&mut self, window: TimeWindow, series: SeriesName) -> Option<FetchTicket> {
        if let Some(entry) = self.cache.get(&series) {
            let failed = self.last_errors.contains_key(&series);
            if entry.window == window {
                match entry.state {
                    SeriesState::Loading => {
                        debug!("Series {} for {} already loading", series.as_str(), window.token());
                        return None;
                    }
                    SeriesState::Loaded(_) if !failed => {
                        debug!("Series {} for {} already cached", series.as_str(), window.token());
                        return None;
                    }
                    SeriesState::Loaded(_) => {
                        info!("Retrying {} for {} after failure", series.as_str(), window.token());
                    }
                }
            }
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        self.cache.insert(
            series,
            CachedSeries {
                window,
                generation,
                state: SeriesState::Loading,
            },
        );
        Some(FetchTicket {
            series,
            window,
            generation,
        })
    }

    /// Apply a finished fetch. Outcomes superseded by a newer `begin_fetch`
    /// for the same series are dropped; returns whether it was applied.
    pub fn complete(&mut self, outcome: FetchOutcome) -> bool {
        let ticket = outcome.ticket;
        let Some(entry) = self.cache.get_mut(&ticket.series) else {
            debug!("Dropping result for evicted series {}", ticket.series.as_str());
            return false;
        };
        if entry.generation != ticket.generation {
            debug!("Dropping stale result for series {}", ticket.series.as_str());
            return false;
        }

        match outcome.result {
            Ok(raw) => {
                let series = normalize(raw);
                info!(
                    "Loaded {} samples for {} ({})",
                    series.values.len(),
                    ticket.series.as_str(),
                    ticket.window.token()
                );
                entry.state = SeriesState::Loaded(series);
                self.last_errors.remove(&ticket.series);
            }
            Err(e) => {
                error!("Failed to fetch {} chart for {}: {}", ticket.series.as_str(), ticket.window.token(), e);
                entry.state = SeriesState::Loaded(ChartSeries::default());
                self.last_errors.insert(ticket.series, e.to_string());
            }
        }
        true
    }

    /// Fetch (unless cached) and apply in one step.
    pub async fn fetch_series(&mut self, window: TimeWindow, series: SeriesName) -> ChartView {
        if let Some(ticket) = self.begin_fetch(window, series) {
            let gateway = self.gateway.clone();
            let outcome = ticket.run(gateway.as_ref()).await;
            self.complete(outcome);
        }
        self.view_state(series)
    }

    /// Same as `fetch_series` accepting a window token such as "30days".
    /// Unknown tokens fall back to the default window.
    pub async fn fetch_series_for_token(&mut self, window: &str, series: SeriesName) -> ChartView {
        let window = TimeWindow::parse(window).unwrap_or_else(|| {
            warn!("Unknown time window '{}', using {}", window, TimeWindow::default().token());
            TimeWindow::default()
        });
        self.fetch_series(window, series).await
    }

    /// Drop every cached series so the next fetch goes to the server.
    pub fn invalidate(&mut self) {
        self.cache.clear();
        self.last_errors.clear();
    }

    /// A series nobody asked for yet reports `Loading`, since the view fetches
    /// whatever it is about to display.
    pub fn view_state(&self, series: SeriesName) -> ChartView {
        match self.cache.get(&series).map(|e| &e.state) {
            None | Some(SeriesState::Loading) => ChartView::Loading,
            Some(SeriesState::Loaded(s)) if s.is_empty() => ChartView::Empty,
            Some(SeriesState::Loaded(_)) => ChartView::HasData,
        }
    }

    pub fn series(&self, series: SeriesName) -> Option<&ChartSeries> {
        match self.cache.get(&series).map(|e| &e.state) {
            Some(SeriesState::Loaded(s)) => Some(s),
            _ => None,
        }
    }

    pub fn window_of(&self, series: SeriesName) -> Option<TimeWindow> {
        self.cache.get(&series).map(|e| e.window)
    }

    pub fn last_error(&self, series: SeriesName) -> Option<&str> {
        self.last_errors.get(&series).map(String::as_str)
    }

    pub fn heights(&self, series: SeriesName) -> Vec<f64> {
        self.series(series)
            .map(|s| s.values.iter().copied().map(height_percent).collect())
            .unwrap_or_default()
    }

    pub fn bars(&self, series: SeriesName) -> Vec<ChartBar> {
        let Some(s) = self.series(series) else {
            return Vec::new();
        };
        s.values
            .iter()
            .zip(&s.labels)
            .map(|(value, label)| ChartBar {
                label: label.clone(),
                value: *value,
                height: height_percent(*value),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_height_policy() {
        assert_eq!(height_percent(0.0), 1.0);
        assert_eq!(height_percent(-4.0), 1.0);
        assert_eq!(height_percent(f64::NAN), 1.0);
        // log2(1.1) * 5 is well under the floor
        assert_eq!(height_percent(0.1), 2.0);
        assert!((height_percent(5.0) - 6f64.log2() * 5.0).abs() < 1e-9);
        assert_eq!(height_percent(1e12), 100.0);
    }

    #[test]
    fn test_height_is_monotone_and_bounded() {
        let mut previous = height_percent(0.0);
        let mut v = 0.0;
        while v < 5_000_000.0 {
            v = v * 1.5 + 0.01;
            let h = height_percent(v);
            assert!(h >= previous, "height dropped at {}", v);
            assert!((2.0..=100.0).contains(&h));
            previous = h;
        }
    }

    #[test]
    fn test_normalize_labels() {
        let raw = RawChartSeries {
            values: vec![json!(1), json!("x"), json!(null)],
            labels: None,
        };
        let series = normalize(raw);
        assert_eq!(series.values, vec![1.0, 0.0, 0.0]);
        assert_eq!(series.labels, vec!["1", "2", "3"]);

        let raw = RawChartSeries {
            values: vec![json!(3), json!(4)],
            labels: Some(vec!["Mon".to_string(), "Tue".to_string()]),
        };
        assert_eq!(normalize(raw).labels, vec!["Mon", "Tue"]);

        let raw = RawChartSeries {
            values: vec![json!(3), json!(4)],
            labels: Some(vec!["Mon".to_string()]),
        };
        assert_eq!(normalize(raw).labels, vec!["1", "2"]);
    }

    #[test]
    fn test_skeleton_heights_are_in_range() {
        let heights = skeleton_heights(12);
        assert_eq!(heights.len(), 12);
        assert!(heights.iter().all(|h| (20.0..80.0).contains(h)));
    }
}
