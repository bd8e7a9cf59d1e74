// Supplier dashboard core: inbox reconciliation, chart normalization and the
// analytics aggregator, all talking to the REST API through `gateway::Gateway`.
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod gateway;
pub mod inbox;
pub mod insights;
pub mod models;

// Re-export main types for convenience
pub use chart::{height_percent, ChartPipeline, ChartView};
pub use dashboard::{Dashboard, DashboardSummary};
pub use gateway::{Gateway, GatewayError, HttpGateway};
pub use inbox::{InboxError, InboxModel, UnreadNotifier};
pub use insights::{InsightsAggregator, Slot};
pub use models::*;
