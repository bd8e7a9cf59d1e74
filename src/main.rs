#![deny(dead_code)]
use anyhow::{anyhow, Result};
use clap::Parser;
use log::{error, info, warn, LevelFilter};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex as TokioMutex};

mod ui;
mod utils;

use crate::ui::{DashboardUI, InsightsView, UiAction, ViewUpdate};
use supplier_dashboard::chart::ChartPipeline;
use supplier_dashboard::config::{self, Config};
use supplier_dashboard::gateway::{Gateway, HttpGateway, StaticToken, TokenStore};
use supplier_dashboard::inbox::{InboxModel, UnreadNotifier};
use supplier_dashboard::insights::{InsightsAggregator, SlotKind};
use supplier_dashboard::models::{MessageId, MessageKey, SeriesName, TimeWindow};
use supplier_dashboard::Dashboard;

const DEFAULT_LOG_FILE: &str = "supplier-dashboard.log";

/// Command line arguments
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Terminal dashboard for supplier inbox and analytics.",
    long_about = "Shows the supplier inbox, sent messages, traffic charts and analytics insights from the supplier REST API.\n\n\
    Set DASHBOARD_API_URL and DASHBOARD_TOKEN to override the config file."
)]
struct Args {
    /// Path to the JSON config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Chart window: 7days, 30days or 90days
    #[arg(long, value_name = "WINDOW")]
    window: Option<String>,

    /// Chart series: views, contacts or inquiries
    #[arg(long, value_name = "SERIES", default_value = "views")]
    series: String,

    /// Open this message on start (searched in received, then sent)
    #[arg(long, value_name = "ID")]
    message_id: Option<MessageId>,

    /// Print a JSON summary and exit instead of starting the dashboard
    #[arg(long)]
    summary: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LevelFilter>,
}

type Shared<T> = Arc<TokioMutex<T>>;

struct Models {
    gateway: Arc<dyn Gateway>,
    inbox: Shared<InboxModel>,
    charts: Shared<ChartPipeline>,
    insights: Shared<InsightsAggregator>,
    updates: mpsc::Sender<ViewUpdate>,
}

impl Models {
    fn clone_handles(&self) -> Models {
        Models {
            gateway: self.gateway.clone(),
            inbox: self.inbox.clone(),
            charts: self.charts.clone(),
            insights: self.insights.clone(),
            updates: self.updates.clone(),
        }
    }

    async fn send(&self, update: ViewUpdate) {
        // The UI may already be gone; nothing to do then
        if self.updates.send(update).await.is_err() {
            info!("View closed, dropping update");
        }
    }

    async fn load_inbox(self, deep_link: Option<MessageId>) {
        let mut inbox = self.inbox.lock().await;
        let loaded = inbox.load().await.map(|_| ()).map_err(|e| e.to_string());
        if let Err(e) = loaded {
            drop(inbox);
            self.send(ViewUpdate::Status(format!("Inbox unavailable: {}", e))).await;
            return;
        }
        let selected = match deep_link {
            Some(id) => match inbox.open(id, None).await {
                Some(message) => Some(message.key()),
                None => {
                    warn!("Deep-linked message {} not found", id);
                    None
                }
            },
            None => None,
        };
        let snapshot = inbox.snapshot().clone();
        drop(inbox);

        self.send(ViewUpdate::Inbox(snapshot)).await;
        if let Some(key) = selected {
            self.send(ViewUpdate::Selected(key)).await;
        }
    }

    async fn open(self, key: MessageKey) {
        let mut inbox = self.inbox.lock().await;
        let opened = inbox.open(key.id, Some(key.direction)).await;
        let snapshot = inbox.snapshot().clone();
        drop(inbox);

        self.send(ViewUpdate::Inbox(snapshot)).await;
        if let Some(message) = opened {
            self.send(ViewUpdate::Selected(message.key())).await;
        }
    }

    async fn reply(self, id: MessageId, text: String) {
        let mut inbox = self.inbox.lock().await;
        let result = inbox.reply(id, &text).await.map_err(|e| e.to_string());
        let snapshot = inbox.snapshot().clone();
        drop(inbox);

        self.send(ViewUpdate::ReplyResult(result)).await;
        self.send(ViewUpdate::Inbox(snapshot)).await;
    }

    async fn compose(self, to: String, subject: String, body: String) {
        let result = self
            .inbox
            .lock()
            .await
            .compose(&to, &subject, &body)
            .await
            .map_err(|e| e.to_string());
        self.send(ViewUpdate::ComposeResult(result)).await;
    }

    async fn chart_update(&self, window: TimeWindow, series: SeriesName) {
        let charts = self.charts.lock().await;
        let update = ViewUpdate::Chart {
            series,
            window,
            state: charts.view_state(series),
            bars: charts.bars(series),
        };
        drop(charts);
        self.send(update).await;
    }

    /// Fetch a series without holding the pipeline lock across the request,
    /// so the loading state is visible while it runs.
    async fn show_chart(self, window: TimeWindow, series: SeriesName) {
        let ticket = self.charts.lock().await.begin_fetch(window, series);
        if let Some(ticket) = ticket {
            self.chart_update(window, series).await;
            let outcome = ticket.run(self.gateway.as_ref()).await;
            self.charts.lock().await.complete(outcome);
        }
        self.chart_update(window, series).await;
    }

    /// The calls run without the aggregator lock; each result is applied
    /// and shown as soon as it arrives.
    async fn refresh_insights(self, window: TimeWindow) {
        let mut updates = self.insights.lock().await.start_refresh(window);
        while let Some(update) = updates.recv().await {
            let mut insights = self.insights.lock().await;
            if !insights.apply(update) {
                continue;
            }
            let view = insights_view(&insights);
            drop(insights);
            self.send(ViewUpdate::Insights(view)).await;
        }
    }
}

fn insights_view(insights: &InsightsAggregator) -> InsightsView {
    InsightsView {
        performance: insights.performance.clone(),
        keyword_shares: insights.keyword_shares(),
        keywords_loaded: insights.keywords.is_loaded(),
        customers: insights.customers.clone(),
        recommendations: insights.recommendations.clone(),
        failed: [SlotKind::Performance, SlotKind::Keywords, SlotKind::Customers, SlotKind::Recommendations]
            .into_iter()
            .filter(|k| insights.has_failed(*k))
            .collect(),
    }
}

fn resolve_window(args: &Args, config: &Config) -> Result<TimeWindow> {
    match &args.window {
        Some(token) => TimeWindow::parse(token).ok_or_else(|| anyhow!("Unknown window '{}'", token)),
        None => Ok(config.window()?),
    }
}

async fn run_summary(gateway: Arc<dyn Gateway>, config: &Config, args: &Args, window: TimeWindow, series: SeriesName) -> Result<()> {
    let mut dashboard = Dashboard::new(gateway, UnreadNotifier::global(), config);
    dashboard.load_all(window, series).await;
    if let Some(id) = args.message_id {
        match dashboard.inbox.select_by_id(id, None) {
            Some(message) => println!("Message {} ({:?}): {}", id, message.direction, message.subject),
            None => println!("Message {} not found", id),
        }
    }
    println!("{}", serde_json::to_string_pretty(&dashboard.summary(series))?);
    Ok(())
}

async fn run_dashboard(gateway: Arc<dyn Gateway>, config: &Config, args: &Args, window: TimeWindow, series: SeriesName) -> Result<()> {
    let notifier = UnreadNotifier::global();
    let (updates, mut update_rx) = mpsc::channel::<ViewUpdate>(64);
    let models = Models {
        gateway: gateway.clone(),
        inbox: Arc::new(TokioMutex::new(
            InboxModel::with_notifier(gateway.clone(), notifier.clone())
                .reconcile_on_mark_read_failure(config.reconcile_on_mark_read_failure),
        )),
        charts: Arc::new(TokioMutex::new(ChartPipeline::new(gateway.clone()))),
        insights: Arc::new(TokioMutex::new(InsightsAggregator::new(gateway))),
        updates,
    };
    // Only the badge listens here; it never reads the inbox model
    let mut unread_rx = notifier.subscribe();

    let mut dashboard_ui = DashboardUI::new(window, series);
    tokio::spawn(models.clone_handles().load_inbox(args.message_id));
    tokio::spawn(models.clone_handles().show_chart(window, series));
    tokio::spawn(models.clone_handles().refresh_insights(window));

    let mut terminal = ui::setup_terminal()?;
    let mut insights_window = window;

    loop {
        while let Ok(update) = update_rx.try_recv() {
            dashboard_ui.apply(update);
        }
        while let Ok(event) = unread_rx.try_recv() {
            dashboard_ui.set_unread_badge(event.new_unread_count);
        }

        if let Err(e) = terminal.draw(|f| dashboard_ui.draw(f)) {
            error!("Failed to draw dashboard: {}", e);
            break;
        }

        let action = match dashboard_ui.handle_input() {
            Ok(action) => action,
            Err(e) => {
                error!("Input error: {}", e);
                break;
            }
        };

        match action {
            None => {}
            Some(UiAction::Quit) => break,
            Some(UiAction::Refresh) => {
                models.charts.lock().await.invalidate();
                tokio::spawn(models.clone_handles().load_inbox(None));
                let (window, series) = dashboard_ui.chart_selection();
                tokio::spawn(models.clone_handles().show_chart(window, series));
                insights_window = window;
                tokio::spawn(models.clone_handles().refresh_insights(insights_window));
            }
            Some(UiAction::Open(key)) => {
                tokio::spawn(models.clone_handles().open(key));
            }
            Some(UiAction::Reply { id, text }) => {
                tokio::spawn(models.clone_handles().reply(id, text));
            }
            Some(UiAction::Compose { to, subject, body }) => {
                tokio::spawn(models.clone_handles().compose(to, subject, body));
            }
            Some(UiAction::ShowChart { window, series }) => {
                tokio::spawn(models.clone_handles().show_chart(window, series));
                if window != insights_window {
                    insights_window = window;
                    tokio::spawn(models.clone_handles().refresh_insights(window));
                }
            }
        }
    }

    ui::restore_terminal(terminal)?;
    info!("Dashboard closed");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.config {
        config::set_config_path_override(path.clone());
    }
    let config = config::load_config()?;

    // The dashboard owns the terminal, so it always logs to a file
    let log_path = match (&config.log_file, args.summary) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => None,
        (None, false) => Some(PathBuf::from(DEFAULT_LOG_FILE)),
    };
    let level = args.log_level.unwrap_or_else(|| config.level_filter());
    utils::setup_logging(log_path.as_deref(), level)?;
    info!("API base URL: {}", config.api_base_url);

    let window = resolve_window(&args, &config)?;
    let series = SeriesName::parse(&args.series).ok_or_else(|| anyhow!("Unknown series '{}'", args.series))?;

    let tokens = Arc::new(StaticToken::new(config.get_token()));
    if tokens.token().is_none() {
        warn!("No API token configured, requests will be anonymous");
    }
    let gateway: Arc<dyn Gateway> = Arc::new(HttpGateway::new(&config.api_base_url, tokens, config.request_timeout())?);

    if args.summary {
        run_summary(gateway, &config, &args, window, series).await
    } else {
        run_dashboard(gateway, &config, &args, window, series).await
    }
}
