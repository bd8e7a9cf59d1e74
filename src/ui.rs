use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{BarChart, Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs},
    Frame,
};
use std::{io, time::Duration};
use textwrap::wrap;
use tui_input::{backend::crossterm::EventHandler, Input};

use supplier_dashboard::chart::{skeleton_heights, ChartBar, ChartView};
use supplier_dashboard::gateway::CustomerInsightsPayload;
use supplier_dashboard::insights::{Recommendations, Slot, SlotKind};
use supplier_dashboard::models::{
    Direction as MessageDirection, InboxSnapshot, Message, MessageId, MessageKey, MetricColor, MetricSample,
    PriorityBand, SeriesName, TimeWindow,
};

pub use ratatui::backend::CrosstermBackend;
pub use ratatui::Terminal;

/// Requests the view makes of the core
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    Quit,
    Refresh,
    Open(MessageKey),
    Reply { id: MessageId, text: String },
    Compose { to: String, subject: String, body: String },
    ShowChart { window: TimeWindow, series: SeriesName },
}

/// Snapshots the core sends back for rendering
#[derive(Debug, Clone)]
pub enum ViewUpdate {
    Inbox(InboxSnapshot),
    /// The core resolved a message (deep link); show it in its collection
    Selected(MessageKey),
    ReplyResult(std::result::Result<(), String>),
    ComposeResult(std::result::Result<(), String>),
    Chart { series: SeriesName, window: TimeWindow, state: ChartView, bars: Vec<ChartBar> },
    Insights(InsightsView),
    Status(String),
}

#[derive(Debug, Clone)]
pub struct InsightsView {
    pub performance: Slot<Vec<MetricSample>>,
    pub keyword_shares: Vec<(String, f64)>,
    pub keywords_loaded: bool,
    pub customers: Slot<CustomerInsightsPayload>,
    pub recommendations: Slot<Recommendations>,
    pub failed: Vec<SlotKind>,
}

#[derive(Clone, Copy, PartialEq)]
enum Tab {
    Inbox,
    Sent,
    Analytics,
    Insights,
}

const TABS: [Tab; 4] = [Tab::Inbox, Tab::Sent, Tab::Analytics, Tab::Insights];

impl Tab {
    fn title(&self) -> &'static str {
        match self {
            Tab::Inbox => "Inbox",
            Tab::Sent => "Sent",
            Tab::Analytics => "Analytics",
            Tab::Insights => "Insights",
        }
    }

    fn index(&self) -> usize {
        TABS.iter().position(|t| t == self).unwrap_or(0)
    }

    fn direction(&self) -> Option<MessageDirection> {
        match self {
            Tab::Inbox => Some(MessageDirection::Received),
            Tab::Sent => Some(MessageDirection::Sent),
            _ => None,
        }
    }
}

struct ComposeDialog {
    fields: [Input; 3],
    focus: usize,
    error: Option<String>,
    sending: bool,
}

const COMPOSE_LABELS: [&str; 3] = ["To", "Subject", "Body"];

struct ChartPanel {
    series: SeriesName,
    window: TimeWindow,
    state: ChartView,
    bars: Vec<ChartBar>,
    skeleton: Vec<f64>,
}

pub struct DashboardUI {
    tab: Tab,
    snapshot: InboxSnapshot,
    selected: [usize; 2],
    open: Option<MessageKey>,
    reply_input: Input,
    replying: bool,
    reply_error: Option<String>,
    compose: Option<ComposeDialog>,
    unread_badge: usize,
    chart: ChartPanel,
    insights: Option<InsightsView>,
    status: String,
}

impl DashboardUI {
    pub fn new(window: TimeWindow, series: SeriesName) -> Self {
        DashboardUI {
            tab: Tab::Inbox,
            snapshot: InboxSnapshot::default(),
            selected: [0, 0],
            open: None,
            reply_input: Input::default(),
            replying: false,
            reply_error: None,
            compose: None,
            unread_badge: 0,
            chart: ChartPanel {
                series,
                window,
                state: ChartView::Loading,
                bars: Vec::new(),
                skeleton: skeleton_heights(window.days() as usize),
            },
            insights: None,
            status: "Loading...".to_string(),
        }
    }

    pub fn chart_selection(&self) -> (TimeWindow, SeriesName) {
        (self.chart.window, self.chart.series)
    }

    /// Between full loads the badge only moves on unread notifications.
    pub fn set_unread_badge(&mut self, count: usize) {
        self.unread_badge = count;
    }

    pub fn apply(&mut self, update: ViewUpdate) {
        match update {
            ViewUpdate::Inbox(snapshot) => {
                self.snapshot = snapshot;
                self.unread_badge = self.snapshot.unread_count;
                for (i, direction) in [MessageDirection::Received, MessageDirection::Sent].iter().enumerate() {
                    let len = self.snapshot.messages(*direction).len();
                    self.selected[i] = self.selected[i].min(len.saturating_sub(1));
                }
            }
            ViewUpdate::Selected(key) => {
                self.tab = match key.direction {
                    MessageDirection::Received => Tab::Inbox,
                    MessageDirection::Sent => Tab::Sent,
                };
                self.open = Some(key);
                self.select_key(key);
            }
            ViewUpdate::ReplyResult(Ok(())) => {
                self.reply_input.reset();
                self.replying = false;
                self.reply_error = None;
                self.status = "Reply sent".to_string();
            }
            ViewUpdate::ReplyResult(Err(e)) => {
                // Keep the typed text for a retry
                self.reply_error = Some(e);
            }
            ViewUpdate::ComposeResult(Ok(())) => {
                self.compose = None;
                self.status = "Message sent".to_string();
            }
            ViewUpdate::ComposeResult(Err(e)) => {
                if let Some(dialog) = self.compose.as_mut() {
                    dialog.sending = false;
                    dialog.error = Some(e);
                }
            }
            ViewUpdate::Chart { series, window, state, bars } => {
                if series == self.chart.series && window == self.chart.window {
                    self.chart.state = state;
                    self.chart.bars = bars;
                }
            }
            ViewUpdate::Insights(view) => self.insights = Some(view),
            ViewUpdate::Status(status) => self.status = status,
        }
    }

    fn select_key(&mut self, key: MessageKey) {
        let slot = match key.direction {
            MessageDirection::Received => 0,
            MessageDirection::Sent => 1,
        };
        if let Some(pos) = self.snapshot.messages(key.direction).iter().position(|m| m.id == key.id) {
            self.selected[slot] = pos;
        }
    }

    fn current_list(&self) -> Option<(usize, &[Message])> {
        let direction = self.tab.direction()?;
        let slot = match direction {
            MessageDirection::Received => 0,
            MessageDirection::Sent => 1,
        };
        Some((slot, self.snapshot.messages(direction)))
    }

    fn selected_message(&self) -> Option<&Message> {
        let (slot, messages) = self.current_list()?;
        messages.get(self.selected[slot])
    }

    fn move_selection(&mut self, delta: isize) {
        if let Some((slot, messages)) = self.current_list() {
            if messages.is_empty() {
                return;
            }
            let len = messages.len() as isize;
            let next = (self.selected[slot] as isize + delta).rem_euclid(len);
            self.selected[slot] = next as usize;
        }
    }

    fn switch_tab(&mut self, forward: bool) {
        let i = self.tab.index();
        let next = if forward { (i + 1) % TABS.len() } else { (i + TABS.len() - 1) % TABS.len() };
        self.tab = TABS[next];
        self.replying = false;
    }

    fn show_chart(&mut self, window: TimeWindow, series: SeriesName) -> UiAction {
        if window != self.chart.window {
            self.chart.skeleton = skeleton_heights(window.days() as usize);
        }
        self.chart.window = window;
        self.chart.series = series;
        self.chart.state = ChartView::Loading;
        self.chart.bars.clear();
        UiAction::ShowChart { window, series }
    }

    pub fn handle_input(&mut self) -> Result<Option<UiAction>> {
        if !event::poll(Duration::from_millis(50))? {
            return Ok(None);
        }
        let key = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => key,
            _ => return Ok(None),
        };

        if self.compose.is_some() {
            return Ok(self.handle_compose_key(key));
        }
        if self.replying {
            return Ok(self.handle_reply_key(key));
        }

        let action = match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(UiAction::Quit),
            KeyCode::Tab | KeyCode::Right => {
                self.switch_tab(true);
                None
            }
            KeyCode::BackTab | KeyCode::Left => {
                self.switch_tab(false);
                None
            }
            KeyCode::Char('r') => Some(UiAction::Refresh),
            KeyCode::Char('c') => {
                self.compose = Some(ComposeDialog {
                    fields: [Input::default(), Input::default(), Input::default()],
                    focus: 0,
                    error: None,
                    sending: false,
                });
                None
            }
            KeyCode::Up => {
                self.move_selection(-1);
                None
            }
            KeyCode::Down => {
                self.move_selection(1);
                None
            }
            KeyCode::Enter => self.selected_message().map(|m| m.key()).map(|key| {
                self.open = Some(key);
                UiAction::Open(key)
            }),
            KeyCode::Char('a') if self.tab.direction().is_some() => {
                if let Some(key) = self.selected_message().map(|m| m.key()) {
                    self.open = Some(key);
                    self.replying = true;
                    self.reply_error = None;
                }
                None
            }
            KeyCode::Char('1') if self.tab == Tab::Analytics => Some(self.show_chart(self.chart.window, SeriesName::Views)),
            KeyCode::Char('2') if self.tab == Tab::Analytics => Some(self.show_chart(self.chart.window, SeriesName::Contacts)),
            KeyCode::Char('3') if self.tab == Tab::Analytics => Some(self.show_chart(self.chart.window, SeriesName::Inquiries)),
            KeyCode::Char('w') if self.tab == Tab::Analytics => {
                let next = match self.chart.window {
                    TimeWindow::Week => TimeWindow::Month,
                    TimeWindow::Month => TimeWindow::Quarter,
                    TimeWindow::Quarter => TimeWindow::Week,
                };
                Some(self.show_chart(next, self.chart.series))
            }
            _ => None,
        };
        Ok(action)
    }

    fn handle_reply_key(&mut self, key: KeyEvent) -> Option<UiAction> {
        match key.code {
            KeyCode::Esc => {
                self.replying = false;
                None
            }
            KeyCode::Enter => {
                let key = self.open?;
                Some(UiAction::Reply {
                    id: key.id,
                    text: self.reply_input.value().to_string(),
                })
            }
            _ => {
                self.reply_input.handle_event(&Event::Key(key));
                None
            }
        }
    }

    fn handle_compose_key(&mut self, key: KeyEvent) -> Option<UiAction> {
        let dialog = self.compose.as_mut()?;
        match key.code {
            KeyCode::Esc => {
                self.compose = None;
                None
            }
            KeyCode::Tab | KeyCode::Down => {
                dialog.focus = (dialog.focus + 1) % dialog.fields.len();
                None
            }
            KeyCode::BackTab | KeyCode::Up => {
                dialog.focus = (dialog.focus + dialog.fields.len() - 1) % dialog.fields.len();
                None
            }
            KeyCode::Enter if !dialog.sending => {
                dialog.sending = true;
                dialog.error = None;
                let [to, subject, body] = &dialog.fields;
                Some(UiAction::Compose {
                    to: to.value().to_string(),
                    subject: subject.value().to_string(),
                    body: body.value().to_string(),
                })
            }
            _ => {
                dialog.fields[dialog.focus].handle_event(&Event::Key(key));
                None
            }
        }
    }

    pub fn draw<B: Backend>(&self, frame: &mut Frame<B>) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Tabs
                Constraint::Min(5),    // Body
                Constraint::Length(1), // Status line
            ])
            .split(size);

        let titles: Vec<Line> = TABS
            .iter()
            .map(|t| match t {
                Tab::Inbox if self.unread_badge > 0 => Line::from(vec![
                    Span::raw("Inbox "),
                    Span::styled(format!("({})", self.unread_badge), Style::default().fg(Color::Red)),
                ]),
                _ => Line::from(t.title()),
            })
            .collect();
        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title("Supplier Dashboard"))
            .select(self.tab.index())
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, chunks[0]);

        match self.tab {
            Tab::Inbox | Tab::Sent => self.draw_messages(frame, chunks[1]),
            Tab::Analytics => draw_chart(frame, &self.chart, chunks[1]),
            Tab::Insights => draw_insights(frame, self.insights.as_ref(), chunks[1]),
        }

        let help = match self.tab {
            Tab::Analytics => "q quit | ←/→ tabs | 1 views 2 contacts 3 inquiries | w window | r refresh",
            _ => "q quit | ←/→ tabs | ↑/↓ select | Enter open | a reply | c compose | r refresh",
        };
        let status = Paragraph::new(Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw("  "),
            Span::styled(self.status.as_str(), Style::default().fg(Color::Cyan)),
        ]));
        frame.render_widget(status, chunks[2]);

        if let Some(dialog) = &self.compose {
            draw_compose_dialog(frame, dialog, size);
        }
    }

    fn draw_messages<B: Backend>(&self, frame: &mut Frame<B>, area: Rect) {
        let Some((slot, messages)) = self.current_list() else {
            return;
        };
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(area);

        let items: Vec<ListItem> = messages
            .iter()
            .map(|m| {
                let marker = if m.is_unread { "● " } else { "  " };
                let style = if m.is_unread {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(format!(
                    "{}{} · {} [{}] {}",
                    marker,
                    m.counterparty_name,
                    m.subject,
                    m.category.as_str(),
                    m.relative_time
                ))
                .style(style)
            })
            .collect();

        let title = match self.tab {
            Tab::Sent => format!("Sent ({})", messages.len()),
            _ => format!(
                "Inbox ({} unread) · avg response {} · rate {}",
                self.snapshot.unread_count, self.snapshot.average_response_time, self.snapshot.response_rate
            ),
        };
        let mut state = ListState::default();
        if !messages.is_empty() {
            state.select(Some(self.selected[slot]));
        }
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().fg(Color::Yellow));
        frame.render_stateful_widget(list, columns[0], &mut state);

        let detail_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(if self.replying {
                [Constraint::Min(3), Constraint::Length(3)]
            } else {
                [Constraint::Min(3), Constraint::Length(0)]
            })
            .split(columns[1]);

        let wrap_width = detail_chunks[0].width.saturating_sub(2).max(10) as usize;
        let lines: Vec<Line> = match self.selected_message() {
            Some(m) => {
                let mut lines = vec![
                    Line::from(Span::styled(m.subject.clone(), Style::default().add_modifier(Modifier::BOLD))),
                    Line::from(match &m.counterparty_org {
                        Some(org) => format!("{} ({})", m.counterparty_name, org),
                        None => m.counterparty_name.clone(),
                    }),
                ];
                if let Some(email) = &m.contact_email {
                    lines.push(Line::from(format!("✉ {}", email)));
                }
                if let Some(phone) = &m.contact_phone {
                    lines.push(Line::from(format!("☎ {}", phone)));
                }
                lines.push(Line::from(""));
                lines.extend(wrap(&m.body, wrap_width).into_iter().map(|l| Line::from(l.into_owned())));
                lines
            }
            None => vec![Line::from("No messages")],
        };
        let detail = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Message"));
        frame.render_widget(detail, detail_chunks[0]);

        if self.replying {
            let title = match &self.reply_error {
                Some(e) => format!("Reply (failed: {}, Enter to retry)", e),
                None => "Reply (Enter to send, Esc to cancel)".to_string(),
            };
            let border = if self.reply_error.is_some() { Color::Red } else { Color::Yellow };
            let input = Paragraph::new(self.reply_input.value())
                .block(Block::default().borders(Borders::ALL).title(title).border_style(Style::default().fg(border)));
            frame.render_widget(input, detail_chunks[1]);
            frame.set_cursor(
                detail_chunks[1].x + self.reply_input.cursor() as u16 + 1,
                detail_chunks[1].y + 1,
            );
        }
    }
}

fn draw_chart<B: Backend>(frame: &mut Frame<B>, panel: &ChartPanel, area: Rect) {
    let title = format!("{} · last {} days", panel.series.as_str(), panel.window.days());
    let block = Block::default().borders(Borders::ALL).title(title);

    let (data, style): (Vec<(String, u64)>, Style) = match panel.state {
        ChartView::Loading => (
            panel.skeleton.iter().map(|h| (String::new(), h.round() as u64)).collect(),
            Style::default().fg(Color::DarkGray),
        ),
        ChartView::Empty => {
            let empty = Paragraph::new("No data for this period").block(block);
            frame.render_widget(empty, area);
            return;
        }
        ChartView::HasData => (
            panel.bars.iter().map(|b| (b.label.clone(), b.height.round() as u64)).collect(),
            Style::default().fg(Color::Green),
        ),
    };

    let borrowed: Vec<(&str, u64)> = data.iter().map(|(l, h)| (l.as_str(), *h)).collect();
    let inner_width = area.width.saturating_sub(2) as usize;
    let bar_width = (inner_width / borrowed.len().max(1)).saturating_sub(1).clamp(1, 6) as u16;
    let chart = BarChart::default()
        .block(block)
        .data(borrowed.as_slice())
        .bar_width(bar_width)
        .bar_gap(1)
        .max(100)
        .bar_style(style)
        .value_style(Style::default().fg(Color::Black).bg(Color::Green));
    frame.render_widget(chart, area);
}

fn metric_color(color: MetricColor) -> Color {
    match color {
        MetricColor::Blue => Color::Blue,
        MetricColor::Green => Color::Green,
        MetricColor::Yellow => Color::Yellow,
        MetricColor::Purple => Color::Magenta,
        MetricColor::Orange => Color::LightRed,
        MetricColor::Gray => Color::Gray,
    }
}

fn slot_placeholder<T>(slot: &Slot<T>, failed: bool) -> Option<&'static str> {
    match slot {
        Slot::NotLoaded => Some("Loading..."),
        Slot::LoadedEmpty if failed => Some("Unavailable right now"),
        Slot::LoadedEmpty => Some("No data yet"),
        Slot::Loaded(_) => None,
    }
}

fn draw_insights<B: Backend>(frame: &mut Frame<B>, view: Option<&InsightsView>, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    let Some(view) = view else {
        for (title, rect) in [("Performance", top[0]), ("Keywords", top[1]), ("Customers", bottom[0]), ("Recommendations", bottom[1])] {
            frame.render_widget(
                Paragraph::new("Loading...").block(Block::default().borders(Borders::ALL).title(title)),
                rect,
            );
        }
        return;
    };
    let failed = |kind: SlotKind| view.failed.contains(&kind);

    // Performance
    let items: Vec<ListItem> = match slot_placeholder(&view.performance, failed(SlotKind::Performance)) {
        Some(text) => vec![ListItem::new(text)],
        None => view
            .performance
            .data()
            .map(|samples| {
                samples
                    .iter()
                    .map(|m| {
                        ListItem::new(format!("{:<24} {:>8}  {:>3.0}% of target", m.name, m.display_value(), m.progress() * 100.0))
                            .style(Style::default().fg(metric_color(m.color)))
                    })
                    .collect()
            })
            .unwrap_or_default(),
    };
    frame.render_widget(List::new(items).block(Block::default().borders(Borders::ALL).title("Performance")), top[0]);

    // Keywords, bar width proportional to share of the busiest keyword
    let width = top[1].width.saturating_sub(24).max(4) as f64;
    let items: Vec<ListItem> = if !view.keywords_loaded {
        vec![ListItem::new("Loading...")]
    } else if view.keyword_shares.is_empty() {
        vec![ListItem::new(if failed(SlotKind::Keywords) { "Unavailable right now" } else { "No searches yet" })]
    } else {
        view.keyword_shares
            .iter()
            .map(|(keyword, share)| {
                let bar = "█".repeat(((share * width).round() as usize).max(1));
                ListItem::new(format!("{:<18} {}", keyword, bar))
            })
            .collect()
    };
    frame.render_widget(List::new(items).block(Block::default().borders(Borders::ALL).title("Keywords")), top[1]);

    // Customers
    let items: Vec<ListItem> = match slot_placeholder(&view.customers, failed(SlotKind::Customers)) {
        Some(text) => vec![ListItem::new(text)],
        None => view
            .customers
            .data()
            .map(|c| {
                let mut items = vec![ListItem::new(format!(
                    "{} visitors · {} customers · {}",
                    c.total_visitors, c.total_customers, c.period
                ))];
                items.extend(c.demographics.iter().map(|d| ListItem::new(format!("  {:<16} {:>5.1}%", d.kind, d.percentage))));
                items.extend(c.top_locations.iter().map(|l| ListItem::new(format!("  {:<16} {:>6} visitors", l.city, l.visitors))));
                items
            })
            .unwrap_or_default(),
    };
    frame.render_widget(List::new(items).block(Block::default().borders(Borders::ALL).title("Customers")), bottom[0]);

    // Recommendations
    let (items, title): (Vec<ListItem>, String) = match slot_placeholder(&view.recommendations, failed(SlotKind::Recommendations)) {
        Some(text) => (vec![ListItem::new(text)], "Recommendations".to_string()),
        None => match view.recommendations.data() {
            Some(r) => {
                let color = match r.priority {
                    PriorityBand::High => Color::Red,
                    PriorityBand::Medium => Color::Yellow,
                    PriorityBand::Low => Color::Green,
                };
                (
                    r.items.iter().map(|i| ListItem::new(format!("• {}", i)).style(Style::default().fg(color))).collect(),
                    format!("Recommendations ({:?} priority)", r.priority),
                )
            }
            None => (Vec::new(), "Recommendations".to_string()),
        },
    };
    frame.render_widget(List::new(items).block(Block::default().borders(Borders::ALL).title(title)), bottom[1]);
}

fn draw_compose_dialog<B: Backend>(f: &mut Frame<B>, dialog: &ComposeDialog, area: Rect) {
    let popup_width = 70.min(area.width.saturating_sub(4));
    let popup_height = 13.min(area.height.saturating_sub(2));
    let popup_area = Rect::new(
        (area.width.saturating_sub(popup_width)) / 2,
        (area.height.saturating_sub(popup_height)) / 2,
        popup_width,
        popup_height,
    );

    let title = match (&dialog.error, dialog.sending) {
        (Some(e), _) => format!("New message · failed: {}", e),
        (None, true) => "New message · sending...".to_string(),
        (None, false) => "New message (Tab next field, Enter send, Esc cancel)".to_string(),
    };
    let border = if dialog.error.is_some() { Color::Red } else { Color::Yellow };
    let popup_block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    f.render_widget(Clear, popup_area);
    f.render_widget(popup_block, popup_area);

    let inner_area = popup_area.inner(&Margin { horizontal: 1, vertical: 1 });
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(3)])
        .split(inner_area);

    for (i, (input, label)) in dialog.fields.iter().zip(COMPOSE_LABELS).enumerate() {
        let style = if i == dialog.focus {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let widget = Paragraph::new(input.value())
            .block(Block::default().borders(Borders::ALL).title(label).border_style(style));
        f.render_widget(widget, rows[i]);
    }

    let focused = rows[dialog.focus];
    f.set_cursor(focused.x + dialog.fields[dialog.focus].cursor() as u16 + 1, focused.y + 1);
}

pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

pub fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
