use serde::Serialize;

pub type MessageId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Received,
    Sent,
}

impl Direction {
    pub fn other(self) -> Direction {
        match self {
            Direction::Received => Direction::Sent,
            Direction::Sent => Direction::Received,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Inquiry,
    Business,
    Quote,
    Notification,
    Response,
    Update,
}

impl Category {
    /// Wire name used when the category is echoed back to the server.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Inquiry => "inquiry",
            Category::Business => "business",
            Category::Quote => "quote",
            Category::Notification => "notification",
            Category::Response => "response",
            Category::Update => "update",
        }
    }
}

/// A message is identified by direction and id together; the received and
/// sent collections come from independent server sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MessageKey {
    pub direction: Direction,
    pub id: MessageId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: MessageId,
    pub counterparty_name: String,
    pub counterparty_org: Option<String>,
    pub subject: String,
    pub body: String,
    pub relative_time: String,
    pub direction: Direction,
    pub category: Category,
    pub is_unread: bool,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

impl Message {
    pub fn key(&self) -> MessageKey {
        MessageKey {
            direction: self.direction,
            id: self.id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InboxSnapshot {
    pub received: Vec<Message>,
    pub sent: Vec<Message>,
    pub unread_count: usize,
    pub average_response_time: String,
    pub response_rate: String,
}

impl InboxSnapshot {
    pub fn messages(&self, direction: Direction) -> &[Message] {
        match direction {
            Direction::Received => &self.received,
            Direction::Sent => &self.sent,
        }
    }

    pub fn find(&self, key: MessageKey) -> Option<&Message> {
        self.messages(key.direction).iter().find(|m| m.id == key.id)
    }

    pub fn count_unread(&self) -> usize {
        self.received.iter().filter(|m| m.is_unread).count()
    }
}

/// Payload of the process-wide unread notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnreadChanged {
    pub message_id: MessageId,
    pub new_unread_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesName {
    Views,
    Contacts,
    Inquiries,
}

impl SeriesName {
    pub const ALL: [SeriesName; 3] = [SeriesName::Views, SeriesName::Contacts, SeriesName::Inquiries];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesName::Views => "views",
            SeriesName::Contacts => "contacts",
            SeriesName::Inquiries => "inquiries",
        }
    }

    pub fn parse(token: &str) -> Option<SeriesName> {
        SeriesName::ALL.into_iter().find(|s| s.as_str() == token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TimeWindow {
    #[serde(rename = "7days")]
    Week,
    #[serde(rename = "30days")]
    Month,
    #[serde(rename = "90days")]
    Quarter,
}

impl TimeWindow {
    pub fn days(&self) -> u32 {
        match self {
            TimeWindow::Week => 7,
            TimeWindow::Month => 30,
            TimeWindow::Quarter => 90,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            TimeWindow::Week => "7days",
            TimeWindow::Month => "30days",
            TimeWindow::Quarter => "90days",
        }
    }

    pub fn parse(token: &str) -> Option<TimeWindow> {
        match token.trim() {
            "7days" => Some(TimeWindow::Week),
            "30days" => Some(TimeWindow::Month),
            "90days" => Some(TimeWindow::Quarter),
            _ => None,
        }
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        TimeWindow::Week
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub values: Vec<f64>,
    pub labels: Vec<String>,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayUnit {
    None,
    Percent,
    Rating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricColor {
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
    Gray,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    pub name: String,
    pub value: f64,
    pub target: f64,
    pub unit: DisplayUnit,
    pub color: MetricColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityBand {
    Low,
    Medium,
    High,
}
