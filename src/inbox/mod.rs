// Inbox reconciliation model
// Owns the inbox snapshot, maps raw server records into uniform messages,
// applies optimistic read-state changes and announces unread-count changes.

use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

pub mod compose;
pub mod notifications;

pub use compose::{ComposeForm, ReplyDraft, ValidationError};
pub use notifications::{UnreadNotifier, UNREAD_CHANGED_EVENT};

use crate::gateway::{
    Gateway, GatewayError, MarkReadRequest, RawInbox, RawInboundRecord, RawOutboundRecord, ReplyRequest,
    SendMessageRequest,
};
use crate::models::{Category, Direction, InboxSnapshot, Message, MessageId, UnreadChanged};

#[derive(Debug, Error)]
pub enum InboxError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Raw server type tags and the UI category each maps to. Tags missing from
/// this table fall back to `Category::Notification` with a warning.
const RAW_KIND_CATEGORIES: &[(&str, Category)] = &[
    ("supplier_rating", Category::Notification),
    ("supplier_to_supplier_inquiry", Category::Inquiry),
];

pub fn category_for_raw_kind(kind: Option<&str>) -> Category {
    let Some(kind) = kind else {
        warn!("Inbound record without a type tag, treating as notification");
        return Category::Notification;
    };
    match RAW_KIND_CATEGORIES.iter().find(|(tag, _)| *tag == kind) {
        Some((_, category)) => *category,
        None => {
            warn!("Unmapped inbound type tag '{}', treating as notification", kind);
            Category::Notification
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn received_message(raw: RawInboundRecord) -> Message {
    let category = category_for_raw_kind(raw.kind.as_deref());
    let is_unread = raw.unread();
    Message {
        id: raw.id,
        counterparty_name: raw.sender_name,
        counterparty_org: non_empty(raw.sender_company),
        subject: raw.subject,
        body: raw.message,
        relative_time: raw.time_ago,
        direction: Direction::Received,
        category,
        is_unread,
        contact_email: non_empty(raw.sender_email),
        contact_phone: non_empty(raw.sender_phone),
    }
}

fn sent_message(raw: RawOutboundRecord) -> Message {
    Message {
        id: raw.id,
        counterparty_name: raw.recipient_name,
        counterparty_org: non_empty(raw.recipient_company),
        subject: raw.subject,
        body: raw.message,
        relative_time: raw.time_ago,
        direction: Direction::Sent,
        category: Category::Response,
        // Outgoing messages are never unread
        is_unread: false,
        contact_email: non_empty(raw.recipient_email),
        contact_phone: non_empty(raw.recipient_phone),
    }
}

/// Ids are only unique within a direction; repeated ids in the same
/// collection keep the first occurrence.
fn dedup_by_id(messages: Vec<Message>, direction: Direction) -> Vec<Message> {
    let mut seen = HashSet::new();
    messages
        .into_iter()
        .filter(|m| {
            let fresh = seen.insert(m.id);
            if !fresh {
                warn!("Dropping duplicate {:?} message id {}", direction, m.id);
            }
            fresh
        })
        .collect()
}

/// Build a snapshot from a raw inbox payload. The unread count is derived
/// from the received collection rather than trusted from the server.
pub fn build_snapshot(raw: RawInbox) -> InboxSnapshot {
    let received = dedup_by_id(raw.received.into_iter().map(received_message).collect(), Direction::Received);
    let sent = dedup_by_id(raw.sent.into_iter().map(sent_message).collect(), Direction::Sent);

    let mut snapshot = InboxSnapshot {
        received,
        sent,
        unread_count: 0,
        average_response_time: raw.avg_response_time,
        response_rate: raw.response_rate,
    };
    snapshot.unread_count = snapshot.count_unread();

    if let Some(server_count) = raw.unread_count {
        if server_count as usize != snapshot.unread_count {
            debug!(
                "Server reported {} unread, collection has {}",
                server_count, snapshot.unread_count
            );
        }
    }
    snapshot
}

pub struct InboxModel {
    gateway: Arc<dyn Gateway>,
    notifier: UnreadNotifier,
    snapshot: InboxSnapshot,
    loaded: bool,
    active_view: Direction,
    reply: ReplyDraft,
    compose: ComposeForm,
    last_load_error: Option<String>,
    reconcile_on_mark_read_failure: bool,
}

impl InboxModel {
    /// Create a model publishing to the process-wide notifier
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self::with_notifier(gateway, UnreadNotifier::global())
    }

    pub fn with_notifier(gateway: Arc<dyn Gateway>, notifier: UnreadNotifier) -> Self {
        Self {
            gateway,
            notifier,
            snapshot: InboxSnapshot::default(),
            loaded: false,
            active_view: Direction::Received,
            reply: ReplyDraft::default(),
            compose: ComposeForm::default(),
            last_load_error: None,
            reconcile_on_mark_read_failure: false,
        }
    }

    /// Re-fetch the inbox when persisting a read flag fails, instead of
    /// leaving the optimistic change to diverge until the next load.
    pub fn reconcile_on_mark_read_failure(mut self, enabled: bool) -> Self {
        self.reconcile_on_mark_read_failure = enabled;
        self
    }

    pub fn snapshot(&self) -> &InboxSnapshot {
        &self.snapshot
    }

    pub fn unread_count(&self) -> usize {
        self.snapshot.unread_count
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn last_load_error(&self) -> Option<&str> {
        self.last_load_error.as_deref()
    }

    pub fn active_view(&self) -> Direction {
        self.active_view
    }

    pub fn set_active_view(&mut self, direction: Direction) {
        self.active_view = direction;
    }

    pub fn reply_draft(&self) -> &ReplyDraft {
        &self.reply
    }

    pub fn compose_form(&self) -> &ComposeForm {
        &self.compose
    }

    pub fn notifier(&self) -> &UnreadNotifier {
        &self.notifier
    }

    /// Fetch the inbox and replace the snapshot. On failure the previous
    /// snapshot stays as it was.
    pub async fn load(&mut self) -> Result<&InboxSnapshot, InboxError> {
        match self.gateway.get_inbox().await {
            Ok(raw) => {
                self.snapshot = build_snapshot(raw);
                self.loaded = true;
                self.last_load_error = None;
                info!(
                    "Inbox loaded: {} received ({} unread), {} sent",
                    self.snapshot.received.len(),
                    self.snapshot.unread_count,
                    self.snapshot.sent.len()
                );
                Ok(&self.snapshot)
            }
            Err(e) => {
                error!("Failed to load inbox: {}", e);
                self.last_load_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Resolve a message id, e.g. from a deep link. Received messages are
    /// searched first unless another direction is preferred. Finding it in
    /// the other collection switches the active view there.
    pub fn select_by_id(&mut self, id: MessageId, prefer: Option<Direction>) -> Option<&Message> {
        let first = prefer.unwrap_or(Direction::Received);
        let direction = [first, first.other()]
            .into_iter()
            .find(|d| self.snapshot.messages(*d).iter().any(|m| m.id == id))?;

        if direction != self.active_view {
            debug!("Switching active view to {:?} for message {}", direction, id);
            self.active_view = direction;
        }
        self.snapshot.messages(direction).iter().find(|m| m.id == id)
    }

    /// Select a message and, if it is an unread received one, mark it read.
    pub async fn open(&mut self, id: MessageId, prefer: Option<Direction>) -> Option<Message> {
        let message = self.select_by_id(id, prefer)?.clone();
        if message.direction == Direction::Received && message.is_unread {
            self.mark_read(id).await;
        }
        self.snapshot.find(message.key()).cloned()
    }

    /// Mark a received message read. Returns the published event, or `None`
    /// when there was nothing to do (unknown id or already read).
    ///
    /// The local change is applied before the server call and is kept when
    /// that call fails.
    pub async fn mark_read(&mut self, id: MessageId) -> Option<UnreadChanged> {
        let message = self
            .snapshot
            .received
            .iter_mut()
            .find(|m| m.id == id && m.is_unread)?;
        message.is_unread = false;
        let category = message.category;
        self.snapshot.unread_count = self.snapshot.unread_count.saturating_sub(1);

        let mut event = UnreadChanged {
            message_id: id,
            new_unread_count: self.snapshot.unread_count,
        };

        let request = MarkReadRequest {
            category: category.as_str().to_string(),
            id,
        };
        match self.gateway.mark_as_read(request).await {
            Ok(_) => debug!("Message {} marked read on server", id),
            Err(e) => {
                warn!("Failed to persist read state for message {}: {} (keeping local change)", id, e);
                if self.reconcile_on_mark_read_failure {
                    match self.load().await {
                        Ok(snapshot) => event.new_unread_count = snapshot.unread_count,
                        Err(e) => warn!("Reconciling inbox after failed mark-read also failed: {}", e),
                    }
                }
            }
        }

        self.notifier.publish(event);
        Some(event)
    }

    /// Reply to a message. On success the draft is cleared and the inbox is
    /// reloaded; on failure the draft keeps the text.
    pub async fn reply(&mut self, id: MessageId, text: &str) -> Result<(), InboxError> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyReply.into());
        }
        let category = {
            let first = self.active_view;
            [first, first.other()]
                .into_iter()
                .find_map(|d| self.snapshot.messages(d).iter().find(|m| m.id == id))
                .map(|m| m.category)
                .ok_or(ValidationError::UnknownMessage(id))?
        };

        self.reply.set(id, text);
        let request = ReplyRequest {
            category: category.as_str().to_string(),
            id,
            text: text.trim().to_string(),
        };

        match self.gateway.reply_to_item(request).await {
            Ok(_) => {
                info!("Reply to message {} sent", id);
                self.reply.clear();
                if let Err(e) = self.load().await {
                    warn!("Reply sent but inbox refresh failed: {}", e);
                }
                Ok(())
            }
            Err(e) => {
                error!("Failed to send reply to message {}: {}", id, e);
                self.reply.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Send a new message. Empty fields are rejected before the gateway is
    /// touched. Each attempt replaces the previous send error.
    pub async fn compose(&mut self, to: &str, subject: &str, body: &str) -> Result<(), InboxError> {
        self.compose.set(to, subject, body);
        self.compose.send_error = None;
        self.compose.validate()?;

        let request = SendMessageRequest {
            to_email: to.trim().to_string(),
            subject: subject.trim().to_string(),
            body: body.to_string(),
        };
        match self.gateway.send_message(request).await {
            Ok(_) => {
                info!("Message to {} sent", to.trim());
                self.compose.reset();
                Ok(())
            }
            Err(e) => {
                error!("Failed to send message to {}: {}", to.trim(), e);
                self.compose.send_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_table() {
        assert_eq!(category_for_raw_kind(Some("supplier_rating")), Category::Notification);
        assert_eq!(category_for_raw_kind(Some("supplier_to_supplier_inquiry")), Category::Inquiry);
        assert_eq!(category_for_raw_kind(Some("brand_new_kind")), Category::Notification);
        assert_eq!(category_for_raw_kind(None), Category::Notification);
    }

    #[test]
    fn test_build_snapshot_derives_unread_and_forces_sent_read() {
        let raw: RawInbox = serde_json::from_value(json!({
            "received": [
                {"id": 1, "type": "supplier_to_supplier_inquiry", "isUnread": true},
                {"id": 2, "type": "supplier_rating", "isUnread": false},
                {"id": 1, "type": "supplier_rating", "isUnread": true}
            ],
            "sent": [{"id": 1, "recipientName": "Acme", "recipientEmail": ""}],
            "unreadCount": 5
        }))
        .unwrap();

        let snapshot = build_snapshot(raw);
        assert_eq!(snapshot.received.len(), 2);
        assert_eq!(snapshot.unread_count, 1);
        assert_eq!(snapshot.received[0].category, Category::Inquiry);
        assert!(snapshot.sent.iter().all(|m| !m.is_unread && m.category == Category::Response));
        assert_eq!(snapshot.sent[0].contact_email, None);
    }
}
