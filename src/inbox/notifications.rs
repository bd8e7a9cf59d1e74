// Unread-count notifications
// Fire-and-forget broadcast so a header badge can follow the unread count
// without holding a reference into the inbox model.

use log::{debug, error, warn};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::models::UnreadChanged;

/// Name of the event, for views that log or route by name.
pub const UNREAD_CHANGED_EVENT: &str = "unread-changed";

const SUBSCRIBER_CAPACITY: usize = 16;

lazy_static::lazy_static! {
    static ref GLOBAL_NOTIFIER: UnreadNotifier = UnreadNotifier::new();
}

/// Publish/subscribe hub for `UnreadChanged` events.
///
/// Delivery is at-most-once: an event goes to whoever is subscribed at the
/// moment it is published, late subscribers get no replay, and a subscriber
/// whose queue is full misses the event.
#[derive(Clone, Default)]
pub struct UnreadNotifier {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<UnreadChanged>>>>,
}

impl UnreadNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide hub
    pub fn global() -> UnreadNotifier {
        GLOBAL_NOTIFIER.clone()
    }

    pub fn subscribe(&self) -> mpsc::Receiver<UnreadChanged> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CAPACITY);
        match self.subscribers.lock() {
            Ok(mut subscribers) => subscribers.push(tx),
            Err(_) => error!("Failed to lock unread subscribers"),
        }
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Send the event to all live subscribers. Returns how many received it.
    pub fn publish(&self, event: UnreadChanged) -> usize {
        let mut subscribers = match self.subscribers.lock() {
            Ok(subscribers) => subscribers,
            Err(_) => {
                error!("Failed to lock unread subscribers");
                return 0;
            }
        };

        let mut delivered = 0;
        subscribers.retain(|tx| match tx.try_send(event) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Dropping {} for a slow subscriber", UNREAD_CHANGED_EVENT);
                true
            }
            // Receiver dropped
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });

        debug!(
            "Published {} {:?} to {} subscriber(s)",
            UNREAD_CHANGED_EVENT, event, delivered
        );
        delivered
    }
}
