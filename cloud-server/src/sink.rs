//! Broadcast notification sink
//!
//! Fans engine notifications out to every connected SSE client. Having no
//! subscribers is normal and not an error.

use fileguard_core::logic::events::NotifyError;
use fileguard_core::{Notification, NotificationSink};
use tokio::sync::broadcast;

/// Buffered notifications per slow subscriber before it starts lagging
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct BroadcastSink {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(EVENT_CHANNEL_CAPACITY)
    }
}

impl NotificationSink for BroadcastSink {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        match self.sender.send(notification.clone()) {
            Ok(receivers) => {
                tracing::debug!(event = notification.name(), receivers, "notification broadcast");
                Ok(())
            }
            // No subscribers right now
            Err(_) => Ok(()),
        }
    }
}
