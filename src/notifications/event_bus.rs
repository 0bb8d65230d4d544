//! Auth-state event bus
//!
//! Uses a tokio broadcast channel so every page that cares (only the
//! reset-password page today) can watch session transitions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::events::AuthEventMessage;
use crate::domain::AuthEvent;

/// Default channel capacity
const DEFAULT_CAPACITY: usize = 64;

/// Broadcasts auth-state changes to all subscribers
#[derive(Clone)]
pub struct AuthEventBus {
    sender: broadcast::Sender<AuthEventMessage>,
    subscriber_count: Arc<AtomicUsize>,
}

impl AuthEventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriber_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: AuthEvent) {
        let message = AuthEventMessage::new(event);
        let event_type = message.event.event_type();

        match self.sender.send(message) {
            Ok(count) => debug!(event_type, subscribers = count, "Auth event published"),
            // Nobody listening is the normal case.
            Err(_) => debug!(event_type, "Auth event published (no subscribers)"),
        }
    }

    pub fn subscribe(&self) -> AuthEventSubscriber {
        let receiver = self.sender.subscribe();
        let count = self.subscriber_count.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(subscribers = count, "Auth event subscriber added");

        AuthEventSubscriber {
            receiver,
            subscriber_count: self.subscriber_count.clone(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriber_count.load(Ordering::SeqCst)
    }
}

impl Default for AuthEventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of the auth event bus
pub struct AuthEventSubscriber {
    receiver: broadcast::Receiver<AuthEventMessage>,
    subscriber_count: Arc<AtomicUsize>,
}

impl AuthEventSubscriber {
    /// Wait for the next event; `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<AuthEventMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(msg) => return Some(msg),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(missed = count, "Auth event subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-published event, without waiting.
    pub fn try_recv(&mut self) -> Option<AuthEventMessage> {
        loop {
            match self.receiver.try_recv() {
                Ok(msg) => return Some(msg),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}

impl Drop for AuthEventSubscriber {
    fn drop(&mut self) {
        self.subscriber_count.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_subscriber() {
        let bus = AuthEventBus::new();
        let mut subscriber = bus.subscribe();

        bus.publish(AuthEvent::PasswordRecovery {
            user_id: "u1".to_string(),
        });

        let received = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            subscriber.recv(),
        )
        .await
        .expect("Timeout")
        .expect("No message");

        assert_eq!(received.event.event_type(), "PASSWORD_RECOVERY");
    }

    #[test]
    fn try_recv_drains_without_blocking() {
        let bus = AuthEventBus::new();
        let mut subscriber = bus.subscribe();
        assert!(subscriber.try_recv().is_none());

        bus.publish(AuthEvent::SignedOut);
        assert_eq!(subscriber.try_recv().unwrap().event, AuthEvent::SignedOut);
        assert!(subscriber.try_recv().is_none());
    }

    #[test]
    fn subscriber_count_tracks_drops() {
        let bus = AuthEventBus::new();
        assert_eq!(bus.subscriber_count(), 0);

        let sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(sub1);
        assert_eq!(bus.subscriber_count(), 1);
    }
}
