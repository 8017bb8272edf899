//! Identity source with typed subscriptions.
//!
//! [`IdentityHub`] stands in for the wallet: whatever connects a wallet
//! calls `connect`, `change_account` or `disconnect`, and every subscriber
//! receives the resulting [`IdentityEvent`] over a broadcast channel.
//! Notifications that change nothing are not published.

use std::sync::Mutex;

use box_core::{IdentityError, IdentityEvent, IdentityState};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 16;

/// Publishes identity changes to subscribers.
#[derive(Debug)]
pub struct IdentityHub {
    state: Mutex<IdentityState>,
    events: broadcast::Sender<IdentityEvent>,
}

impl Default for IdentityHub {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityHub {
    /// A hub with no identity.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(IdentityState::Disconnected),
            events,
        }
    }

    /// Receive every future identity change.
    pub fn subscribe(&self) -> broadcast::Receiver<IdentityEvent> {
        self.events.subscribe()
    }

    /// A wallet connected.
    pub fn connect(&self, id: impl Into<String>) {
        self.publish(IdentityEvent::Connected(id.into()));
    }

    /// The active account changed.
    pub fn change_account(&self, id: impl Into<String>) {
        self.publish(IdentityEvent::AccountChanged(id.into()));
    }

    /// The wallet disconnected.
    pub fn disconnect(&self) {
        self.publish(IdentityEvent::Disconnected);
    }

    /// Whether an identity is available.
    pub fn is_connected(&self) -> bool {
        self.lock().is_connected()
    }

    /// Current identity, if any.
    pub fn current_id(&self) -> Option<String> {
        self.lock().current_id().map(str::to_string)
    }

    /// Current identity, or `IdentityUnavailable`.
    pub fn require(&self) -> Result<String, IdentityError> {
        self.lock().require().map(str::to_string)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, IdentityState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, event: IdentityEvent) {
        let changed = {
            let mut state = self.lock();
            let (next, actions) = state.clone().on_event(event.clone());
            *state = next;
            !actions.is_empty()
        };
        if changed {
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_see_changes() {
        let hub = IdentityHub::new();
        let mut rx = hub.subscribe();

        hub.connect("0xabc");
        hub.change_account("0xdef");
        hub.disconnect();

        assert_eq!(rx.recv().await.unwrap(), IdentityEvent::Connected("0xabc".into()));
        assert_eq!(
            rx.recv().await.unwrap(),
            IdentityEvent::AccountChanged("0xdef".into())
        );
        assert_eq!(rx.recv().await.unwrap(), IdentityEvent::Disconnected);
    }

    #[tokio::test]
    async fn repeated_notifications_are_not_published() {
        let hub = IdentityHub::new();
        let mut rx = hub.subscribe();

        hub.disconnect();
        hub.connect("0xabc");
        hub.connect("0xabc");

        assert_eq!(rx.recv().await.unwrap(), IdentityEvent::Connected("0xabc".into()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn require_fails_without_wallet() {
        let hub = IdentityHub::new();
        assert_eq!(hub.require(), Err(IdentityError::IdentityUnavailable));
        hub.connect("0xabc");
        assert_eq!(hub.require().unwrap(), "0xabc");
        assert!(hub.is_connected());
    }
}
