//! Keyboard event source with explicitly owned subscriptions.
//!
//! The host publishes key presses into a [`KeyboardHub`]. A session holds a
//! [`KeySubscription`] for as long as it wants keys; dropping the subscription
//! unsubscribes, so a torn-down session can never receive a stale key.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tracing::{debug, warn};

/// Keys the editing session reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPress {
    Delete,
    Backspace,
    Escape,
    Undo,
    Redo,
}

#[derive(Debug, Default)]
struct HubInner {
    next_id: u64,
    subscribers: Vec<(u64, Vec<KeyPress>)>,
}

/// Fan-out point for key presses. Cloning shares the same hub.
#[derive(Debug, Clone, Default)]
pub struct KeyboardHub {
    inner: Arc<Mutex<HubInner>>,
}

impl KeyboardHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> KeySubscription {
        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, Vec::new()));
        debug!("Keyboard subscriber {} attached", id);

        KeySubscription {
            id,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Queue a key press for every live subscriber
    pub fn publish(&self, key: KeyPress) {
        let mut inner = lock(&self.inner);
        for (_, queue) in inner.subscribers.iter_mut() {
            queue.push(key);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).subscribers.len()
    }
}

/// Live subscription to a [`KeyboardHub`]. Unsubscribes on drop.
#[derive(Debug)]
pub struct KeySubscription {
    id: u64,
    hub: Weak<Mutex<HubInner>>,
}

impl KeySubscription {
    /// Take all key presses queued since the last drain, oldest first.
    /// Returns nothing once the hub is gone.
    pub fn drain(&self) -> Vec<KeyPress> {
        let Some(hub) = self.hub.upgrade() else {
            return Vec::new();
        };
        let mut inner = lock(&hub);
        inner
            .subscribers
            .iter_mut()
            .find(|(id, _)| *id == self.id)
            .map(|(_, queue)| std::mem::take(queue))
            .unwrap_or_default()
    }

    pub fn is_connected(&self) -> bool {
        self.hub.strong_count() > 0
    }
}

impl Drop for KeySubscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            lock(&hub).subscribers.retain(|(id, _)| *id != self.id);
            debug!("Keyboard subscriber {} detached", self.id);
        }
    }
}

/// A poisoned hub only means a publisher panicked mid-push; the queues are
/// still usable.
fn lock(inner: &Mutex<HubInner>) -> MutexGuard<'_, HubInner> {
    inner.lock().unwrap_or_else(|poisoned| {
        warn!("Keyboard hub lock was poisoned, recovering");
        poisoned.into_inner()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let hub = KeyboardHub::new();
        let a = hub.subscribe();
        let b = hub.subscribe();

        hub.publish(KeyPress::Delete);
        hub.publish(KeyPress::Escape);

        assert_eq!(a.drain(), vec![KeyPress::Delete, KeyPress::Escape]);
        assert_eq!(b.drain(), vec![KeyPress::Delete, KeyPress::Escape]);
        assert!(a.drain().is_empty());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let hub = KeyboardHub::new();
        let sub = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 1);
        drop(sub);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_subscription_outlives_hub() {
        let hub = KeyboardHub::new();
        let sub = hub.subscribe();
        drop(hub);
        assert!(!sub.is_connected());
        assert!(sub.drain().is_empty());
    }
}
