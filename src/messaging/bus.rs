//! Event bus for pub/sub messaging
//!
//! Lets hosts observe scheduler activity without borrowing the scheduler.
//! Subscribers whose receiver was dropped are pruned on the next publish.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender, TrySendError};
use parking_lot::RwLock;
use tracing::trace;

use super::events::PlaybackEvent;

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(usize);

struct Subscriber {
    id: SubscriberId,
    sender: Sender<PlaybackEvent>,
}

#[derive(Default)]
struct Subscribers {
    list: RwLock<Vec<Subscriber>>,
    next_id: AtomicUsize,
}

/// Broadcasts playback events to subscribers
///
/// Clones share the same subscriber list.
#[derive(Clone, Default)]
pub struct EventBus {
    shared: Arc<Subscribers>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an unbounded subscription
    pub fn subscribe(&self) -> (Receiver<PlaybackEvent>, SubscriberId) {
        let (sender, receiver) = unbounded();
        let id = SubscriberId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        self.shared.list.write().push(Subscriber { id, sender });
        (receiver, id)
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.shared.list.write().retain(|s| s.id != id);
    }

    /// Deliver `event` to every live subscriber
    pub fn publish(&self, event: PlaybackEvent) {
        let mut disconnected = Vec::new();
        for subscriber in self.shared.list.read().iter() {
            match subscriber.sender.try_send(event.clone()) {
                Ok(()) => {}
                Err(TrySendError::Disconnected(_)) => disconnected.push(subscriber.id),
                Err(TrySendError::Full(_)) => {
                    trace!("Subscriber {:?} full, event skipped", subscriber.id)
                }
            }
        }

        if !disconnected.is_empty() {
            trace!("Pruning {} disconnected subscribers", disconnected.len());
            self.shared
                .list
                .write()
                .retain(|s| !disconnected.contains(&s.id));
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.list.read().len()
    }

    /// Drop every subscription
    pub fn clear(&self) {
        self.shared.list.write().clear();
    }
}
