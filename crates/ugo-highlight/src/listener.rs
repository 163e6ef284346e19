//! Change notification for highlight state.
//!
//! ## Learning: Callbacks vs Channels
//!
//! A renderer has to repaint right after a highlight mutation, before the
//! next UI event is processed. Listeners are therefore plain synchronous
//! callbacks (`Arc<dyn HighlightListener>`) invoked in subscription order.
//! Notifications carry no payload; listeners re-query the controller.
//!
//! Consumers living on an async task can subscribe a [`BroadcastListener`]
//! instead, which forwards every notification into a
//! `tokio::sync::broadcast` channel.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Receives "highlights changed" notifications.
///
/// Implemented for any `Fn()` closure, which covers most tests and
/// simple hosts.
pub trait HighlightListener: Send + Sync {
    fn token_highlights_changed(&self);
}

impl<F> HighlightListener for F
where
    F: Fn() + Send + Sync,
{
    fn token_highlights_changed(&self) {
        self()
    }
}

/// Handle returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered list of registered listeners.
///
/// Registering the same listener twice is allowed; it is then called
/// twice per notification.
#[derive(Default)]
pub struct ListenerList {
    entries: Vec<(ListenerId, Arc<dyn HighlightListener>)>,
}

impl ListenerList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Arc<dyn HighlightListener>) -> ListenerId {
        let id = ListenerId::new();
        self.entries.push((id, listener));
        id
    }

    /// Removes a subscription. Returns false if `id` was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        match self.entries.iter().position(|(entry, _)| *entry == id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Calls every listener once, in subscription order.
    pub fn notify(&self) {
        tracing::trace!("Notifying {} highlight listener(s)", self.entries.len());
        for (_, listener) in &self.entries {
            listener.token_highlights_changed();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ListenerList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(id, _)| id))
            .finish()
    }
}

/// Event delivered through a [`BroadcastListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightsChanged;

/// Listener that forwards notifications to async receivers.
///
/// ## Design
///
/// Using a broadcast channel allows:
/// - Multiple async subscribers (status bar, search seed, plugins)
/// - Lagged receivers don't block the controller
#[derive(Clone)]
pub struct BroadcastListener {
    sender: broadcast::Sender<HighlightsChanged>,
}

impl BroadcastListener {
    pub fn new() -> Self {
        // Events carry no payload, a small buffer is plenty
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    /// Returns a receiver for all future notifications.
    pub fn subscribe(&self) -> HighlightEvents {
        HighlightEvents {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for BroadcastListener {
    fn default() -> Self {
        Self::new()
    }
}

impl HighlightListener for BroadcastListener {
    fn token_highlights_changed(&self) {
        // No receivers is fine
        let _ = self.sender.send(HighlightsChanged);
    }
}

/// Async receiving side of a [`BroadcastListener`].
///
/// ## Example
///
/// ```ignore
/// let forwarder = BroadcastListener::new();
/// let mut events = forwarder.subscribe();
/// controller.subscribe(Arc::new(forwarder));
///
/// tokio::spawn(async move {
///     while events.next().await.is_some() {
///         // re-query the controller and repaint
///     }
/// });
/// ```
pub struct HighlightEvents {
    receiver: broadcast::Receiver<HighlightsChanged>,
}

impl HighlightEvents {
    /// Waits for the next notification; `None` once every sender is gone.
    pub async fn next(&mut self) -> Option<HighlightsChanged> {
        match self.receiver.recv().await {
            Ok(event) => Some(event),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                // Missed notifications still mean something changed
                tracing::warn!("Highlight receiver lagged, coalesced {} notifications", n);
                Some(HighlightsChanged)
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}
