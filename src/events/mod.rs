//! In-process event bus
//!
//! Publish/subscribe bus for host lifecycle notifications. Publishing is
//! best-effort: an event with no live subscribers is dropped silently, and
//! publish never propagates an error to the caller.
//!
//! The bus is an explicit object handed to whoever needs it; cloning shares
//! the underlying channel.

use tokio::sync::broadcast;

/// Channel capacity before the oldest unreceived event is dropped
const BUS_CAPACITY: usize = 64;

/// Host lifecycle events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The plugin batch settled and the host is ready
    ///
    /// Carries the names of every plugin in the final collection, in
    /// insertion order.
    PluginsRunning {
        /// Active plugin names
        plugins: Vec<String>,
    },

    /// A plugin was deactivated and removed from the collection
    PluginDeactivated {
        /// Name of the removed plugin
        name: String,
    },
}

/// Publish/subscribe bus for [`HostEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<HostEvent>,
}

impl EventBus {
    /// Create a new bus with no subscribers
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    /// Subscribe to all future events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all current subscribers (best-effort)
    pub fn publish(&self, event: HostEvent) {
        match self.tx.send(event) {
            Ok(receivers) => {
                tracing::debug!(receivers, "event published");
            }
            Err(broadcast::error::SendError(event)) => {
                tracing::debug!(?event, "event dropped, no subscribers");
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
