//! Signal/slot system for Trellis.
//!
//! Signals are emitted when something happens and every connected slot is
//! invoked synchronously, in connection order, on the emitting thread.
//! Widgets use them for their per-instance event handlers, and a
//! `Signal<String>` can serve as the orchestrator's feedback sink.
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The signal type
//! - [`ConnectionId`] - Identifier returned by [`Signal::connect`]
//! - [`ConnectionGuard`] - RAII connection that disconnects on drop
//!
//! # Example
//!
//! ```
//! use trellis_core::Signal;
//!
//! let text_changed = Signal::<String>::new();
//! let id = text_changed.connect(|text| println!("Text changed to: {text}"));
//! text_changed.emit("Hello".to_string());
//! text_changed.disconnect(id);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;
type Connections<Args> = Mutex<SlotMap<ConnectionId, Slot<Args>>>;

/// A type-safe signal that can have multiple connected slots.
///
/// Cloning a `Signal` yields another handle to the same set of connections.
pub struct Signal<Args> {
    connections: Arc<Connections<Args>>,
    blocked: Arc<AtomicBool>,
}

impl<Args> Clone for Signal<Args> {
    fn clone(&self) -> Self {
        Self {
            connections: Arc::clone(&self.connections),
            blocked: Arc::clone(&self.blocked),
        }
    }
}

impl<Args: Send + 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: Send + 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Arc::new(Mutex::new(SlotMap::with_key())),
            blocked: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Connect a slot (closure) to this signal.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connections.lock().insert(Arc::new(slot))
    }

    /// Connect a slot that is disconnected when the returned guard is dropped.
    ///
    /// The guard only holds a weak reference, so it may outlive the signal.
    pub fn connect_scoped<F>(&self, slot: F) -> ConnectionGuard
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect(slot);
        let connections: Weak<Connections<Args>> = Arc::downgrade(&self.connections);
        ConnectionGuard {
            disconnect: Some(Box::new(move || {
                if let Some(connections) = connections.upgrade() {
                    connections.lock().remove(id);
                }
            })),
        }
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Block signal emission temporarily. While blocked, `emit()` does nothing.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Emit the signal, invoking all connected slots in connection order.
    #[tracing::instrument(skip_all, target = "trellis_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: "trellis_core::signal", "signal blocked, skipping emit");
            return;
        }

        // Snapshot so slots may connect/disconnect while running.
        let slots: Vec<Slot<Args>> = self.connections.lock().values().cloned().collect();
        tracing::trace!(target: "trellis_core::signal", connection_count = slots.len(), "emitting signal");
        for slot in slots {
            slot(&args);
        }
    }
}

/// A connection that disconnects itself when dropped.
///
/// Created via [`Signal::connect_scoped`]. The guard is not generic over the
/// signal's argument type, so guards from different signals can be stored
/// together.
#[must_use = "dropping the guard disconnects the slot immediately"]
pub struct ConnectionGuard {
    disconnect: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl ConnectionGuard {
    /// Disconnect now instead of on drop.
    pub fn disconnect(mut self) {
        if let Some(disconnect) = self.disconnect.take() {
            disconnect();
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Some(disconnect) = self.disconnect.take() {
            disconnect();
        }
    }
}

impl std::fmt::Debug for ConnectionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionGuard")
            .field("connected", &self.disconnect.is_some())
            .finish()
    }
}
